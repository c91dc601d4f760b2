//! Wiring the client and the session provider together.
//!
//! [`connect`] builds an [`AuthClient`] and an [`HttpSessionProvider`] for one
//! project. [`follow_sessions`] keeps the client's default token in step with
//! sign-ins and sign-outs that happen outside the client.
//!
//! # Example
//!
//! ```rust,ignore
//! use schoolhouse::connect::{connect, follow_sessions};
//! use schoolhouse::ClientConfig;
//!
//! let connection = connect(ClientConfig::from_env()?)?;
//! let _sync = follow_sessions(&connection.client);
//!
//! connection
//!     .sessions
//!     .sign_in_with_password("office@school.example", "secret")
//!     .await?;
//! let classes: Vec<serde_json::Value> = connection.client.table("classes").fetch().await?;
//! ```

use std::sync::Arc;

use schoolhouse_client::{AuthClient, ClientConfig, ClientError, ClientResult};
use schoolhouse_session::{HttpSessionProvider, SessionEvent};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// A client plus the provider that owns its session.
#[derive(Debug, Clone)]
pub struct Connection {
    /// Authenticated API client.
    pub client: AuthClient,
    /// Session provider used by `client`.
    pub sessions: Arc<HttpSessionProvider>,
}

/// Build a client and its session provider from one config.
pub fn connect(config: ClientConfig) -> ClientResult<Connection> {
    let sessions = HttpSessionProvider::new(config.session_config()?)
        .map_err(|err| ClientError::Config(format!("cannot build auth client: {err}")))?;
    let sessions = Arc::new(sessions);
    let client = AuthClient::new(config, sessions.clone())?;
    Ok(Connection { client, sessions })
}

/// Track session changes and update the client's default token.
///
/// The task runs until the provider is dropped or the handle is aborted.
pub fn follow_sessions(client: &AuthClient) -> JoinHandle<()> {
    let mut events = client.sessions().subscribe();
    let client = client.clone();

    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(SessionEvent::SignedIn(session)) | Ok(SessionEvent::TokenRefreshed(session)) => {
                    debug!("Session changed, updating default token");
                    client.set_access_token(Some(session.access_token));
                }
                Ok(SessionEvent::SignedOut) => {
                    debug!("Signed out, dropping default token");
                    client.set_access_token(None);
                }
                Err(RecvError::Lagged(skipped)) => {
                    // Fall back to whatever the provider holds now.
                    warn!(skipped, "Missed session events");
                    client.set_access_token(None);
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
