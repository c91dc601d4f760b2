//! Session provider trait.
//!
//! A session provider owns the access/refresh token pair. Callers read the
//! current session, ask for a refresh, and may subscribe to session changes.

use crate::error::SessionResult;
use crate::session::{Session, SessionEvent};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Source of sessions for authenticated requests.
#[async_trait]
pub trait SessionProvider: Send + Sync + std::fmt::Debug {
    /// The presently cached session, if any.
    fn current_session(&self) -> Option<Session>;

    /// Mint a new access token from the current refresh token.
    ///
    /// `Ok(None)` means the server answered without producing a session.
    async fn refresh_session(&self) -> SessionResult<Option<Session>>;

    /// Receive every subsequent session change (sign-in, sign-out, rotation).
    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;

    /// Access token of the cached session, if it has a usable one.
    fn access_token(&self) -> Option<String> {
        self.current_session()
            .filter(Session::has_access_token)
            .map(|session| session.access_token)
    }
}

/// Type alias for shared providers.
pub type BoxedSessionProvider = Arc<dyn SessionProvider>;
