//! Session provider backed by a GoTrue-compatible auth endpoint.

use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};
use crate::provider::SessionProvider;
use crate::session::{Session, SessionEvent};
use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::Client;
use serde_json::json;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Header carrying the project's public API key.
pub const API_KEY_HEADER: &str = "apikey";

const EVENT_CAPACITY: usize = 16;

/// Session provider that talks to the auth server over HTTP.
///
/// The provider keeps the current session in memory. Persisting it across
/// restarts is the host application's job (see [`HttpSessionProvider::set_session`]).
#[derive(Debug)]
pub struct HttpSessionProvider {
    client: Client,
    config: SessionConfig,
    session: RwLock<Option<Session>>,
    events: broadcast::Sender<SessionEvent>,
}

impl HttpSessionProvider {
    /// Create a provider with its own HTTP client.
    pub fn new(config: SessionConfig) -> SessionResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Ok(Self::with_client(client, config))
    }

    /// Create a provider sharing an existing HTTP client.
    pub fn with_client(client: Client, config: SessionConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            client,
            config,
            session: RwLock::new(None),
            events,
        }
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Sign in with email and password.
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> SessionResult<Session> {
        let body = json!({ "email": email, "password": password });
        let session = self.token_request("password", &body).await?;
        if !session.has_access_token() {
            return Err(SessionError::MissingAccessToken);
        }

        info!("Signed in");
        *self.session.write() = Some(session.clone());
        self.emit(SessionEvent::SignedIn(session.clone()));
        Ok(session)
    }

    /// Install a session restored by the host application.
    ///
    /// Emits `SignedIn` when no session was held and `TokenRefreshed` when an
    /// existing one is replaced.
    pub fn set_session(&self, session: Session) {
        let previous = self.session.write().replace(session.clone());
        let event = match previous {
            Some(_) => SessionEvent::TokenRefreshed(session),
            None => SessionEvent::SignedIn(session),
        };
        self.emit(event);
    }

    /// Sign out.
    ///
    /// The local session is always cleared; the server-side logout is best effort.
    pub async fn sign_out(&self) {
        let previous = self.session.write().take();

        if let Some(session) = previous.filter(Session::has_access_token) {
            let mut request = self
                .client
                .post(self.config.logout_url())
                .bearer_auth(&session.access_token);
            if let Some(key) = &self.config.api_key {
                request = request.header(API_KEY_HEADER, key);
            }

            match request.send().await {
                Ok(response) if !response.status().is_success() => {
                    debug!(status = response.status().as_u16(), "Logout rejected by server");
                }
                Ok(_) => {}
                Err(err) => warn!(error = %err, "Logout request failed"),
            }
        }

        info!("Signed out");
        self.emit(SessionEvent::SignedOut);
    }

    async fn token_request(
        &self,
        grant_type: &str,
        body: &serde_json::Value,
    ) -> SessionResult<Session> {
        let mut request = self
            .client
            .post(self.config.token_url())
            .query(&[("grant_type", grant_type)])
            .json(body);
        if let Some(key) = &self.config.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SessionError::rejected(status.as_u16(), body));
        }

        response
            .json::<Session>()
            .await
            .map_err(|err| SessionError::InvalidResponse(err.to_string()))
    }

    /// Swap the stored session only if it is still the one holding `refresh_token`.
    ///
    /// Fails with `NoSession` after a sign-out and `Interrupted` after the
    /// session was replaced, so a late refresh never overwrites either.
    fn replace_if_current(
        &self,
        refresh_token: &str,
        next: Option<Session>,
    ) -> SessionResult<()> {
        let mut current = self.session.write();
        match current.as_ref() {
            None => Err(SessionError::NoSession),
            Some(session) if session.refresh_token != refresh_token => {
                Err(SessionError::Interrupted)
            }
            Some(_) => {
                *current = next;
                Ok(())
            }
        }
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl SessionProvider for HttpSessionProvider {
    fn current_session(&self) -> Option<Session> {
        self.session.read().clone()
    }

    async fn refresh_session(&self) -> SessionResult<Option<Session>> {
        let refresh_token = self
            .session
            .read()
            .as_ref()
            .filter(|session| session.has_refresh_token())
            .map(|session| session.refresh_token.clone())
            .ok_or(SessionError::NoSession)?;

        debug!("Requesting session refresh");
        let body = json!({ "refresh_token": refresh_token });

        match self.token_request("refresh_token", &body).await {
            Ok(session) => {
                if let Err(err) = self.replace_if_current(&refresh_token, Some(session.clone())) {
                    debug!(error = %err, "Session changed during refresh, discarding result");
                    return Err(err);
                }
                info!("Session refreshed");
                self.emit(SessionEvent::TokenRefreshed(session.clone()));
                Ok(Some(session))
            }
            Err(err) if err.is_credential_rejected() => {
                warn!(error = %err, "Refresh token rejected");
                if self.replace_if_current(&refresh_token, None).is_ok() {
                    self.emit(SessionEvent::SignedOut);
                }
                Err(err)
            }
            Err(err) => {
                warn!(error = %err, "Session refresh failed");
                Err(err)
            }
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}
