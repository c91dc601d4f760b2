//! Session model and session-change events.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An authenticated session as returned by the auth token endpoint.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Short-lived bearer token.
    pub access_token: String,
    /// Longer-lived token used to mint a new access token.
    #[serde(default)]
    pub refresh_token: String,
    /// Token type, normally `bearer`.
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Lifetime of the access token in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// Expiry as a unix timestamp in seconds.
    #[serde(default)]
    pub expires_at: Option<i64>,
    /// Identity the session belongs to.
    #[serde(default)]
    pub user: Option<User>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl Session {
    /// Create a session from a token pair.
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            token_type: default_token_type(),
            expires_in: None,
            expires_at: None,
            user: None,
        }
    }

    /// Attach the owning user.
    #[must_use]
    pub fn with_user(mut self, user: User) -> Self {
        self.user = Some(user);
        self
    }

    /// Whether the session carries an access token that can be sent.
    pub fn has_access_token(&self) -> bool {
        !self.access_token.trim().is_empty()
    }

    /// Whether the session can be refreshed.
    pub fn has_refresh_token(&self) -> bool {
        !self.refresh_token.trim().is_empty()
    }
}

// Tokens stay out of logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("expires_at", &self.expires_at)
            .field("user", &self.user)
            .finish()
    }
}

/// Identity metadata attached to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// User id.
    pub id: String,
    /// Email address, if any.
    #[serde(default)]
    pub email: Option<String>,
    /// Database role (e.g. `authenticated`).
    #[serde(default)]
    pub role: Option<String>,
}

/// A change in the provider's session state.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A session was established.
    SignedIn(Session),
    /// The access token was rotated.
    TokenRefreshed(Session),
    /// The session was cleared.
    SignedOut,
}

impl SessionEvent {
    /// The session carried by the event, if any.
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::SignedIn(session) | Self::TokenRefreshed(session) => Some(session),
            Self::SignedOut => None,
        }
    }
}
