//! Session error types.

use thiserror::Error;

/// Errors produced while obtaining or rotating a session.
///
/// The type is `Clone` so a single refresh failure can be handed to every
/// request that was waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// There is no session to refresh.
    #[error("No active session")]
    NoSession,

    /// The auth server answered with a non-success status.
    #[error("Auth server rejected the request ({status}): {body}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// The auth server answered successfully but without an access token.
    #[error("Session carries no access token")]
    MissingAccessToken,

    /// The auth server could not be reached.
    #[error("Auth transport error: {0}")]
    Transport(String),

    /// The auth server answered with something that is not a session.
    #[error("Invalid auth response: {0}")]
    InvalidResponse(String),

    /// The refresh was dropped, or the session changed, before it settled.
    #[error("Session refresh was interrupted")]
    Interrupted,
}

impl SessionError {
    /// Create a rejection error.
    pub fn rejected(status: u16, body: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            body: body.into(),
        }
    }

    /// Get the HTTP status if the auth server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check whether the credential itself was refused (invalid or expired).
    pub fn is_credential_rejected(&self) -> bool {
        matches!(self.status(), Some(400 | 401 | 403))
    }
}

impl From<reqwest::Error> for SessionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SessionError::InvalidResponse(err.to_string())
        } else {
            SessionError::Transport(err.to_string())
        }
    }
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
