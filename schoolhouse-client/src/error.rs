//! Client error types.

use schoolhouse_session::SessionError;
use thiserror::Error;

/// Errors returned by [`AuthClient`](crate::AuthClient).
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with a non-success status.
    #[error("HTTP error {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// The request could not be sent or its response could not be read.
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The session could not be refreshed after an authorization failure.
    #[error("Session refresh failed: {0}")]
    Refresh(#[from] SessionError),

    /// A body could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The request was refused before being sent.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    /// Create an HTTP error.
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }

    /// Get the HTTP status if there is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if the server answered 401.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Check if the caller has to sign in again.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Refresh(_)) || self.is_unauthorized()
    }
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
