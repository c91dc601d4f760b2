//! Auth endpoint configuration.

use std::time::Duration;
use url::Url;

/// Configuration for the auth endpoint.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Auth API root, e.g. `https://project.example.co/auth/v1`.
    pub auth_url: Url,
    /// Public (anon) API key sent as the `apikey` header.
    pub api_key: Option<String>,
    /// Request timeout.
    pub timeout: Option<Duration>,
}

impl SessionConfig {
    /// Create a new config for an auth API root.
    pub fn new(auth_url: Url) -> Self {
        Self {
            auth_url,
            api_key: None,
            timeout: None,
        }
    }

    /// Set the API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Token endpoint (password and refresh grants).
    pub fn token_url(&self) -> String {
        self.endpoint("token")
    }

    /// Logout endpoint.
    pub fn logout_url(&self) -> String {
        self.endpoint("logout")
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.auth_url.as_str().trim_end_matches('/'), path)
    }
}
