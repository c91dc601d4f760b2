//! Client configuration.

use crate::error::{ClientError, ClientResult};
use schoolhouse_session::SessionConfig;
use std::time::Duration;
use url::Url;

/// Environment variable holding the project URL.
pub const ENV_URL: &str = "SCHOOLHOUSE_URL";
/// Environment variable holding the public API key.
pub const ENV_ANON_KEY: &str = "SCHOOLHOUSE_ANON_KEY";
/// Environment variable holding the request timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "SCHOOLHOUSE_TIMEOUT_SECS";

/// Configuration for the API client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Project root, e.g. `https://project.example.co`.
    pub base_url: Url,
    /// Public (anon) API key sent as the `apikey` header.
    pub api_key: Option<String>,
    /// Request timeout.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    /// Create a new config for a project root.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
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

    /// Load from the environment.
    ///
    /// Looks for:
    /// - `SCHOOLHOUSE_URL` (required)
    /// - `SCHOOLHOUSE_ANON_KEY`
    /// - `SCHOOLHOUSE_TIMEOUT_SECS`
    pub fn from_env() -> ClientResult<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> ClientResult<Self> {
        let raw_url =
            lookup(ENV_URL).ok_or_else(|| ClientError::Config(format!("{ENV_URL} is not set")))?;
        let base_url = Url::parse(&raw_url)
            .map_err(|err| ClientError::Config(format!("{ENV_URL} is not a URL: {err}")))?;

        let mut config = Self::new(base_url);
        config.api_key = lookup(ENV_ANON_KEY).filter(|key| !key.is_empty());

        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            let secs = raw.parse::<u64>().map_err(|_| {
                ClientError::Config(format!("{ENV_TIMEOUT_SECS} must be whole seconds, got {raw:?}"))
            })?;
            config.timeout = Some(Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Root of the table API.
    pub fn rest_url(&self) -> String {
        self.endpoint("rest/v1")
    }

    /// Root of the auth API.
    pub fn auth_url(&self) -> ClientResult<Url> {
        Url::parse(&self.endpoint("auth/v1"))
            .map_err(|err| ClientError::Config(format!("invalid auth URL: {err}")))
    }

    /// Session config pointing at this project's auth API.
    pub fn session_config(&self) -> ClientResult<SessionConfig> {
        let mut config = SessionConfig::new(self.auth_url()?);
        config.api_key = self.api_key.clone();
        config.timeout = self.timeout;
        Ok(config)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path)
    }
}
