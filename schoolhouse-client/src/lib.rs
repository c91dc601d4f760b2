//! # schoolhouse-client
//!
//! Authenticated HTTP access to the school's hosted database API.
//!
//! ## Core Concepts
//!
//! - **[`AuthClient`]**: sends requests with the current bearer token and
//!   recovers from an expired token with a single shared refresh
//! - **[`ApiRequest`]**: a resendable request description
//! - **[`Table`]**: query builder for the table API
//! - **[`ClientConfig`]**: project URL, API key and timeout
//!
//! ## Refresh behavior
//!
//! A request answered with 401 is marked retried, a fresh token is obtained
//! from the [`SessionProvider`](schoolhouse_session::SessionProvider), and the
//! request is sent once more. While a refresh is running, other 401s queue up
//! behind it instead of starting their own; they all receive the same new
//! token or the same [`ClientError::Refresh`]. A second 401 on a retried
//! request is returned as is.
//!
//! ## Example
//!
//! ```ignore
//! use schoolhouse_client::{AuthClient, ClientConfig};
//! use schoolhouse_session::HttpSessionProvider;
//! use std::sync::Arc;
//!
//! let config = ClientConfig::from_env()?;
//! let sessions = Arc::new(HttpSessionProvider::new(config.session_config()?)?);
//! sessions.sign_in_with_password("office@school.example", "secret").await?;
//!
//! let client = AuthClient::new(config, sessions)?;
//! let notices: Vec<serde_json::Value> = client
//!     .table("notices")
//!     .order("created_at", false)
//!     .fetch()
//!     .await?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
mod gate;
pub mod request;
pub mod table;
pub mod transport;

#[cfg(test)]
mod testing;

// Re-exports
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use request::ApiRequest;
pub use table::Table;
pub use transport::AuthClient;

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{ApiRequest, AuthClient, ClientConfig, ClientError, ClientResult, Table};
}
