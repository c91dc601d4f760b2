//! # schoolhouse - API access for the school website and back-office
//!
//! The website and the admin back-office read and write their data (notices,
//! classes, teachers, visitors, gallery entries, transfer certificates)
//! through a hosted database API guarded by short-lived bearer tokens. This
//! crate bundles the pieces needed to talk to it:
//!
//! - an [`AuthClient`] that attaches the current token to every request and,
//!   when the token has expired, refreshes the session once for all requests
//!   that hit the expiry at the same time
//! - a [`SessionProvider`] abstraction with an HTTP implementation for the
//!   auth endpoint
//! - a small table query builder
//!
//! ## Quick Start
//!
//! ```ignore
//! use schoolhouse::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let connection = connect(ClientConfig::from_env()?)?;
//!     let _sync = follow_sessions(&connection.client);
//!
//!     connection
//!         .sessions
//!         .sign_in_with_password("office@school.example", "secret")
//!         .await?;
//!
//!     let notices: Vec<serde_json::Value> = connection
//!         .client
//!         .table("notices")
//!         .order("created_at", false)
//!         .limit(10)
//!         .fetch()
//!         .await?;
//!     println!("{} notices", notices.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`schoolhouse_session`] - Session model, provider trait, HTTP provider
//! - [`schoolhouse_client`] - Request coordinator, errors, config, tables

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

// ============================================================================
// Wiring
// ============================================================================

pub mod connect;

// ============================================================================
// Crate Re-exports
// ============================================================================

/// Request coordinator, errors, config and table access.
pub use schoolhouse_client as client;

/// Sessions and session providers.
pub use schoolhouse_session as session;

pub use connect::{connect, follow_sessions, Connection};
pub use schoolhouse_client::{ApiRequest, AuthClient, ClientConfig, ClientError, ClientResult, Table};
pub use schoolhouse_session::{
    BoxedSessionProvider, HttpSessionProvider, Session, SessionConfig, SessionError,
    SessionEvent, SessionProvider, SessionResult, User,
};

// ============================================================================
// Prelude
// ============================================================================

/// Convenient prelude for common imports.
///
/// ```ignore
/// use schoolhouse::prelude::*;
/// ```
pub mod prelude {
    // Client
    pub use crate::client::{ApiRequest, AuthClient, ClientConfig, ClientError, ClientResult, Table};

    // Sessions
    pub use crate::session::{
        HttpSessionProvider, Session, SessionError, SessionEvent, SessionProvider,
    };

    // Wiring
    pub use crate::connect::{connect, follow_sessions, Connection};
}
