//! Session handling for schoolhouse.
//!
//! This crate owns the access/refresh token pair used by the API client:
//!
//! - [`Session`]: tokens plus identity metadata
//! - [`SessionProvider`]: the collaborator the request coordinator asks for
//!   the current session and for refreshes
//! - [`SessionEvent`]: sign-in, rotation and sign-out notifications
//! - [`HttpSessionProvider`]: provider backed by a GoTrue-compatible auth endpoint
//!
//! ## Example
//!
//! ```rust,ignore
//! use schoolhouse_session::{HttpSessionProvider, SessionConfig, SessionProvider};
//!
//! let config = SessionConfig::new("https://db.example.com/auth/v1".parse()?)
//!     .with_api_key("anon-key");
//! let provider = HttpSessionProvider::new(config)?;
//!
//! provider.sign_in_with_password("office@school.example", "secret").await?;
//! let mut changes = provider.subscribe();
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod http;
pub mod provider;
pub mod session;

pub use config::SessionConfig;
pub use error::{SessionError, SessionResult};
pub use http::{HttpSessionProvider, API_KEY_HEADER};
pub use provider::{BoxedSessionProvider, SessionProvider};
pub use session::{Session, SessionEvent, User};
