//! Badgr Client Library
//!
//! Provides an authenticated HTTP client for Badgr-style REST servers.
//!
//! # Example
//!
//! ```rust,no_run
//! use badgr_client::{Attachment, Call, Credentials, Remote};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let remote = Remote::new(
//!         "https://api.badgr.io/",
//!         Credentials::new("issuer@example.com", "secret"),
//!     )?;
//!
//!     // Bare path
//!     let me = remote.get("v2/users/self").await?;
//!
//!     // Full descriptor, keeping only the `result` field
//!     let badges = remote
//!         .get(Call::new("v2/badgeclasses").filter("result").default_value(json!([])))
//!         .await?;
//!
//!     // Local images are inlined as base64 data URIs
//!     let created = remote
//!         .post(Call::new("v2/issuers").data(json!({
//!             "name": "Example Academy",
//!             "image": Attachment::from_path("./logo.png").to_value(),
//!         })))
//!         .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Errors
//!
//! Every failure is a [`RemoteError`]. Responses with status >= 400 carry an
//! [`ApiError`] whose `name` is derived from the server's error code or the
//! status phrase (`NotFoundError`, `InvalidRequestError`, ...).
//!
//! # Testing
//!
//! The `testing` module runs an axum router on an ephemeral port and hands out
//! a client pointed at it:
//!
//! ```rust,ignore
//! use badgr_client::testing::TestServer;
//!
//! let server = TestServer::start(router).await?;
//! let issuers = server.client.get("v2/issuers").await?;
//! ```

mod client;
mod config;
pub mod encode;
mod error;
pub mod testing;
mod token;
mod types;
mod url_builder;

pub use client::Remote;
pub use config::{
    ConfigError, RemoteConfig, RemoteConfigBuilder, TimeoutsConfig, DEFAULT_USER_AGENT,
};
pub use encode::Attachment;
pub use error::{ApiError, ErrorKind, RemoteError, Result, HTTP_ERROR};
pub use token::{TokenManager, TOKEN_PATH};
pub use types::{Call, Credentials};
pub use url_builder::make_url;

// Re-export the method type used by `Remote::call`
pub use reqwest::Method;
