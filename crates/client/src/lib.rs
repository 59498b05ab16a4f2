//! REST and WebSocket client for the assignment-efficiency backend.
//!
//! [`ApiClient`] is the single path to the backend: one typed method per
//! endpoint, wrapped in an ordered [`Middleware`](middleware::Middleware)
//! chain that injects the bearer token and escalates `401` responses.
//! [`realtime`] provides the optional push-update channel.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod middleware;
pub mod realtime;
pub mod upload;

pub use api::ApiClient;
pub use auth::{FileTokenStore, MemoryTokenStore, NoopSessionHandler, SessionHandler, TokenStore};
pub use config::{ClientConfig, ConfigError};
pub use error::{ClientError, ErrorKind};
pub use upload::UploadFile;
