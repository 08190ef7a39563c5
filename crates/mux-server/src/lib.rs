//! # mux-server
//!
//! HTTP surface for promptmux:
//! - Axum router with JWT bearer authentication
//! - Prompt submission with the fan-out streamed back as SSE
//! - Prompt history and detail reads
//! - Provider credential management (masked listing, upsert, delete, test)
//! - Env-driven configuration and liveness

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod routes;
pub mod state;

pub use auth::{issue_token, AuthenticatedUser, JwtKeys};
pub use config::{Config, ConfigError};
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
