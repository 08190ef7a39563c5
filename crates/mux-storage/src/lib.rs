//! # mux-storage
//!
//! Postgres persistence for promptmux: encrypted provider credentials,
//! submitted prompts, and finalized per-provider response records.
//!
//! The schema is small and applied idempotently at startup; stores are thin
//! wrappers over a shared [`sqlx::PgPool`] and are safe for concurrent use
//! by multiple in-flight fan-outs.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod keys;
pub mod models;
pub mod pool;
pub mod prompts;
pub mod responses;
pub mod schema;

pub use error::{Result, StorageError};
pub use keys::ApiKeyStore;
pub use models::{ApiKeyRecord, NewResponse, PromptRecord, ResponseRecord};
pub use pool::{connect, PoolConfig};
pub use prompts::{PromptPage, PromptStore};
pub use responses::ResponseStore;
