//! Row types.

use chrono::{DateTime, Utc};
use mux_core::ProviderName;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// One stored, encrypted provider credential.
#[derive(Debug, Clone, FromRow)]
pub struct ApiKeyRecord {
    /// Row id.
    pub id: Uuid,
    /// Owning user.
    pub user_id: Uuid,
    /// Provider name (canonical lowercase).
    pub provider: String,
    /// Base64 AES-GCM ciphertext of the API key.
    pub encrypted_key: String,
    /// Short SHA-256 prefix of the plaintext, for change detection.
    pub key_hash: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time, if ever updated.
    pub updated_at: Option<DateTime<Utc>>,
}

/// One submitted prompt. Immutable after creation.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PromptRecord {
    /// Prompt id.
    pub id: Uuid,
    /// Owning user.
    pub user_id: Uuid,
    /// Raw prompt text.
    pub prompt_text: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// One finalized per-provider outcome of a fan-out. Never mutated.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ResponseRecord {
    /// Row id.
    pub id: Uuid,
    /// Parent prompt.
    pub prompt_id: Uuid,
    /// Provider name (canonical lowercase).
    pub provider: String,
    /// Model identifier the adapter used.
    pub model_used: Option<String>,
    /// Accumulated response text; partial when the provider failed mid-stream.
    pub response_text: Option<String>,
    /// Elapsed milliseconds from adapter start to terminal state.
    pub response_time_ms: Option<i32>,
    /// Upstream failure message; `None` for successful responses.
    pub error_message: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Insert shape for a finalized response record.
#[derive(Debug, Clone)]
pub struct NewResponse {
    /// Parent prompt.
    pub prompt_id: Uuid,
    /// Originating provider.
    pub provider: ProviderName,
    /// Model identifier the adapter used.
    pub model: String,
    /// Accumulated text (full on success, partial on failure).
    pub text: String,
    /// Elapsed milliseconds from adapter start.
    pub elapsed_ms: i32,
    /// Failure message, `None` on success.
    pub error_message: Option<String>,
}
