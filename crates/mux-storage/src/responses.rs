//! Append-only response record sink.

use crate::error::Result;
use crate::models::{NewResponse, ResponseRecord};
use mux_core::{PromptId, ResponseId};
use sqlx::PgPool;
use tracing::debug;

/// Writer and reader for the `llm_responses` table.
///
/// Writes are append-only: one row per provider that actually streamed in a
/// given fan-out, inserted once when that provider reaches its terminal
/// state, and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ResponseStore {
    pool: PgPool,
}

impl ResponseStore {
    /// Create a store over the shared pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append one finalized response record.
    pub async fn insert(&self, response: NewResponse) -> Result<ResponseId> {
        let id = ResponseId::generate();

        sqlx::query(
            "INSERT INTO llm_responses
                 (id, prompt_id, provider, model_used, response_text,
                  response_time_ms, error_message)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(id.as_uuid())
        .bind(response.prompt_id)
        .bind(response.provider.as_str())
        .bind(&response.model)
        .bind(&response.text)
        .bind(response.elapsed_ms)
        .bind(response.error_message.as_deref())
        .execute(&self.pool)
        .await?;

        debug!(
            response_id = %id,
            provider = %response.provider,
            failed = response.error_message.is_some(),
            "Response record persisted"
        );
        Ok(id)
    }

    /// All response records for one prompt, oldest first.
    pub async fn list_for_prompt(&self, prompt_id: PromptId) -> Result<Vec<ResponseRecord>> {
        let records = sqlx::query_as::<_, ResponseRecord>(
            "SELECT id, prompt_id, provider, model_used, response_text,
                    response_time_ms, error_message, created_at
             FROM llm_responses
             WHERE prompt_id = $1
             ORDER BY created_at ASC",
        )
        .bind(prompt_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
