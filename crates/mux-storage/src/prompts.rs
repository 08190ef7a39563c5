//! Prompt store.

use crate::error::Result;
use crate::models::PromptRecord;
use mux_core::{PromptId, UserId};
use sqlx::PgPool;
use tracing::debug;

/// One page of a user's prompt history.
#[derive(Debug, Clone)]
pub struct PromptPage {
    /// Prompts on this page, newest first.
    pub prompts: Vec<PromptRecord>,
    /// Total number of the user's prompts.
    pub total: i64,
}

/// Reads and writes over the `prompts` table.
#[derive(Debug, Clone)]
pub struct PromptStore {
    pool: PgPool,
}

impl PromptStore {
    /// Create a store over the shared pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Persist a new prompt. Prompts are immutable after this point.
    pub async fn insert(&self, user_id: UserId, prompt_text: &str) -> Result<PromptRecord> {
        let id = PromptId::generate();

        let record = sqlx::query_as::<_, PromptRecord>(
            "INSERT INTO prompts (id, user_id, prompt_text)
             VALUES ($1, $2, $3)
             RETURNING id, user_id, prompt_text, created_at",
        )
        .bind(id.as_uuid())
        .bind(user_id.as_uuid())
        .bind(prompt_text)
        .fetch_one(&self.pool)
        .await?;

        debug!(prompt_id = %id, user_id = %user_id, "Prompt created");
        Ok(record)
    }

    /// Fetch one prompt, scoped to its owner.
    pub async fn get(&self, user_id: UserId, prompt_id: PromptId) -> Result<Option<PromptRecord>> {
        let record = sqlx::query_as::<_, PromptRecord>(
            "SELECT id, user_id, prompt_text, created_at
             FROM prompts
             WHERE id = $1 AND user_id = $2",
        )
        .bind(prompt_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Page through a user's prompts, newest first. `page` is 1-based.
    pub async fn list(&self, user_id: UserId, page: i64, limit: i64) -> Result<PromptPage> {
        let offset = (page.max(1) - 1) * limit;

        let prompts = sqlx::query_as::<_, PromptRecord>(
            "SELECT id, user_id, prompt_text, created_at
             FROM prompts
             WHERE user_id = $1
             ORDER BY created_at DESC
             OFFSET $2 LIMIT $3",
        )
        .bind(user_id.as_uuid())
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM prompts WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .fetch_one(&self.pool)
            .await?;

        Ok(PromptPage { prompts, total })
    }
}
