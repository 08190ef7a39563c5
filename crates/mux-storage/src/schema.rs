//! Database schema.
//!
//! Statements are idempotent and applied in order at startup. The three
//! tables mirror the persisted data model: encrypted per-user provider
//! credentials, immutable prompts, and append-only response records.

use crate::error::Result;
use sqlx::PgPool;
use tracing::debug;

/// Ordered, idempotent schema statements.
pub const STATEMENTS: &[&str] = &[
    r"
    CREATE TABLE IF NOT EXISTS api_keys (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL,
        provider TEXT NOT NULL,
        encrypted_key TEXT NOT NULL,
        key_hash TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ,
        UNIQUE (user_id, provider)
    )
    ",
    r"
    CREATE INDEX IF NOT EXISTS idx_api_keys_user ON api_keys (user_id)
    ",
    r"
    CREATE TABLE IF NOT EXISTS prompts (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL,
        prompt_text TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    ",
    r"
    CREATE INDEX IF NOT EXISTS idx_prompts_user_created
        ON prompts (user_id, created_at DESC)
    ",
    r"
    CREATE TABLE IF NOT EXISTS llm_responses (
        id UUID PRIMARY KEY,
        prompt_id UUID NOT NULL,
        provider TEXT NOT NULL,
        model_used TEXT,
        response_text TEXT,
        response_time_ms INTEGER,
        error_message TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    ",
    r"
    CREATE INDEX IF NOT EXISTS idx_llm_responses_prompt ON llm_responses (prompt_id)
    ",
];

/// Apply the schema. Safe to run on every startup.
pub async fn apply(pool: &PgPool) -> Result<()> {
    for statement in STATEMENTS {
        debug!(statement = statement.trim().lines().next().unwrap_or(""), "Applying schema statement");
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
