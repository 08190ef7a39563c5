//! Encrypted credential store.

use crate::error::Result;
use crate::models::ApiKeyRecord;
use mux_core::{ProviderName, UserId};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

/// CRUD over the `api_keys` table. One row per (user, provider).
#[derive(Debug, Clone)]
pub struct ApiKeyStore {
    pool: PgPool,
}

impl ApiKeyStore {
    /// Create a store over the shared pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch the stored credential for (user, provider), if any.
    pub async fn get(
        &self,
        user_id: UserId,
        provider: ProviderName,
    ) -> Result<Option<ApiKeyRecord>> {
        let record = sqlx::query_as::<_, ApiKeyRecord>(
            "SELECT id, user_id, provider, encrypted_key, key_hash, created_at, updated_at
             FROM api_keys
             WHERE user_id = $1 AND provider = $2",
        )
        .bind(user_id.as_uuid())
        .bind(provider.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// All stored credentials for a user.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<ApiKeyRecord>> {
        let records = sqlx::query_as::<_, ApiKeyRecord>(
            "SELECT id, user_id, provider, encrypted_key, key_hash, created_at, updated_at
             FROM api_keys
             WHERE user_id = $1",
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Insert or replace the credential for (user, provider).
    pub async fn upsert(
        &self,
        user_id: UserId,
        provider: ProviderName,
        encrypted_key: &str,
        key_hash: &str,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO api_keys (id, user_id, provider, encrypted_key, key_hash)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (user_id, provider)
             DO UPDATE SET encrypted_key = $4, key_hash = $5, updated_at = NOW()",
        )
        .bind(Uuid::new_v4())
        .bind(user_id.as_uuid())
        .bind(provider.as_str())
        .bind(encrypted_key)
        .bind(key_hash)
        .execute(&self.pool)
        .await?;

        debug!(user_id = %user_id, provider = %provider, "Stored API key");
        Ok(())
    }

    /// Delete the credential for (user, provider). Returns whether a row
    /// existed.
    pub async fn delete(&self, user_id: UserId, provider: ProviderName) -> Result<bool> {
        let result = sqlx::query("DELETE FROM api_keys WHERE user_id = $1 AND provider = $2")
            .bind(user_id.as_uuid())
            .bind(provider.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
