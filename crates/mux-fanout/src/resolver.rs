//! Per-provider credential resolution.

use async_trait::async_trait;
use mux_core::{ProviderName, UserId};
use mux_security::Encryption;
use mux_storage::ApiKeyStore;
use secrecy::SecretString;
use tracing::warn;

/// Outcome of looking up one (user, provider) credential.
///
/// `Absent` and `DecryptFailed` are ordinary per-provider outcomes, surfaced
/// to the client as distinct error events; only a backing-store failure is an
/// `Err`.
pub enum Resolution {
    /// The credential exists and decrypted cleanly.
    Key(SecretString),
    /// No credential is stored for this (user, provider).
    Absent,
    /// A credential is stored but could not be decrypted (key rotation, data
    /// corruption).
    DecryptFailed,
}

/// Backing-store failure during resolution. Not attributable to a single
/// provider's configuration; the orchestrator turns it into a fatal event.
#[derive(Debug, thiserror::Error)]
#[error("credential store error: {0}")]
pub struct ResolveError(pub String);

/// Pure lookup + decrypt of a stored provider credential.
#[async_trait]
pub trait CredentialResolver: Send + Sync {
    /// Resolve the decrypted API key for (user, provider).
    async fn resolve(
        &self,
        user_id: UserId,
        provider: ProviderName,
    ) -> Result<Resolution, ResolveError>;
}

/// Resolver over the encrypted credential store.
#[derive(Debug, Clone)]
pub struct StoreResolver {
    keys: ApiKeyStore,
    encryption: Encryption,
}

impl StoreResolver {
    /// Create a resolver over the key store and encryption service.
    #[must_use]
    pub fn new(keys: ApiKeyStore, encryption: Encryption) -> Self {
        Self { keys, encryption }
    }
}

#[async_trait]
impl CredentialResolver for StoreResolver {
    async fn resolve(
        &self,
        user_id: UserId,
        provider: ProviderName,
    ) -> Result<Resolution, ResolveError> {
        let record = self
            .keys
            .get(user_id, provider)
            .await
            .map_err(|e| ResolveError(e.to_string()))?;

        let Some(record) = record else {
            return Ok(Resolution::Absent);
        };

        match self.encryption.decrypt_string(&record.encrypted_key) {
            Ok(plaintext) => Ok(Resolution::Key(SecretString::new(plaintext))),
            Err(e) => {
                warn!(user_id = %user_id, provider = %provider, error = %e, "Stored API key failed to decrypt");
                Ok(Resolution::DecryptFailed)
            }
        }
    }
}
