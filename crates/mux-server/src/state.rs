//! Shared application state.

use crate::auth::JwtKeys;
use crate::config::Config;
use axum::extract::FromRef;
use mux_fanout::{Fanout, StoreResolver};
use mux_providers::ProviderRegistry;
use mux_security::Encryption;
use mux_storage::{ApiKeyStore, PromptStore, ResponseStore};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use std::sync::Arc;

/// Everything the handlers share. Cheap to clone; all fields are pool- or
/// Arc-backed.
#[derive(Clone)]
pub struct AppState {
    /// Prompt reads and writes.
    pub prompts: PromptStore,
    /// Response record reads.
    pub responses: ResponseStore,
    /// Credential reads and writes.
    pub keys: ApiKeyStore,
    /// Credential encryption at rest.
    pub encryption: Encryption,
    /// Adapter lookup for the fixed provider set.
    pub registry: ProviderRegistry,
    /// The fan-out orchestrator.
    pub fanout: Fanout,
    /// Bearer token keys.
    pub jwt: JwtKeys,
}

impl AppState {
    /// Assemble the state from a connected pool and resolved configuration.
    #[must_use]
    pub fn new(pool: PgPool, config: &Config, registry: ProviderRegistry) -> Self {
        let encryption = encryption_from_config(config);
        let keys = ApiKeyStore::new(pool.clone());
        let responses = ResponseStore::new(pool.clone());

        let fanout = Fanout::new(
            Arc::new(StoreResolver::new(keys.clone(), encryption.clone())),
            Arc::new(responses.clone()),
            registry.clone(),
        );

        Self {
            prompts: PromptStore::new(pool.clone()),
            responses,
            keys,
            encryption,
            registry,
            fanout,
            jwt: JwtKeys::new(&config.jwt_secret),
        }
    }
}

/// A 64-char hex value is used as the raw 256-bit key; anything else is
/// treated as a passphrase and stretched through SHA-256.
fn encryption_from_config(config: &Config) -> Encryption {
    let material = config.encryption_key.expose_secret();
    match Encryption::from_hex(material) {
        Ok(encryption) => encryption,
        Err(_) => Encryption::from_passphrase(material),
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}
