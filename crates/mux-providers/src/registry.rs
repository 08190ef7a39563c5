//! Static provider registry.
//!
//! Dispatch from provider name to adapter is a mapping resolved once at
//! startup, not a name-keyed conditional in the request path: the exhaustive
//! match in [`ProviderRegistry::with_defaults`] forces compile-time coverage
//! of the fixed provider set.

use crate::{AnthropicConfig, AnthropicProvider, GoogleConfig, GoogleProvider, OpenAiConfig, OpenAiProvider};
use mux_core::{CompletionProvider, ProviderError, ProviderName};
use std::collections::HashMap;
use std::sync::Arc;

/// Immutable name-to-adapter mapping.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderName, Arc<dyn CompletionProvider>>,
}

impl ProviderRegistry {
    /// An empty registry. Mostly useful for tests that register fakes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the full registry with default adapter configurations.
    pub fn with_defaults() -> Result<Self, ProviderError> {
        Self::build(
            OpenAiConfig::default(),
            AnthropicConfig::default(),
            GoogleConfig::default(),
        )
    }

    /// Build the full registry from explicit adapter configurations.
    pub fn build(
        openai: OpenAiConfig,
        anthropic: AnthropicConfig,
        google: GoogleConfig,
    ) -> Result<Self, ProviderError> {
        let mut registry = Self::new();

        for name in ProviderName::ALL {
            let provider: Arc<dyn CompletionProvider> = match name {
                ProviderName::OpenAi => Arc::new(OpenAiProvider::new(openai.clone())?),
                ProviderName::Anthropic => Arc::new(AnthropicProvider::new(anthropic.clone())?),
                ProviderName::Google => Arc::new(GoogleProvider::new(google.clone())?),
            };
            registry.register(provider);
        }

        Ok(registry)
    }

    /// Register an adapter under its own name, replacing any previous one.
    pub fn register(&mut self, provider: Arc<dyn CompletionProvider>) {
        self.providers.insert(provider.name(), provider);
    }

    /// Look up the adapter for a provider.
    #[must_use]
    pub fn get(&self, name: ProviderName) -> Option<Arc<dyn CompletionProvider>> {
        self.providers.get(&name).cloned()
    }

    /// Number of registered adapters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether no adapter is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .finish()
    }
}
