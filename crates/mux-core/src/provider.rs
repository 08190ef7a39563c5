//! Provider enumeration and the adapter trait.

use crate::error::ProviderError;
use async_trait::async_trait;
use futures::stream::BoxStream;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The fixed set of supported upstream LLM providers.
///
/// The enumeration is closed on purpose: adapter dispatch is a static mapping
/// resolved once at startup, so a missing arm is a compile error rather than a
/// runtime fall-through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderName {
    /// OpenAI chat completions.
    OpenAi,
    /// Anthropic messages.
    Anthropic,
    /// Google AI Studio (Gemini).
    Google,
}

impl ProviderName {
    /// All supported providers, in a stable order.
    pub const ALL: [Self; 3] = [Self::OpenAi, Self::Anthropic, Self::Google];

    /// Canonical lowercase name, as stored and sent over the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Google => "google",
        }
    }
}

impl fmt::Display for ProviderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no known provider.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown provider: {0}")]
pub struct UnknownProvider(pub String);

impl FromStr for ProviderName {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            "google" => Ok(Self::Google),
            other => Err(UnknownProvider(other.to_string())),
        }
    }
}

/// A lazy, finite, non-restartable sequence of completion text fragments.
///
/// Fragments arrive in upstream order. A mid-stream failure surfaces as an
/// `Err` item; fragments yielded before it stand (the caller treats them as a
/// partial, failed response).
pub type FragmentStream = BoxStream<'static, Result<String, ProviderError>>;

/// Uniform contract over one upstream streaming completion API.
///
/// Adapters are thin translation layers: they never retry, never buffer the
/// whole completion, and never share credentials across calls — the API key
/// for the requesting user is passed per call.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Which provider this adapter talks to.
    fn name(&self) -> ProviderName;

    /// Model identifier recorded with persisted responses.
    fn model(&self) -> &str;

    /// Open a streaming completion for `prompt` using `api_key`.
    ///
    /// Returns an error if the upstream connection cannot be established;
    /// failures after that point are reported through the stream itself.
    async fn stream_completion(
        &self,
        api_key: &SecretString,
        prompt: &str,
    ) -> Result<FragmentStream, ProviderError>;

    /// Confirm that `api_key` authenticates with one minimal, low-cost call.
    ///
    /// Never performs a full completion and never fails: any transport or
    /// auth error reads as `false`.
    async fn verify_credential(&self, api_key: &SecretString) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_names_round_trip() {
        for name in ProviderName::ALL {
            assert_eq!(name.as_str().parse::<ProviderName>().ok(), Some(name));
        }
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let err = "cohere".parse::<ProviderName>().unwrap_err();
        assert_eq!(err.0, "cohere");
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&ProviderName::OpenAi).expect("serialize");
        assert_eq!(json, "\"openai\"");
        let back: ProviderName = serde_json::from_str("\"google\"").expect("deserialize");
        assert_eq!(back, ProviderName::Google);
    }
}
