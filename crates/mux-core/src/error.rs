//! Provider error taxonomy.

use crate::provider::ProviderName;

/// Failure raised by a provider adapter, before or during streaming.
///
/// Every variant is scoped to a single provider; the orchestrator converts
/// these into tagged error events instead of letting them cross provider
/// boundaries.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The upstream rejected the credential.
    #[error("{provider} authentication failed: {message}")]
    Auth {
        /// Originating provider.
        provider: ProviderName,
        /// Upstream message.
        message: String,
    },

    /// The upstream rate-limited the request.
    #[error("{provider} rate limited: {message}")]
    RateLimited {
        /// Originating provider.
        provider: ProviderName,
        /// Upstream message.
        message: String,
    },

    /// The upstream request failed outright (connect, non-2xx, bad payload).
    #[error("{provider} request failed: {message}")]
    Upstream {
        /// Originating provider.
        provider: ProviderName,
        /// HTTP status, when one was received.
        status: Option<u16>,
        /// Upstream message.
        message: String,
    },

    /// The stream broke after it was established.
    #[error("{provider} stream error: {message}")]
    Stream {
        /// Originating provider.
        provider: ProviderName,
        /// Upstream message.
        message: String,
    },
}

impl ProviderError {
    /// Authentication failure.
    pub fn auth(provider: ProviderName, message: impl Into<String>) -> Self {
        Self::Auth {
            provider,
            message: message.into(),
        }
    }

    /// Rate-limit failure.
    pub fn rate_limited(provider: ProviderName, message: impl Into<String>) -> Self {
        Self::RateLimited {
            provider,
            message: message.into(),
        }
    }

    /// Request-level failure, optionally carrying the HTTP status.
    pub fn upstream(
        provider: ProviderName,
        status: Option<u16>,
        message: impl Into<String>,
    ) -> Self {
        Self::Upstream {
            provider,
            status,
            message: message.into(),
        }
    }

    /// Mid-stream failure.
    pub fn stream(provider: ProviderName, message: impl Into<String>) -> Self {
        Self::Stream {
            provider,
            message: message.into(),
        }
    }

    /// The provider this failure is attributed to.
    #[must_use]
    pub fn provider(&self) -> ProviderName {
        match self {
            Self::Auth { provider, .. }
            | Self::RateLimited { provider, .. }
            | Self::Upstream { provider, .. }
            | Self::Stream { provider, .. } => *provider,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_carries_its_provider() {
        let err = ProviderError::auth(ProviderName::Anthropic, "bad key");
        assert_eq!(err.provider(), ProviderName::Anthropic);
        assert!(err.to_string().contains("anthropic"));
    }

    #[test]
    fn upstream_error_keeps_status() {
        let err = ProviderError::upstream(ProviderName::OpenAi, Some(429), "slow down");
        match err {
            ProviderError::Upstream { status, .. } => assert_eq!(status, Some(429)),
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
