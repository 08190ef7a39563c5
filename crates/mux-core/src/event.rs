//! Wire-level stream events.
//!
//! One fan-out invocation produces a sequence of these, serialized one per
//! SSE message. They are transient; nothing here is persisted.

use crate::provider::ProviderName;
use crate::types::PromptId;
use serde::{Deserialize, Serialize};

/// One event on the client-facing stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    /// One incremental text fragment from a provider.
    Chunk {
        /// Originating provider.
        provider: ProviderName,
        /// The fragment text.
        text: String,
    },

    /// A provider finished successfully; `text` is the full accumulated
    /// response.
    Response {
        /// Originating provider.
        provider: ProviderName,
        /// Full response text.
        text: String,
        /// Always `true`; kept on the wire for client compatibility.
        done: bool,
    },

    /// A provider failed, or (with no provider tag) the fan-out itself hit an
    /// unexpected internal failure and is closing.
    Error {
        /// Originating provider, absent for fatal internal failures.
        #[serde(skip_serializing_if = "Option::is_none")]
        provider: Option<ProviderName>,
        /// Operator-safe message; never a stack trace.
        message: String,
    },

    /// Terminal marker: every requested provider reached a terminal state.
    /// Emitted exactly once per fan-out.
    Complete {
        /// The prompt this fan-out served.
        prompt_id: PromptId,
    },
}

impl StreamEvent {
    /// A tagged chunk event.
    pub fn chunk(provider: ProviderName, text: impl Into<String>) -> Self {
        Self::Chunk {
            provider,
            text: text.into(),
        }
    }

    /// A provider's successful terminal event.
    pub fn response(provider: ProviderName, text: impl Into<String>) -> Self {
        Self::Response {
            provider,
            text: text.into(),
            done: true,
        }
    }

    /// A provider-tagged error event.
    pub fn provider_error(provider: ProviderName, message: impl Into<String>) -> Self {
        Self::Error {
            provider: Some(provider),
            message: message.into(),
        }
    }

    /// An untagged fatal error event; the stream closes after it.
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Error {
            provider: None,
            message: message.into(),
        }
    }

    /// The exactly-once stream terminator.
    #[must_use]
    pub fn complete(prompt_id: PromptId) -> Self {
        Self::Complete { prompt_id }
    }

    /// Whether the transport should label this event `error` rather than
    /// `message`.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// The provider tag, when the event carries one.
    #[must_use]
    pub fn provider(&self) -> Option<ProviderName> {
        match self {
            Self::Chunk { provider, .. } | Self::Response { provider, .. } => Some(*provider),
            Self::Error { provider, .. } => *provider,
            Self::Complete { .. } => None,
        }
    }

    /// Whether this event ends a provider's participation in the fan-out.
    #[must_use]
    pub fn is_terminal_for(&self, name: ProviderName) -> bool {
        match self {
            Self::Response { provider, .. } => *provider == name,
            Self::Error { provider, .. } => *provider == Some(name),
            _ => false,
        }
    }
}
