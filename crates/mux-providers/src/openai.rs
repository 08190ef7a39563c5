//! OpenAI provider adapter.
//!
//! Streams chat completions over SSE (`data:` chunk lines, `[DONE]`
//! sentinel). Credential verification lists models, which authenticates the
//! key without generating anything.

use async_stream::try_stream;
use async_trait::async_trait;
use futures_util::StreamExt;
use mux_core::{CompletionProvider, FragmentStream, ProviderError, ProviderName};
use reqwest::Client;
use reqwest_eventsource::{Event, EventSource};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Default public API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Default model for completions.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// OpenAI adapter configuration.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API base URL (overridable for tests and proxies).
    pub base_url: String,
    /// Model used for completions.
    pub model: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

impl OpenAiConfig {
    /// Set the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// OpenAI adapter.
pub struct OpenAiProvider {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiProvider {
    /// Create a new adapter.
    pub fn new(config: OpenAiConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ProviderError::upstream(
                    ProviderName::OpenAi,
                    None,
                    format!("failed to create HTTP client: {e}"),
                )
            })?;

        Ok(Self { config, client })
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.config.base_url)
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn name(&self) -> ProviderName {
        ProviderName::OpenAi
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn stream_completion(
        &self,
        api_key: &SecretString,
        prompt: &str,
    ) -> Result<FragmentStream, ProviderError> {
        let body = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt.to_string(),
            }],
            stream: true,
        };

        debug!(model = %self.config.model, "Starting OpenAI streaming request");

        let request = self
            .client
            .post(self.completions_url())
            .bearer_auth(api_key.expose_secret())
            .json(&body);

        let event_source = EventSource::new(request).map_err(|e| {
            ProviderError::upstream(
                ProviderName::OpenAi,
                None,
                format!("failed to open event source: {e}"),
            )
        })?;

        let stream = try_stream! {
            let mut es = event_source;

            while let Some(event) = es.next().await {
                match event {
                    Ok(Event::Open) => {
                        trace!("OpenAI stream opened");
                    }
                    Ok(Event::Message(msg)) => {
                        let data = msg.data.trim();

                        if data == "[DONE]" {
                            es.close();
                            break;
                        }

                        match serde_json::from_str::<ChatChunk>(data) {
                            Ok(chunk) => {
                                if let Some(text) = chunk.delta_text() {
                                    yield text;
                                }
                            }
                            Err(e) => {
                                warn!(error = %e, "Failed to parse OpenAI chunk");
                            }
                        }
                    }
                    Err(reqwest_eventsource::Error::StreamEnded) => break,
                    Err(e) => {
                        es.close();
                        Err(map_stream_error(&e))?;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }

    async fn verify_credential(&self, api_key: &SecretString) -> bool {
        let url = format!("{}/v1/models", self.config.base_url);

        match self
            .client
            .get(url)
            .bearer_auth(api_key.expose_secret())
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(error = %e, "OpenAI credential check failed");
                false
            }
        }
    }
}

/// Map an event-source failure to the provider error taxonomy.
fn map_stream_error(err: &reqwest_eventsource::Error) -> ProviderError {
    match err {
        reqwest_eventsource::Error::InvalidStatusCode(status, _) => match status.as_u16() {
            401 | 403 => ProviderError::auth(ProviderName::OpenAi, "invalid API key"),
            429 => ProviderError::rate_limited(ProviderName::OpenAi, "rate limit exceeded"),
            code => ProviderError::upstream(
                ProviderName::OpenAi,
                Some(code),
                format!("unexpected status {code}"),
            ),
        },
        reqwest_eventsource::Error::Transport(e) => {
            ProviderError::upstream(ProviderName::OpenAi, None, e.to_string())
        }
        other => ProviderError::stream(ProviderName::OpenAi, other.to_string()),
    }
}

// ============================================================================
// OpenAI API types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatChunk {
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    delta: ChunkDelta,
}

#[derive(Debug, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

impl ChatChunk {
    /// The non-empty text delta of this chunk, if any.
    fn delta_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.delta.content)
            .filter(|text| !text.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_text_is_extracted() {
        let chunk: ChatChunk = serde_json::from_str(
            r#"{"id":"c1","choices":[{"index":0,"delta":{"content":"Hello"},"finish_reason":null}]}"#,
        )
        .expect("parse");
        assert_eq!(chunk.delta_text().as_deref(), Some("Hello"));
    }

    #[test]
    fn finish_chunk_has_no_text() {
        let chunk: ChatChunk = serde_json::from_str(
            r#"{"choices":[{"index":0,"delta":{},"finish_reason":"stop"}]}"#,
        )
        .expect("parse");
        assert_eq!(chunk.delta_text(), None);
    }

    #[test]
    fn empty_delta_is_dropped() {
        let chunk: ChatChunk =
            serde_json::from_str(r#"{"choices":[{"delta":{"content":""}}]}"#).expect("parse");
        assert_eq!(chunk.delta_text(), None);
    }

    #[test]
    fn config_builder_overrides() {
        let config = OpenAiConfig::default()
            .with_base_url("http://localhost:9999")
            .with_model("gpt-test");
        assert_eq!(config.base_url, "http://localhost:9999");
        assert_eq!(config.model, "gpt-test");
    }
}
