//! Anthropic provider adapter.
//!
//! Streams the messages API over named SSE events: text arrives in
//! `content_block_delta` events, `message_stop` ends the stream, and `error`
//! events carry upstream failures. Credential verification sends a one-token
//! message, the cheapest call that exercises authentication.

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
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Default model for completions.
pub const DEFAULT_MODEL: &str = "claude-3-haiku-20240307";

/// Required API version header value.
const API_VERSION: &str = "2023-06-01";

/// Token budget for a full completion.
const MAX_TOKENS: u32 = 1024;

/// Anthropic adapter configuration.
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API base URL (overridable for tests and proxies).
    pub base_url: String,
    /// Model used for completions.
    pub model: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

impl AnthropicConfig {
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

/// Anthropic adapter.
pub struct AnthropicProvider {
    config: AnthropicConfig,
    client: Client,
}

impl AnthropicProvider {
    /// Create a new adapter.
    pub fn new(config: AnthropicConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ProviderError::upstream(
                    ProviderName::Anthropic,
                    None,
                    format!("failed to create HTTP client: {e}"),
                )
            })?;

        Ok(Self { config, client })
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.base_url)
    }

    fn messages_request(
        &self,
        api_key: &SecretString,
        prompt: &str,
        max_tokens: u32,
        stream: bool,
    ) -> reqwest::RequestBuilder {
        self.client
            .post(self.messages_url())
            .header("x-api-key", api_key.expose_secret())
            .header("anthropic-version", API_VERSION)
            .json(&MessagesRequest {
                model: self.config.model.clone(),
                max_tokens,
                messages: vec![Message {
                    role: "user",
                    content: prompt.to_string(),
                }],
                stream,
            })
    }
}

#[async_trait]
impl CompletionProvider for AnthropicProvider {
    fn name(&self) -> ProviderName {
        ProviderName::Anthropic
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn stream_completion(
        &self,
        api_key: &SecretString,
        prompt: &str,
    ) -> Result<FragmentStream, ProviderError> {
        debug!(model = %self.config.model, "Starting Anthropic streaming request");

        let request = self.messages_request(api_key, prompt, MAX_TOKENS, true);

        let event_source = EventSource::new(request).map_err(|e| {
            ProviderError::upstream(
                ProviderName::Anthropic,
                None,
                format!("failed to open event source: {e}"),
            )
        })?;

        let stream = try_stream! {
            let mut es = event_source;

            while let Some(event) = es.next().await {
                match event {
                    Ok(Event::Open) => {
                        trace!("Anthropic stream opened");
                    }
                    Ok(Event::Message(msg)) => match msg.event.as_str() {
                        "content_block_delta" => {
                            match serde_json::from_str::<DeltaEvent>(&msg.data) {
                                Ok(delta) => {
                                    if let Some(text) = delta.text() {
                                        yield text;
                                    }
                                }
                                Err(e) => {
                                    warn!(error = %e, "Failed to parse Anthropic delta");
                                }
                            }
                        }
                        "message_stop" => {
                            es.close();
                            break;
                        }
                        "error" => {
                            es.close();
                            let message = serde_json::from_str::<ErrorEvent>(&msg.data)
                                .map_or_else(|_| msg.data.clone(), |e| e.error.message);
                            Err(ProviderError::stream(ProviderName::Anthropic, message))?;
                        }
                        // message_start, content_block_start/stop, ping, ...
                        _ => {}
                    },
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
        match self.messages_request(api_key, "test", 1, false).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(error = %e, "Anthropic credential check failed");
                false
            }
        }
    }
}

/// Map an event-source failure to the provider error taxonomy.
fn map_stream_error(err: &reqwest_eventsource::Error) -> ProviderError {
    match err {
        reqwest_eventsource::Error::InvalidStatusCode(status, _) => match status.as_u16() {
            401 | 403 => ProviderError::auth(ProviderName::Anthropic, "invalid API key"),
            429 => ProviderError::rate_limited(ProviderName::Anthropic, "rate limit exceeded"),
            code => ProviderError::upstream(
                ProviderName::Anthropic,
                Some(code),
                format!("unexpected status {code}"),
            ),
        },
        reqwest_eventsource::Error::Transport(e) => {
            ProviderError::upstream(ProviderName::Anthropic, None, e.to_string())
        }
        other => ProviderError::stream(ProviderName::Anthropic, other.to_string()),
    }
}

// ============================================================================
// Anthropic API types
// ============================================================================

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct DeltaEvent {
    delta: Delta,
}

#[derive(Debug, Deserialize)]
struct Delta {
    #[serde(rename = "type")]
    delta_type: String,
    #[serde(default)]
    text: Option<String>,
}

impl DeltaEvent {
    /// The non-empty text of a `text_delta`, if any.
    fn text(self) -> Option<String> {
        if self.delta.delta_type == "text_delta" {
            self.delta.text.filter(|text| !text.is_empty())
        } else {
            None
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEvent {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}
