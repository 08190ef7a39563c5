//! Google AI Studio (Gemini) provider adapter.
//!
//! Streams `models/{model}:streamGenerateContent` with `alt=sse`; each SSE
//! message is a full `GenerateContentResponse` whose candidate parts carry
//! the text delta. The stream ends when the server closes the connection.
//! Credential verification lists models, which authenticates the key without
//! generating anything.

use async_stream::try_stream;
use async_trait::async_trait;
use futures_util::StreamExt;
use mux_core::{CompletionProvider, FragmentStream, ProviderError, ProviderName};
use reqwest::Client;
use reqwest_eventsource::{Event, EventSource};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Default public API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default model for completions.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Google adapter configuration.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// API base URL (overridable for tests and proxies).
    pub base_url: String,
    /// Model used for completions.
    pub model: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

impl GoogleConfig {
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

/// Google Gemini adapter.
pub struct GoogleProvider {
    config: GoogleConfig,
    client: Client,
}

impl GoogleProvider {
    /// Create a new adapter.
    pub fn new(config: GoogleConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                ProviderError::upstream(
                    ProviderName::Google,
                    None,
                    format!("failed to create HTTP client: {e}"),
                )
            })?;

        Ok(Self { config, client })
    }

    fn stream_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent",
            self.config.base_url, self.config.model
        )
    }
}

#[async_trait]
impl CompletionProvider for GoogleProvider {
    fn name(&self) -> ProviderName {
        ProviderName::Google
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn stream_completion(
        &self,
        api_key: &SecretString,
        prompt: &str,
    ) -> Result<FragmentStream, ProviderError> {
        debug!(model = %self.config.model, "Starting Google streaming request");

        // The key travels as a query parameter; never log the full URL.
        let request = self
            .client
            .post(self.stream_url())
            .query(&[("alt", "sse"), ("key", api_key.expose_secret())])
            .json(&json!({
                "contents": [{ "parts": [{ "text": prompt }] }]
            }));

        let event_source = EventSource::new(request).map_err(|e| {
            ProviderError::upstream(
                ProviderName::Google,
                None,
                format!("failed to open event source: {e}"),
            )
        })?;

        let stream = try_stream! {
            let mut es = event_source;

            while let Some(event) = es.next().await {
                match event {
                    Ok(Event::Open) => {
                        trace!("Google stream opened");
                    }
                    Ok(Event::Message(msg)) => {
                        match serde_json::from_str::<GenerateContentChunk>(&msg.data) {
                            Ok(chunk) => {
                                if let Some(text) = chunk.text() {
                                    yield text;
                                }
                            }
                            Err(e) => {
                                warn!(error = %e, "Failed to parse Google chunk");
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
        let url = format!("{}/v1beta/models", self.config.base_url);

        match self
            .client
            .get(url)
            .query(&[("key", api_key.expose_secret().as_str()), ("pageSize", "1")])
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(error = %e, "Google credential check failed");
                false
            }
        }
    }
}

/// Map an event-source failure to the provider error taxonomy.
fn map_stream_error(err: &reqwest_eventsource::Error) -> ProviderError {
    match err {
        reqwest_eventsource::Error::InvalidStatusCode(status, _) => match status.as_u16() {
            400 | 401 | 403 => ProviderError::auth(ProviderName::Google, "invalid API key"),
            429 => ProviderError::rate_limited(ProviderName::Google, "rate limit exceeded"),
            code => ProviderError::upstream(
                ProviderName::Google,
                Some(code),
                format!("unexpected status {code}"),
            ),
        },
        reqwest_eventsource::Error::Transport(e) => {
            ProviderError::upstream(ProviderName::Google, None, e.to_string())
        }
        other => ProviderError::stream(ProviderName::Google, other.to_string()),
    }
}

// ============================================================================
// Google API types
// ============================================================================

#[derive(Debug, Deserialize)]
struct GenerateContentChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentChunk {
    /// Concatenated non-empty text of the first candidate's parts, if any.
    fn text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}
