//! The fan-out orchestrator.
//!
//! One invocation moves through Resolving → Streaming → Finalizing:
//! credentials are resolved up front (misconfigured providers become error
//! events and are excluded), each resolved provider streams in its own task
//! feeding a fan-in channel, and after every provider reaches its terminal
//! event exactly one `complete` marker closes the stream.
//!
//! Per-provider chunk ordering holds because each task is the sole sender of
//! its provider's events; cross-provider interleaving is unspecified.
//! Dropping the returned stream aborts all provider tasks, so a client
//! disconnect stops upstream token consumption and persistence.

use crate::resolver::{CredentialResolver, Resolution};
use crate::sink::ResponseSink;
use async_stream::stream;
use futures::stream::BoxStream;
use futures_util::StreamExt;
use mux_core::{CompletionProvider, PromptId, ProviderError, ProviderName, StreamEvent, UserId};
use mux_providers::ProviderRegistry;
use mux_storage::NewResponse;
use secrecy::SecretString;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Fan-in channel depth; applies backpressure to providers that outpace the
/// client connection.
const CHANNEL_CAPACITY: usize = 64;

/// One fan-out invocation: a persisted prompt plus the providers selected
/// for it. Owned exclusively by the orchestrator call that consumes it.
#[derive(Debug, Clone)]
pub struct FanoutRequest {
    /// The requesting user.
    pub user_id: UserId,
    /// The already-persisted prompt this fan-out serves.
    pub prompt_id: PromptId,
    /// Raw prompt text forwarded to every provider.
    pub prompt_text: String,
    /// Selected providers, in request order.
    pub providers: Vec<ProviderName>,
}

/// The fan-out orchestrator. Cheap to clone; one instance serves all
/// invocations.
#[derive(Clone)]
pub struct Fanout {
    resolver: Arc<dyn CredentialResolver>,
    sink: Arc<dyn ResponseSink>,
    registry: ProviderRegistry,
}

impl Fanout {
    /// Create an orchestrator over its collaborator seams.
    #[must_use]
    pub fn new(
        resolver: Arc<dyn CredentialResolver>,
        sink: Arc<dyn ResponseSink>,
        registry: ProviderRegistry,
    ) -> Self {
        Self {
            resolver,
            sink,
            registry,
        }
    }

    /// Run one fan-out, returning the client-facing event stream.
    ///
    /// The stream owns all provider tasks: dropping it cancels them.
    pub fn run(&self, request: FanoutRequest) -> BoxStream<'static, StreamEvent> {
        let resolver = Arc::clone(&self.resolver);
        let sink = Arc::clone(&self.sink);
        let registry = self.registry.clone();

        let events = stream! {
            let prompt_id = request.prompt_id;
            info!(
                prompt_id = %prompt_id,
                providers = request.providers.len(),
                "Starting fan-out"
            );

            // Resolving: runs to completion before any provider streams.
            let mut resolved: Vec<(ProviderName, Arc<dyn CompletionProvider>, SecretString)> =
                Vec::new();

            for name in request.providers.iter().copied() {
                let Some(adapter) = registry.get(name) else {
                    yield StreamEvent::provider_error(name, not_configured(name));
                    continue;
                };

                match resolver.resolve(request.user_id, name).await {
                    Ok(Resolution::Key(key)) => resolved.push((name, adapter, key)),
                    Ok(Resolution::Absent) => {
                        yield StreamEvent::provider_error(name, not_configured(name));
                    }
                    Ok(Resolution::DecryptFailed) => {
                        yield StreamEvent::provider_error(
                            name,
                            format!("Failed to decrypt API key for {name}"),
                        );
                    }
                    Err(e) => {
                        error!(prompt_id = %prompt_id, error = %e, "Credential resolution failed");
                        yield StreamEvent::fatal("Internal error resolving credentials");
                        return;
                    }
                }
            }

            // Streaming: one task per resolved provider, fan-in over mpsc.
            // Each task is the only sender of its provider's events, which
            // preserves per-provider ordering through the channel.
            let (tx, mut rx) = mpsc::channel::<StreamEvent>(CHANNEL_CAPACITY);
            let mut tasks = JoinSet::new();

            for (name, adapter, key) in resolved {
                let tx = tx.clone();
                let sink = Arc::clone(&sink);
                let prompt_text = request.prompt_text.clone();
                tasks.spawn(run_provider(
                    name, adapter, key, prompt_text, prompt_id, sink, tx,
                ));
            }
            drop(tx);

            while let Some(event) = rx.recv().await {
                yield event;
            }

            // The channel closed, so every task has sent its terminal event
            // (or panicked, dropping its sender).
            while let Some(result) = tasks.join_next().await {
                match result {
                    Ok(name) => debug!(prompt_id = %prompt_id, provider = %name, "Provider task finished"),
                    Err(e) => {
                        error!(prompt_id = %prompt_id, error = %e, "Provider task aborted unexpectedly");
                        yield StreamEvent::fatal("Internal error during fan-out");
                        return;
                    }
                }
            }

            info!(prompt_id = %prompt_id, "Fan-out complete");
            yield StreamEvent::complete(prompt_id);
        };

        Box::pin(events)
    }
}

impl std::fmt::Debug for Fanout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fanout")
            .field("registry", &self.registry)
            .finish()
    }
}

fn not_configured(name: ProviderName) -> String {
    format!("No API key configured for {name}. Please add it in Settings.")
}

enum StreamOutcome {
    Finished,
    Failed(ProviderError),
    /// The fan-in receiver is gone (client disconnected); stop without
    /// persisting.
    Disconnected,
}

/// Drive one provider to its terminal event.
///
/// Emits that provider's chunks in upstream order, persists the finalized
/// record (success or failure), and emits exactly one terminal event.
async fn run_provider(
    name: ProviderName,
    adapter: Arc<dyn CompletionProvider>,
    api_key: SecretString,
    prompt: String,
    prompt_id: PromptId,
    sink: Arc<dyn ResponseSink>,
    tx: mpsc::Sender<StreamEvent>,
) -> ProviderName {
    let started = Instant::now();
    let mut text = String::new();

    let outcome = stream_fragments(&*adapter, &api_key, &prompt, name, &mut text, &tx).await;
    let elapsed_ms = i32::try_from(started.elapsed().as_millis()).unwrap_or(i32::MAX);

    match outcome {
        StreamOutcome::Disconnected => {}
        StreamOutcome::Finished => {
            info!(
                provider = %name,
                elapsed_ms,
                chars = text.len(),
                "Provider stream finished"
            );

            let record = NewResponse {
                prompt_id: prompt_id.as_uuid(),
                provider: name,
                model: adapter.model().to_string(),
                text: text.clone(),
                elapsed_ms,
                error_message: None,
            };

            let event = match sink.record(record).await {
                Ok(()) => StreamEvent::response(name, text),
                Err(e) => {
                    error!(provider = %name, error = %e, "Failed to persist response");
                    StreamEvent::provider_error(name, format!("Failed to persist {name} response"))
                }
            };
            let _ = tx.send(event).await;
        }
        StreamOutcome::Failed(err) => {
            warn!(provider = %name, error = %err, "Provider stream failed");

            // The adapter ran, so the failure is recorded too: partial text
            // plus the upstream message, for auditability.
            let record = NewResponse {
                prompt_id: prompt_id.as_uuid(),
                provider: name,
                model: adapter.model().to_string(),
                text,
                elapsed_ms,
                error_message: Some(err.to_string()),
            };
            if let Err(e) = sink.record(record).await {
                error!(provider = %name, error = %e, "Failed to persist failure record");
            }

            let _ = tx.send(StreamEvent::provider_error(name, err.to_string())).await;
        }
    }

    name
}

async fn stream_fragments(
    adapter: &dyn CompletionProvider,
    api_key: &SecretString,
    prompt: &str,
    name: ProviderName,
    text: &mut String,
    tx: &mpsc::Sender<StreamEvent>,
) -> StreamOutcome {
    let mut fragments = match adapter.stream_completion(api_key, prompt).await {
        Ok(fragments) => fragments,
        Err(e) => return StreamOutcome::Failed(e),
    };

    while let Some(fragment) = fragments.next().await {
        match fragment {
            Ok(fragment) => {
                text.push_str(&fragment);
                if tx.send(StreamEvent::chunk(name, fragment)).await.is_err() {
                    return StreamOutcome::Disconnected;
                }
            }
            Err(e) => return StreamOutcome::Failed(e),
        }
    }

    StreamOutcome::Finished
}
