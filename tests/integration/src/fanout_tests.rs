//! End-to-end fan-out tests: real adapters over wiremock upstreams, with a
//! static credential resolver and an in-memory sink.

use crate::mock_upstream::*;
use async_trait::async_trait;
use futures::StreamExt;
use mux_core::{CompletionProvider, PromptId, ProviderName, StreamEvent, UserId};
use mux_fanout::{
    CredentialResolver, Fanout, FanoutRequest, Resolution, ResolveError, ResponseSink, SinkError,
};
use mux_providers::{GoogleConfig, GoogleProvider, OpenAiConfig, OpenAiProvider, ProviderRegistry};
use mux_storage::NewResponse;
use secrecy::SecretString;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use wiremock::MockServer;

/// Resolver that hands out the same key for a fixed set of providers.
struct StaticResolver(HashSet<ProviderName>);

#[async_trait]
impl CredentialResolver for StaticResolver {
    async fn resolve(
        &self,
        _user_id: UserId,
        provider: ProviderName,
    ) -> Result<Resolution, ResolveError> {
        if self.0.contains(&provider) {
            Ok(Resolution::Key(SecretString::new("sk-e2e".to_string())))
        } else {
            Ok(Resolution::Absent)
        }
    }
}

#[derive(Default)]
struct RecordingSink(Mutex<Vec<NewResponse>>);

#[async_trait]
impl ResponseSink for RecordingSink {
    async fn record(&self, response: NewResponse) -> Result<(), SinkError> {
        self.0.lock().unwrap().push(response);
        Ok(())
    }
}

fn request(providers: Vec<ProviderName>) -> FanoutRequest {
    FanoutRequest {
        user_id: UserId::generate(),
        prompt_id: PromptId::generate(),
        prompt_text: "hello".to_string(),
        providers,
    }
}

#[tokio::test]
async fn two_mocked_providers_stream_concurrently_to_one_event_sequence() {
    let openai_server = MockServer::start().await;
    mount_openai_stream(&openai_server, &["Hel", "lo"]).await;

    let google_server = MockServer::start().await;
    let google =
        GoogleProvider::new(GoogleConfig::default().with_base_url(google_server.uri())).unwrap();
    mount_google_stream(&google_server, google.model(), &["Hi", "!"]).await;

    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(
        OpenAiProvider::new(OpenAiConfig::default().with_base_url(openai_server.uri())).unwrap(),
    ));
    registry.register(Arc::new(google));

    let sink = Arc::new(RecordingSink::default());
    let fanout = Fanout::new(
        Arc::new(StaticResolver(HashSet::from([
            ProviderName::OpenAi,
            ProviderName::Google,
        ]))),
        sink.clone(),
        registry,
    );

    let req = request(vec![ProviderName::OpenAi, ProviderName::Google]);
    let prompt_id = req.prompt_id;
    let events: Vec<StreamEvent> = fanout.run(req).collect().await;

    // Each provider's own events are ordered; the interleaving between the
    // two is not asserted.
    let openai_texts: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            StreamEvent::Chunk { provider, text } if *provider == ProviderName::OpenAi => {
                Some(text.as_str())
            }
            _ => None,
        })
        .collect();
    assert_eq!(openai_texts, vec!["Hel", "lo"]);

    assert!(events
        .iter()
        .any(|e| *e == StreamEvent::response(ProviderName::OpenAi, "Hello")));
    assert!(events
        .iter()
        .any(|e| *e == StreamEvent::response(ProviderName::Google, "Hi!")));
    assert_eq!(events.last(), Some(&StreamEvent::complete(prompt_id)));

    let records = sink.0.lock().unwrap();
    assert_eq!(records.len(), 2);
    for record in records.iter() {
        assert_eq!(record.prompt_id, prompt_id.as_uuid());
        assert!(record.error_message.is_none());
        assert!(record.elapsed_ms >= 0);
    }
}

#[tokio::test]
async fn upstream_auth_failure_is_isolated_to_its_provider() {
    let openai_server = MockServer::start().await;
    mount_openai_auth_error(&openai_server).await;

    let google_server = MockServer::start().await;
    let google =
        GoogleProvider::new(GoogleConfig::default().with_base_url(google_server.uri())).unwrap();
    mount_google_stream(&google_server, google.model(), &["ok"]).await;

    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(
        OpenAiProvider::new(OpenAiConfig::default().with_base_url(openai_server.uri())).unwrap(),
    ));
    registry.register(Arc::new(google));

    let sink = Arc::new(RecordingSink::default());
    let fanout = Fanout::new(
        Arc::new(StaticResolver(HashSet::from([
            ProviderName::OpenAi,
            ProviderName::Google,
        ]))),
        sink.clone(),
        registry,
    );

    let events: Vec<StreamEvent> = fanout
        .run(request(vec![ProviderName::OpenAi, ProviderName::Google]))
        .collect()
        .await;

    assert!(events
        .iter()
        .any(|e| e.is_terminal_for(ProviderName::OpenAi) && e.is_error()));
    assert!(events
        .iter()
        .any(|e| *e == StreamEvent::response(ProviderName::Google, "ok")));
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, StreamEvent::Complete { .. }))
            .count(),
        1
    );

    // Both providers ran, so both have records; only OpenAI's is a failure.
    let records = sink.0.lock().unwrap();
    assert_eq!(records.len(), 2);
    let openai_record = records
        .iter()
        .find(|r| r.provider == ProviderName::OpenAi)
        .expect("openai record");
    assert!(openai_record.error_message.is_some());
}

#[tokio::test]
async fn unconfigured_provider_yields_error_without_contacting_upstream() {
    let openai_server = MockServer::start().await;
    mount_openai_stream(&openai_server, &["hi"]).await;

    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(
        OpenAiProvider::new(OpenAiConfig::default().with_base_url(openai_server.uri())).unwrap(),
    ));

    let sink = Arc::new(RecordingSink::default());
    let fanout = Fanout::new(
        Arc::new(StaticResolver(HashSet::new())),
        sink.clone(),
        registry,
    );

    let events: Vec<StreamEvent> = fanout
        .run(request(vec![ProviderName::OpenAi]))
        .collect()
        .await;

    match &events[0] {
        StreamEvent::Error { provider, message } => {
            assert_eq!(*provider, Some(ProviderName::OpenAi));
            assert!(message.contains("No API key configured"));
        }
        other => panic!("expected error event, got {other:?}"),
    }
    assert!(sink.0.lock().unwrap().is_empty());
    assert!(openai_server.received_requests().await.unwrap().is_empty());
}
