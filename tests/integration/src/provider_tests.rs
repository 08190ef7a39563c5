//! Adapter tests against wiremock SSE upstreams.

use crate::mock_upstream::*;
use futures::StreamExt;
use mux_core::{CompletionProvider, ProviderError};
use mux_providers::{
    AnthropicConfig, AnthropicProvider, GoogleConfig, GoogleProvider, OpenAiConfig, OpenAiProvider,
};
use secrecy::SecretString;
use wiremock::MockServer;

fn key() -> SecretString {
    SecretString::new("sk-integration-test".to_string())
}

async fn collect_fragments(
    provider: &dyn CompletionProvider,
) -> Vec<Result<String, ProviderError>> {
    let stream = provider
        .stream_completion(&key(), "hello")
        .await
        .expect("stream opens");
    stream.collect().await
}

fn openai(server: &MockServer) -> OpenAiProvider {
    OpenAiProvider::new(OpenAiConfig::default().with_base_url(server.uri())).expect("provider")
}

fn anthropic(server: &MockServer) -> AnthropicProvider {
    AnthropicProvider::new(AnthropicConfig::default().with_base_url(server.uri()))
        .expect("provider")
}

fn google(server: &MockServer) -> GoogleProvider {
    GoogleProvider::new(GoogleConfig::default().with_base_url(server.uri())).expect("provider")
}

#[tokio::test]
async fn openai_streams_fragments_until_done_sentinel() {
    let server = MockServer::start().await;
    mount_openai_stream(&server, &["Hello", " world"]).await;

    let fragments = collect_fragments(&openai(&server)).await;
    let texts: Vec<String> = fragments.into_iter().map(|f| f.expect("fragment")).collect();
    assert_eq!(texts, vec!["Hello", " world"]);
}

#[tokio::test]
async fn openai_rejected_credential_surfaces_as_auth_error() {
    let server = MockServer::start().await;
    mount_openai_auth_error(&server).await;

    let fragments = collect_fragments(&openai(&server)).await;
    assert_eq!(fragments.len(), 1);
    match &fragments[0] {
        Err(ProviderError::Auth { .. }) => {}
        other => panic!("expected auth error, got {other:?}"),
    }
}

#[tokio::test]
async fn openai_credential_check_reflects_upstream_status() {
    let ok_server = MockServer::start().await;
    mount_openai_models(&ok_server, 200).await;
    assert!(openai(&ok_server).verify_credential(&key()).await);

    let bad_server = MockServer::start().await;
    mount_openai_models(&bad_server, 401).await;
    assert!(!openai(&bad_server).verify_credential(&key()).await);
}

#[tokio::test]
async fn repeated_credential_checks_stay_valid_and_only_probe_upstream() {
    let server = MockServer::start().await;
    mount_openai_models(&server, 200).await;
    let provider = openai(&server);

    assert!(provider.verify_credential(&key()).await);
    assert!(provider.verify_credential(&key()).await);

    // Two model-list lookups and nothing else: no completion calls, no
    // writes anywhere.
    let requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 2);
    for request in &requests {
        assert_eq!(request.method.to_string(), "GET");
        assert_eq!(request.url.path(), "/v1/models");
    }
}

#[tokio::test]
async fn anthropic_streams_text_deltas_until_message_stop() {
    let server = MockServer::start().await;
    mount_anthropic_stream(&server, anthropic_sse_body(&["Hi", " there"])).await;

    let fragments = collect_fragments(&anthropic(&server)).await;
    let texts: Vec<String> = fragments.into_iter().map(|f| f.expect("fragment")).collect();
    assert_eq!(texts, vec!["Hi", " there"]);
}

#[tokio::test]
async fn anthropic_error_event_fails_the_stream_after_partial_output() {
    let server = MockServer::start().await;
    mount_anthropic_stream(&server, anthropic_sse_error_body(&["par"], "Overloaded")).await;

    let mut fragments = collect_fragments(&anthropic(&server)).await;
    let last = fragments.pop().expect("terminal item");
    match last {
        Err(ProviderError::Stream { message, .. }) => assert_eq!(message, "Overloaded"),
        other => panic!("expected stream error, got {other:?}"),
    }
    let texts: Vec<String> = fragments.into_iter().map(|f| f.expect("fragment")).collect();
    assert_eq!(texts, vec!["par"]);
}

#[tokio::test]
async fn anthropic_credential_check_uses_a_minimal_message() {
    let server = MockServer::start().await;
    mount_anthropic_messages(&server, 200).await;
    assert!(anthropic(&server).verify_credential(&key()).await);
}

#[tokio::test]
async fn google_streams_candidate_parts() {
    let server = MockServer::start().await;
    let provider = google(&server);
    mount_google_stream(&server, provider.model(), &["One", "Two"]).await;

    let fragments = collect_fragments(&provider).await;
    let texts: Vec<String> = fragments.into_iter().map(|f| f.expect("fragment")).collect();
    assert_eq!(texts, vec!["One", "Two"]);
}

#[tokio::test]
async fn google_credential_check_reflects_upstream_status() {
    let server = MockServer::start().await;
    mount_google_models(&server, 403).await;
    assert!(!google(&server).verify_credential(&key()).await);
}
