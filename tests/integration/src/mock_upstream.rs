//! Wiremock SSE fixtures mimicking the three upstream streaming APIs.

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SSE_CONTENT_TYPE: &str = "text/event-stream";

fn sse_response(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, SSE_CONTENT_TYPE)
}

/// OpenAI-shaped SSE body: one chat chunk per fragment, `[DONE]` sentinel.
pub fn openai_sse_body(fragments: &[&str]) -> String {
    let mut body = String::new();
    for fragment in fragments {
        let chunk = json!({
            "choices": [{ "index": 0, "delta": { "content": fragment }, "finish_reason": null }]
        });
        body.push_str(&format!("data: {chunk}\n\n"));
    }
    body.push_str("data: [DONE]\n\n");
    body
}

/// Mount a successful OpenAI chat-completions stream.
pub async fn mount_openai_stream(server: &MockServer, fragments: &[&str]) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(sse_response(openai_sse_body(fragments)))
        .mount(server)
        .await;
}

/// Mount an OpenAI endpoint that rejects the credential.
pub async fn mount_openai_auth_error(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "error": { "message": "Incorrect API key provided" } })),
        )
        .mount(server)
        .await;
}

/// Mount the OpenAI models listing used by credential verification.
pub async fn mount_openai_models(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "data": [] })))
        .mount(server)
        .await;
}

/// Anthropic-shaped SSE body: named events ending in `message_stop`.
pub fn anthropic_sse_body(fragments: &[&str]) -> String {
    let mut body = String::new();
    body.push_str("event: message_start\ndata: {\"type\":\"message_start\"}\n\n");
    for fragment in fragments {
        let delta = json!({
            "type": "content_block_delta",
            "index": 0,
            "delta": { "type": "text_delta", "text": fragment }
        });
        body.push_str(&format!("event: content_block_delta\ndata: {delta}\n\n"));
    }
    body.push_str("event: message_stop\ndata: {\"type\":\"message_stop\"}\n\n");
    body
}

/// Anthropic-shaped SSE body that fails with a named `error` event after the
/// given fragments.
pub fn anthropic_sse_error_body(fragments: &[&str], message: &str) -> String {
    let mut body = anthropic_sse_body(fragments);
    let stop = "event: message_stop\ndata: {\"type\":\"message_stop\"}\n\n";
    body.truncate(body.len() - stop.len());
    let error = json!({
        "type": "error",
        "error": { "type": "overloaded_error", "message": message }
    });
    body.push_str(&format!("event: error\ndata: {error}\n\n"));
    body
}

/// Mount an Anthropic messages stream with the given raw SSE body.
pub async fn mount_anthropic_stream(server: &MockServer, body: String) {
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(sse_response(body))
        .mount(server)
        .await;
}

/// Mount a non-streaming Anthropic messages response for credential checks.
pub async fn mount_anthropic_messages(server: &MockServer, status: u16) {
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({
            "content": [{ "type": "text", "text": "ok" }]
        })))
        .mount(server)
        .await;
}

/// Google-shaped SSE body: one `generateContent` chunk per fragment, no
/// sentinel (the stream just ends).
pub fn google_sse_body(fragments: &[&str]) -> String {
    let mut body = String::new();
    for fragment in fragments {
        let chunk = json!({
            "candidates": [{ "content": { "parts": [{ "text": fragment }] } }]
        });
        body.push_str(&format!("data: {chunk}\n\n"));
    }
    body
}

/// Mount a successful Google streaming generation for the given model.
pub async fn mount_google_stream(server: &MockServer, model: &str, fragments: &[&str]) {
    Mock::given(method("POST"))
        .and(path(format!("/v1beta/models/{model}:streamGenerateContent")))
        .and(query_param("alt", "sse"))
        .respond_with(sse_response(google_sse_body(fragments)))
        .mount(server)
        .await;
}

/// Mount the Google models listing used by credential verification.
pub async fn mount_google_models(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .and(path("/v1beta/models"))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({ "models": [] })))
        .mount(server)
        .await;
}
