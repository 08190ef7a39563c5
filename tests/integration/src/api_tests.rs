//! Router surface tests.
//!
//! These use a lazily-connected pool: only routes that reject before any
//! query runs are exercised here. Database-backed flows are covered by the
//! store and fan-out tests.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use mux_core::UserId;
use mux_providers::ProviderRegistry;
use mux_server::{create_router, issue_token, AppState, Config};
use secrecy::SecretString;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::time::Duration;
use tower::ServiceExt;

fn test_state() -> AppState {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/promptmux_test")
        .unwrap();
    let config = Config {
        bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        database_url: String::new(),
        db_max_connections: 1,
        jwt_secret: SecretString::new("integration-secret".to_string()),
        encryption_key: SecretString::new("integration-passphrase".to_string()),
        cors_origins: vec![],
    };
    AppState::new(pool, &config, ProviderRegistry::with_defaults().unwrap())
}

fn bearer(state: &AppState) -> String {
    let token = issue_token(&state.jwt, UserId::generate(), Duration::from_secs(60)).unwrap();
    format!("Bearer {token}")
}

#[tokio::test]
async fn health_reports_status_and_version() {
    let app = create_router(test_state(), &[]);
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let app = create_router(test_state(), &[]);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/unknown")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn every_api_route_rejects_anonymous_requests() {
    for (method, uri) in [
        ("POST", "/api/prompts"),
        ("GET", "/api/prompts"),
        ("GET", "/api/keys"),
        ("POST", "/api/keys"),
        ("DELETE", "/api/keys/openai"),
        ("POST", "/api/keys/openai/test"),
    ] {
        let app = create_router(test_state(), &[]);
        let response = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "{method} {uri} should require auth"
        );
    }
}

#[tokio::test]
async fn malformed_prompt_id_is_a_client_error() {
    let state = test_state();
    let auth = bearer(&state);
    let app = create_router(state, &[]);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/prompts/not-a-uuid")
                .header("authorization", auth)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_provider_in_path_is_a_client_error() {
    let state = test_state();
    let auth = bearer(&state);
    let app = create_router(state, &[]);
    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/keys/mistral")
                .header("authorization", auth)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
