//! Route definitions.

use axum::http::{header, HeaderValue};
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::handlers;
use crate::state::AppState;

/// Build the full API router. Cross-origin access is limited to
/// `cors_origins`; a literal `*` entry opens it to any origin.
pub fn create_router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/api/prompts",
            post(handlers::create_prompt).get(handlers::list_prompts),
        )
        .route("/api/prompts/:prompt_id", get(handlers::get_prompt))
        .route(
            "/api/keys",
            get(handlers::list_keys).post(handlers::save_key),
        )
        .route("/api/keys/:provider", delete(handlers::delete_key))
        .route("/api/keys/:provider/test", post(handlers::test_key))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods(Any)
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring malformed CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}
