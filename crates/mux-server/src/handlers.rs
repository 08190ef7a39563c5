//! HTTP request handlers.

use axum::extract::{Path, Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use chrono::{DateTime, Utc};
use futures::stream::{Stream, StreamExt};
use mux_core::{PromptId, ProviderName, StreamEvent};
use mux_fanout::FanoutRequest;
use mux_storage::{PromptRecord, ResponseRecord};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::convert::Infallible;
use tracing::{debug, info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::extractors::JsonBody;
use crate::state::AppState;

/// Characters of prompt text shown in history listings.
const HISTORY_PREVIEW_CHARS: usize = 100;

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

/// Health check response body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Crate version.
    pub version: &'static str,
}

/// Liveness endpoint.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ---------------------------------------------------------------------------
// Prompt submission (SSE fan-out)
// ---------------------------------------------------------------------------

/// Prompt submission body. Unknown provider names fail deserialization
/// before validation runs.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePromptRequest {
    /// The prompt text sent to every selected provider.
    #[validate(length(min = 1, message = "Prompt text is required"))]
    pub prompt: String,
    /// Selected providers.
    #[validate(length(min = 1, message = "At least one provider must be selected"))]
    pub providers: Vec<ProviderName>,
}

/// Submit a prompt and stream the multi-provider fan-out back as SSE.
///
/// The prompt row is persisted before streaming starts; the SSE connection
/// closes after the `complete` event (or a fatal `error`).
#[instrument(skip_all, fields(user_id = %user_id))]
pub async fn create_prompt(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    JsonBody(body): JsonBody<CreatePromptRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    body.validate()
        .map_err(|e| ApiError::bad_request(first_validation_message(&e)))?;
    if body.prompt.trim().is_empty() {
        return Err(ApiError::bad_request("Prompt text is required"));
    }

    let record = state.prompts.insert(user_id, &body.prompt).await?;
    info!(
        prompt_id = %record.id,
        providers = body.providers.len(),
        "Prompt accepted"
    );

    let events = state.fanout.run(FanoutRequest {
        user_id,
        prompt_id: record.id.into(),
        prompt_text: body.prompt,
        providers: body.providers,
    });

    Ok(Sse::new(events.map(|event| Ok(to_sse(&event)))).keep_alive(KeepAlive::default()))
}

/// One stream event as one SSE message: error events under the `error`
/// event name, everything else under `message`.
fn to_sse(event: &StreamEvent) -> Event {
    let name = if event.is_error() { "error" } else { "message" };
    Event::default()
        .event(name)
        .data(serde_json::to_string(event).unwrap_or_default())
}

fn first_validation_message(errors: &validator::ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|field| field.iter())
        .find_map(|error| error.message.as_ref().map(ToString::to_string))
        .unwrap_or_else(|| "Invalid request".to_string())
}

// ---------------------------------------------------------------------------
// Prompt history
// ---------------------------------------------------------------------------

/// History pagination parameters.
#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    /// 1-based page number.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Page size.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

/// One prompt in a history listing, text truncated for display.
#[derive(Debug, Serialize)]
pub struct PromptSummary {
    /// Prompt id.
    pub id: Uuid,
    /// Truncated prompt text.
    pub prompt_text: String,
    /// Submission time.
    pub created_at: DateTime<Utc>,
}

/// One page of prompt history.
#[derive(Debug, Serialize)]
pub struct PromptListResponse {
    /// Prompts on this page, newest first.
    pub prompts: Vec<PromptSummary>,
    /// Total number of the user's prompts.
    pub total: i64,
    /// Echoed page number.
    pub page: i64,
    /// Echoed page size.
    pub limit: i64,
}

/// Paginated prompt history for the caller, newest first.
#[instrument(skip_all, fields(user_id = %user_id))]
pub async fn list_prompts(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Query(params): Query<HistoryParams>,
) -> Result<Json<PromptListResponse>, ApiError> {
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, 100);

    let result = state.prompts.list(user_id, page, limit).await?;

    Ok(Json(PromptListResponse {
        prompts: result.prompts.into_iter().map(summarize).collect(),
        total: result.total,
        page,
        limit,
    }))
}

fn summarize(record: PromptRecord) -> PromptSummary {
    PromptSummary {
        id: record.id,
        prompt_text: truncate_for_display(&record.prompt_text),
        created_at: record.created_at,
    }
}

fn truncate_for_display(text: &str) -> String {
    if text.chars().count() <= HISTORY_PREVIEW_CHARS {
        return text.to_string();
    }
    let truncated: String = text.chars().take(HISTORY_PREVIEW_CHARS).collect();
    format!("{truncated}...")
}

// ---------------------------------------------------------------------------
// Prompt detail
// ---------------------------------------------------------------------------

/// One persisted provider outcome in a prompt detail view.
#[derive(Debug, Serialize)]
pub struct ResponseView {
    /// Record id.
    pub id: Uuid,
    /// Provider name.
    pub provider: String,
    /// Model the adapter used.
    pub model_used: Option<String>,
    /// Full (or partial, on failure) response text.
    pub response_text: Option<String>,
    /// Elapsed milliseconds.
    pub response_time_ms: Option<i32>,
    /// Failure message, absent on success.
    pub error_message: Option<String>,
    /// Record creation time.
    pub created_at: DateTime<Utc>,
}

impl From<ResponseRecord> for ResponseView {
    fn from(record: ResponseRecord) -> Self {
        Self {
            id: record.id,
            provider: record.provider,
            model_used: record.model_used,
            response_text: record.response_text,
            response_time_ms: record.response_time_ms,
            error_message: record.error_message,
            created_at: record.created_at,
        }
    }
}

/// One prompt with all of its persisted responses.
#[derive(Debug, Serialize)]
pub struct PromptDetailResponse {
    /// Prompt id.
    pub id: Uuid,
    /// Full prompt text.
    pub prompt_text: String,
    /// Submission time.
    pub created_at: DateTime<Utc>,
    /// Persisted per-provider outcomes, oldest first.
    pub responses: Vec<ResponseView>,
}

/// Fetch one prompt with its responses. 404 for prompts the caller does not
/// own.
#[instrument(skip_all, fields(user_id = %user_id))]
pub async fn get_prompt(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(prompt_id): Path<Uuid>,
) -> Result<Json<PromptDetailResponse>, ApiError> {
    let prompt_id = PromptId::from(prompt_id);

    let record = state
        .prompts
        .get(user_id, prompt_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Prompt not found"))?;

    let responses = state.responses.list_for_prompt(prompt_id).await?;

    Ok(Json(PromptDetailResponse {
        id: record.id,
        prompt_text: record.prompt_text,
        created_at: record.created_at,
        responses: responses.into_iter().map(ResponseView::from).collect(),
    }))
}

// ---------------------------------------------------------------------------
// Credential management
// ---------------------------------------------------------------------------

/// Per-provider credential status, key masked to its last 4 characters.
#[derive(Debug, Serialize)]
pub struct KeyStatus {
    /// Provider name.
    pub provider: ProviderName,
    /// `"****" + last 4 chars`, or empty when no key is stored.
    pub masked_key: String,
    /// Whether a key is stored.
    pub has_key: bool,
    /// When the key was stored, if one is.
    pub created_at: Option<DateTime<Utc>>,
}

/// Credential status for every supported provider.
#[instrument(skip_all, fields(user_id = %user_id))]
pub async fn list_keys(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
) -> Result<Json<Vec<KeyStatus>>, ApiError> {
    let records = state.keys.list(user_id).await?;

    let statuses = ProviderName::ALL
        .into_iter()
        .map(|provider| {
            let record = records
                .iter()
                .find(|record| record.provider == provider.as_str());
            match record {
                Some(record) => KeyStatus {
                    provider,
                    masked_key: state
                        .encryption
                        .decrypt_string(&record.encrypted_key)
                        .map_or_else(|_| "****".to_string(), |plain| mask_key(&plain)),
                    has_key: true,
                    created_at: Some(record.created_at),
                },
                None => KeyStatus {
                    provider,
                    masked_key: String::new(),
                    has_key: false,
                    created_at: None,
                },
            }
        })
        .collect();

    Ok(Json(statuses))
}

fn mask_key(plaintext: &str) -> String {
    let chars: Vec<char> = plaintext.chars().collect();
    if chars.len() < 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{tail}")
}

/// Credential upsert body.
#[derive(Debug, Deserialize)]
pub struct SaveKeyRequest {
    /// Target provider.
    pub provider: ProviderName,
    /// Plaintext API key; encrypted before storage.
    pub api_key: String,
}

/// Simple `{"message": ...}` acknowledgement body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Human-readable outcome.
    pub message: String,
}

/// Store (or replace) the caller's API key for a provider.
#[instrument(skip_all, fields(user_id = %user_id))]
pub async fn save_key(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    JsonBody(body): JsonBody<SaveKeyRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let api_key = body.api_key.trim();
    if api_key.is_empty() {
        return Err(ApiError::bad_request("API key cannot be empty"));
    }

    let encrypted = state
        .encryption
        .encrypt_string(api_key)
        .map_err(|_| ApiError::internal("Failed to encrypt API key"))?;
    let key_hash = short_hash(api_key);

    state
        .keys
        .upsert(user_id, body.provider, &encrypted, &key_hash)
        .await?;

    Ok(Json(MessageResponse {
        message: format!("API key for {} saved successfully", body.provider),
    }))
}

/// First 16 hex chars of SHA-256, stored for change detection.
fn short_hash(plaintext: &str) -> String {
    let digest = Sha256::digest(plaintext.as_bytes());
    hex::encode(digest)[..16].to_string()
}

/// Delete the caller's API key for a provider. 404 when none is stored.
#[instrument(skip_all, fields(user_id = %user_id))]
pub async fn delete_key(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(provider): Path<ProviderName>,
) -> Result<Json<MessageResponse>, ApiError> {
    let deleted = state.keys.delete(user_id, provider).await?;
    if !deleted {
        return Err(ApiError::not_found(format!(
            "No API key found for provider {provider}"
        )));
    }

    Ok(Json(MessageResponse {
        message: format!("API key for {provider} deleted successfully"),
    }))
}

/// Key-test outcome body.
#[derive(Debug, Serialize)]
pub struct KeyTestResponse {
    /// Whether the upstream accepted the key.
    pub valid: bool,
    /// Human-readable outcome.
    pub message: String,
}

/// Verify the stored key against the live provider API.
#[instrument(skip_all, fields(user_id = %user_id))]
pub async fn test_key(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    Path(provider): Path<ProviderName>,
) -> Result<Json<KeyTestResponse>, ApiError> {
    let record = state
        .keys
        .get(user_id, provider)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No API key found for provider {provider}")))?;

    let plaintext = state
        .encryption
        .decrypt_string(&record.encrypted_key)
        .map_err(|_| ApiError::internal("Failed to decrypt API key"))?;

    let adapter = state
        .registry
        .get(provider)
        .ok_or_else(|| ApiError::internal(format!("No adapter registered for {provider}")))?;

    debug!(provider = %provider, "Testing stored API key");
    let valid = adapter
        .verify_credential(&SecretString::new(plaintext))
        .await;

    let message = if valid {
        format!("API key for {provider} is valid")
    } else {
        format!("API key for {provider} is invalid")
    };

    Ok(Json(KeyTestResponse { valid, message }))
}
