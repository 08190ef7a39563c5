//! Append-only persistence sink seam.

use async_trait::async_trait;
use mux_storage::{NewResponse, ResponseStore};

/// Persistence failure. The owning provider's fan-out participation
/// degrades to an error event; siblings are unaffected.
#[derive(Debug, thiserror::Error)]
#[error("response sink error: {0}")]
pub struct SinkError(pub String);

/// Append-only writer of finalized response records.
///
/// Called at most once per provider per fan-out, concurrently across
/// providers and invocations.
#[async_trait]
pub trait ResponseSink: Send + Sync {
    /// Append one finalized record.
    async fn record(&self, response: NewResponse) -> Result<(), SinkError>;
}

#[async_trait]
impl ResponseSink for ResponseStore {
    async fn record(&self, response: NewResponse) -> Result<(), SinkError> {
        self.insert(response)
            .await
            .map(|_| ())
            .map_err(|e| SinkError(e.to_string()))
    }
}
