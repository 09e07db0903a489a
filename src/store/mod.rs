//! Record store client for the remote `links` collection.
//!
//! The store is a PocketBase instance; creates go through its collection
//! records endpoint with bearer authentication. The trait seam exists so
//! the import loop can run against an in-memory store in tests.

mod http;

pub use http::HttpRecordStore;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::models::{LinkEcho, LinkPayload};

/// Collection name on the store side.
pub const LINKS_COLLECTION: &str = "links";

/// Transport-level failure: the request never produced an HTTP response.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        StoreError::Transport(e.to_string())
    }
}

/// Outcome of a create call that reached the store.
#[derive(Debug)]
pub enum CreateResponse {
    /// HTTP 200/201; carries the echoed record.
    Created(LinkEcho),
    /// Any other status; body kept verbatim for classification.
    Rejected { status: u16, body: Value },
}

/// Remote collection the import loop writes to.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Create one link record, authenticated as the bearer of `token`.
    async fn create_link(
        &self,
        payload: &LinkPayload,
        bearer_token: &str,
    ) -> Result<CreateResponse, StoreError>;

    /// Liveness probe, used after repeated per-record failures to decide
    /// whether the store is down or the records themselves are bad.
    async fn health_check(&self) -> bool;
}

/// Whether a rejection describes a uniqueness violation on any field.
///
/// The store words these several ways across versions, so matching is
/// deliberately permissive: the body text, or any field entry under
/// `data`, mentioning uniqueness.
pub fn is_unique_violation(status: u16, body: &Value) -> bool {
    if status != 400 {
        return false;
    }

    let text = body.to_string().to_lowercase();
    if text.contains("not unique") || text.contains("already exists") {
        return true;
    }

    body.get("data")
        .and_then(|data| data.as_object())
        .map(|fields| {
            fields
                .values()
                .any(|value| value.to_string().to_lowercase().contains("unique"))
        })
        .unwrap_or(false)
}
