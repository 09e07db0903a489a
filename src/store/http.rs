//! reqwest-backed record store client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::{CreateResponse, RecordStore, StoreError, LINKS_COLLECTION};
use crate::config::Settings;
use crate::models::{LinkEcho, LinkPayload};

/// HTTP client for a PocketBase record store.
///
/// Unlike the favicon clients this one always verifies TLS; it talks to
/// our own backend, not to arbitrary scraped sites.
pub struct HttpRecordStore {
    client: Client,
    base_url: String,
    health_timeout: Duration,
}

impl HttpRecordStore {
    pub fn new(settings: &Settings) -> Self {
        let client = Client::builder()
            .gzip(true)
            .brotli(true)
            .build()
            .expect("Failed to create store HTTP client");

        Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            health_timeout: settings.probe_timeout,
        }
    }

    fn records_url(&self) -> String {
        format!(
            "{}/api/collections/{}/records",
            self.base_url, LINKS_COLLECTION
        )
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn create_link(
        &self,
        payload: &LinkPayload,
        bearer_token: &str,
    ) -> Result<CreateResponse, StoreError> {
        let response = self
            .client
            .post(self.records_url())
            .bearer_auth(bearer_token)
            .json(payload)
            .send()
            .await?;

        let status = response.status().as_u16();
        if status == 200 || status == 201 {
            // An unparseable echo is treated as "favicon not persisted"
            // rather than a record failure.
            let echo = response.json::<LinkEcho>().await.unwrap_or_default();
            tracing::debug!(url = %payload.url, id = %echo.id, "link created");
            Ok(CreateResponse::Created(echo))
        } else {
            let body = response.json::<Value>().await.unwrap_or(Value::Null);
            tracing::debug!(url = %payload.url, status, "link create rejected");
            Ok(CreateResponse::Rejected { status, body })
        }
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/api/health", self.base_url);
        match self
            .client
            .get(&url)
            .timeout(self.health_timeout)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::warn!(error = %e, "health probe failed");
                false
            }
        }
    }
}
