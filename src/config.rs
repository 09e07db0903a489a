//! Runtime settings for the import pipeline.

use std::time::Duration;

/// Default record store base URL (local PocketBase instance).
pub const DEFAULT_BASE_URL: &str = "http://localhost:8090";

/// Settings shared by the HTTP clients and the import loop.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Record store base URL, without a trailing slash.
    pub base_url: String,
    /// Timeout for full page fetches during favicon discovery.
    pub page_timeout: Duration,
    /// Timeout for HEAD probes and the health check.
    pub probe_timeout: Duration,
    /// Pause between records so favicon probes and the store get breathing room.
    pub record_delay: Duration,
    /// Accept invalid TLS certificates when scraping third-party pages.
    ///
    /// Enabled by default: favicon discovery runs against arbitrary sites
    /// with self-signed or misconfigured certificates, and a failed fetch
    /// only loses an icon. The upsert path never uses this client.
    pub accept_invalid_certs: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_timeout: Duration::from_secs(10),
            probe_timeout: Duration::from_secs(5),
            record_delay: Duration::from_millis(200),
            accept_invalid_certs: true,
        }
    }
}

impl Settings {
    /// Override the record store base URL, normalizing the trailing slash.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}
