//! Favicon discovery cascade.
//!
//! Given a page URL, attempt in order: icon candidates scraped from the
//! page HTML, conventional icon paths under the origin, then a public
//! favicon-by-domain service. First success wins; every failure degrades
//! to the next strategy and the whole cascade degrades to an empty string.
//! Scraping arbitrary third-party sites is inherently unreliable, so the
//! cascade trades strict correctness for resolution rate, matching the
//! companion metadata-enrichment feature in the LinkSync web app.

mod candidates;

pub use candidates::{
    extract_icon_candidates, is_image_content_type, normalize_page_url, page_origin,
    resolve_candidate, WELL_KNOWN_PATHS,
};

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::config::Settings;

/// Browser user agent sent when fetching pages; some sites block obvious
/// bot user agents outright.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Favicon-by-domain fallback service.
pub const FALLBACK_SERVICE: &str = "https://www.google.com/s2/favicons";

/// Icon discovery for a page URL. Empty string means "no icon available",
/// never an error; nothing escapes this boundary.
#[async_trait]
pub trait IconResolver: Send + Sync {
    async fn resolve(&self, page_url: &str) -> String;
}

/// HTTP implementation of the cascade.
pub struct HttpIconResolver {
    /// Client for page fetches and candidate probes against scraped sites.
    /// TLS verification follows `Settings::accept_invalid_certs`.
    scrape_client: Client,
    /// Client for the fallback service, with normal certificate checking.
    service_client: Client,
    probe_timeout: Duration,
    fallback_base: String,
}

impl HttpIconResolver {
    pub fn new(settings: &Settings) -> Self {
        let scrape_client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(settings.page_timeout)
            .danger_accept_invalid_certs(settings.accept_invalid_certs)
            .gzip(true)
            .brotli(true)
            .build()
            .expect("Failed to create scraping HTTP client");

        let service_client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(settings.probe_timeout)
            .build()
            .expect("Failed to create probe HTTP client");

        Self {
            scrape_client,
            service_client,
            probe_timeout: settings.probe_timeout,
            fallback_base: FALLBACK_SERVICE.to_string(),
        }
    }

    /// Point the fallback stage at a different favicon service.
    pub fn with_fallback_service(mut self, base: &str) -> Self {
        self.fallback_base = base.trim_end_matches('/').to_string();
        self
    }

    /// HEAD-probe a candidate: success status plus an image-like content
    /// type. Shorter timeout than the page fetch.
    async fn probe_icon(&self, icon: &Url) -> bool {
        let response = match self
            .scrape_client
            .head(icon.as_str())
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(icon = %icon, error = %e, "icon probe failed");
                return false;
            }
        };

        if !response.status().is_success() {
            return false;
        }

        let image_like = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(is_image_content_type)
            .unwrap_or(false);
        if !image_like {
            tracing::debug!(icon = %icon, "candidate returned non-image content type");
        }
        image_like
    }

    /// Stage 1: fetch the page and probe candidates found in its HTML.
    async fn scan_page(&self, page: &Url) -> Option<String> {
        let response = match self.scrape_client.get(page.as_str()).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(page = %page, error = %e, "page fetch failed");
                return None;
            }
        };
        if !response.status().is_success() {
            tracing::debug!(page = %page, status = %response.status(), "non-success page response");
            return None;
        }
        let html = response.text().await.ok()?;

        for candidate in extract_icon_candidates(&html) {
            let Some(icon) = resolve_candidate(page, &candidate) else {
                continue;
            };
            if self.probe_icon(&icon).await {
                return Some(icon.into());
            }
        }
        None
    }

    /// Stage 2: probe conventional icon paths under the origin.
    async fn probe_well_known(&self, page: &Url) -> Option<String> {
        let origin = page_origin(page);
        for path in WELL_KNOWN_PATHS {
            let candidate = format!("{origin}{path}");
            if let Ok(icon) = Url::parse(&candidate) {
                if self.probe_icon(&icon).await {
                    return Some(candidate);
                }
            }
        }
        None
    }

    /// Stage 3: the favicon-by-domain service. Reachability alone is
    /// accepted; the service answers with its own blank image when it has
    /// nothing for the domain, so its response is authoritative either way.
    async fn fallback_service(&self, host: &str) -> Option<String> {
        let service = format!(
            "{}?domain={}&sz=64",
            self.fallback_base,
            urlencoding::encode(host)
        );
        match self.service_client.head(&service).send().await {
            Ok(response) if response.status().is_success() => Some(service),
            Ok(response) => {
                tracing::debug!(status = %response.status(), "fallback favicon service refused");
                None
            }
            Err(e) => {
                tracing::debug!(error = %e, "fallback favicon service unreachable");
                None
            }
        }
    }
}

#[async_trait]
impl IconResolver for HttpIconResolver {
    async fn resolve(&self, page_url: &str) -> String {
        let Some(page) = normalize_page_url(page_url) else {
            tracing::debug!(url = page_url, "could not parse page host");
            return String::new();
        };

        if let Some(icon) = self.scan_page(&page).await {
            tracing::info!(page = %page, icon = %icon, "favicon found in page HTML");
            return icon;
        }
        if let Some(icon) = self.probe_well_known(&page).await {
            tracing::info!(page = %page, icon = %icon, "favicon found at well-known path");
            return icon;
        }
        if let Some(host) = page.host_str() {
            if let Some(icon) = self.fallback_service(host).await {
                tracing::info!(page = %page, icon = %icon, "using fallback favicon service");
                return icon;
            }
        }

        tracing::info!(page = %page, "no favicon found");
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_resolver() -> HttpIconResolver {
        // Both the page host and the fallback service point at a closed
        // local port, so every stage fails fast without leaving the machine.
        let settings = Settings {
            page_timeout: Duration::from_secs(2),
            probe_timeout: Duration::from_secs(2),
            ..Settings::default()
        };
        HttpIconResolver::new(&settings).with_fallback_service("http://127.0.0.1:9")
    }

    #[tokio::test]
    async fn test_unparseable_host_resolves_to_empty() {
        let resolver = offline_resolver();
        assert_eq!(resolver.resolve("https://").await, "");
    }

    #[tokio::test]
    async fn test_unreachable_host_degrades_to_empty() {
        let resolver = offline_resolver();
        assert_eq!(resolver.resolve("http://127.0.0.1:9").await, "");
    }
}
