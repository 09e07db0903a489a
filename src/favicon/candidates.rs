//! Pure candidate discovery for the icon cascade.
//!
//! Everything here is network-free: HTML scanning, candidate URL
//! resolution, and the content-type predicate. The HTTP side lives in the
//! resolver.

use scraper::{Html, Selector};
use url::Url;

/// Icon selectors in priority order. Open Graph images first (largest,
/// usually representative), then high-quality touch icons, then the
/// classic favicon link variants. Attribute matching is case-insensitive
/// and independent of attribute order in the markup.
const ICON_SELECTORS: &[(&str, &str)] = &[
    (r#"meta[property="og:image" i]"#, "content"),
    (r#"link[rel*="apple-touch-icon" i]"#, "href"),
    (r#"link[rel="icon" i]"#, "href"),
    (r#"link[rel="shortcut icon" i]"#, "href"),
];

/// Conventional icon paths probed under a page's origin when the HTML
/// itself yields nothing usable.
pub const WELL_KNOWN_PATHS: &[&str] = &[
    "/favicon.ico",
    "/favicon.png",
    "/apple-touch-icon.png",
    "/apple-touch-icon-precomposed.png",
    "/apple-touch-icon-120x120.png",
    "/apple-touch-icon-152x152.png",
    "/apple-touch-icon-180x180.png",
];

/// Normalize a page URL, prepending `https://` when no scheme is present.
/// Returns `None` when no hostname can be parsed out of it.
pub fn normalize_page_url(page_url: &str) -> Option<Url> {
    let with_scheme = if page_url.starts_with("http://") || page_url.starts_with("https://") {
        page_url.to_string()
    } else {
        format!("https://{page_url}")
    };
    let url = Url::parse(&with_scheme).ok()?;
    url.host_str()?;
    Some(url)
}

/// The `scheme://host` origin of a parsed page URL.
pub fn page_origin(url: &Url) -> String {
    format!("{}://{}", url.scheme(), url.host_str().unwrap_or_default())
}

/// Scan HTML for icon candidates, in selector priority order and document
/// order within each selector. Values are returned as written in the
/// markup; resolution against the page origin happens per candidate.
pub fn extract_icon_candidates(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut candidates = Vec::new();

    for &(selector, attribute) in ICON_SELECTORS {
        let selector = match Selector::parse(selector) {
            Ok(s) => s,
            Err(_) => continue,
        };
        for element in document.select(&selector) {
            if let Some(value) = element.value().attr(attribute) {
                let value = value.trim();
                if !value.is_empty() {
                    candidates.push(value.to_string());
                }
            }
        }
    }

    candidates
}

/// Resolve a candidate value against the page it was found on.
///
/// Handles scheme-relative (`//cdn...`), absolute-path (`/favicon.ico`),
/// and bare-relative (`img/icon.png`) forms. Returns `None` when the
/// resolved value still has no usable host.
pub fn resolve_candidate(page: &Url, candidate: &str) -> Option<Url> {
    let absolute = if candidate.starts_with("//") {
        format!("{}:{}", page.scheme(), candidate)
    } else if candidate.starts_with('/') {
        format!("{}{}", page_origin(page), candidate)
    } else if !candidate.starts_with("http://") && !candidate.starts_with("https://") {
        format!("{}/{}", page_origin(page), candidate)
    } else {
        candidate.to_string()
    };

    let url = Url::parse(&absolute).ok()?;
    url.host_str()?;
    Some(url)
}

/// Whether a declared content type indicates an image. An unspecified
/// binary stream passes too; plenty of servers label favicons that way.
pub fn is_image_content_type(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.contains("image/") || content_type.contains("application/octet-stream")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_prepends_https() {
        let bare = normalize_page_url("example.com/page").unwrap();
        let explicit = normalize_page_url("https://example.com/page").unwrap();
        assert_eq!(bare, explicit);
        assert_eq!(bare.scheme(), "https");
        assert_eq!(bare.host_str(), Some("example.com"));
    }

    #[test]
    fn test_normalize_keeps_http_scheme() {
        let url = normalize_page_url("http://example.com").unwrap();
        assert_eq!(url.scheme(), "http");
    }

    #[test]
    fn test_normalize_rejects_hostless_input() {
        assert!(normalize_page_url("https://").is_none());
        assert!(normalize_page_url(":::").is_none());
    }

    #[test]
    fn test_og_image_outranks_favicon_links() {
        let html = r#"
            <html><head>
                <link rel="icon" href="/favicon.ico">
                <meta property="og:image" content="https://cdn.example.com/og.png">
            </head></html>
        "#;
        let candidates = extract_icon_candidates(html);
        assert_eq!(candidates[0], "https://cdn.example.com/og.png");
        assert_eq!(candidates[1], "/favicon.ico");
    }

    #[test]
    fn test_attribute_order_in_markup_does_not_matter() {
        let html = r#"<meta content="/og.png" property="og:image">"#;
        assert_eq!(extract_icon_candidates(html), vec!["/og.png"]);
    }

    #[test]
    fn test_rel_matching_is_case_insensitive() {
        let html = r#"<link rel="Shortcut Icon" href="/old.ico">"#;
        assert_eq!(extract_icon_candidates(html), vec!["/old.ico"]);
    }

    #[test]
    fn test_apple_touch_icon_variants_match() {
        let html = r#"<link rel="apple-touch-icon-precomposed" href="/touch.png">"#;
        assert_eq!(extract_icon_candidates(html), vec!["/touch.png"]);
    }

    #[test]
    fn test_empty_and_whitespace_candidates_skipped() {
        let html = r#"<link rel="icon" href="   "><link rel="icon" href="/real.ico">"#;
        assert_eq!(extract_icon_candidates(html), vec!["/real.ico"]);
    }

    #[test]
    fn test_resolve_scheme_relative() {
        let page = normalize_page_url("https://example.com/a/b").unwrap();
        let resolved = resolve_candidate(&page, "//cdn.example.com/icon.png").unwrap();
        assert_eq!(resolved.as_str(), "https://cdn.example.com/icon.png");
    }

    #[test]
    fn test_resolve_absolute_path() {
        let page = normalize_page_url("https://example.com/a/b").unwrap();
        let resolved = resolve_candidate(&page, "/favicon.ico").unwrap();
        assert_eq!(resolved.as_str(), "https://example.com/favicon.ico");
    }

    #[test]
    fn test_resolve_bare_relative() {
        let page = normalize_page_url("https://example.com/a/b").unwrap();
        let resolved = resolve_candidate(&page, "img/icon.png").unwrap();
        assert_eq!(resolved.as_str(), "https://example.com/img/icon.png");
    }

    #[test]
    fn test_resolve_passes_through_absolute_url() {
        let page = normalize_page_url("https://example.com").unwrap();
        let resolved = resolve_candidate(&page, "http://other.example/i.png").unwrap();
        assert_eq!(resolved.as_str(), "http://other.example/i.png");
    }

    #[test]
    fn test_image_content_types() {
        assert!(is_image_content_type("image/png"));
        assert!(is_image_content_type("Image/X-Icon; charset=binary"));
        assert!(is_image_content_type("application/octet-stream"));
        assert!(!is_image_content_type("text/html"));
        assert!(!is_image_content_type(""));
    }
}
