//! Link models for import and upsert.
//!
//! `LinkRecord` is the shape extracted from the legacy SQL dump;
//! `LinkPayload` is the JSON body the record store expects. The two differ
//! deliberately: the dump's `username`/`email` columns are informational
//! only, and ownership is attributed to the authenticated user instead.

use serde::{Deserialize, Serialize};

/// One bookmark row extracted from the legacy SQL dump.
///
/// Constructed once by the extractor, immutable afterward, consumed exactly
/// once by the import loop. Never persisted locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    /// Source row id. Not reused as the destination identifier.
    pub original_id: String,
    pub url: String,
    pub name: String,
    pub description: String,
    /// Comma-split tags, each trimmed, order preserved, no de-duplication.
    pub tags: Vec<String>,
    /// Dump-side owner, `None` for a SQL NULL. Not sent to the store.
    pub username: Option<String>,
    /// Dump-side email, `None` for a SQL NULL. Not sent to the store.
    pub email: Option<String>,
    /// Opaque date string, passed through unmodified.
    pub added_date: String,
    /// Opaque visibility string; the store is the source of truth for
    /// allowed values.
    pub visibility: String,
    pub clicks: u64,
}

/// JSON body sent when creating a record in the `links` collection.
#[derive(Debug, Clone, Serialize)]
pub struct LinkPayload {
    pub url: String,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub visibility: String,
    /// Owning user id from the authentication context.
    pub user: String,
    /// Discovered icon URL, empty string when none was found.
    pub favicon: String,
    pub clicks: u64,
}

impl LinkPayload {
    /// Build the store payload for a record, attributing ownership to the
    /// authenticated user.
    pub fn from_record(record: &LinkRecord, owner_user_id: &str, favicon: String) -> Self {
        Self {
            url: record.url.clone(),
            name: record.name.clone(),
            description: record.description.clone(),
            tags: record.tags.clone(),
            visibility: record.visibility.clone(),
            user: owner_user_id.to_string(),
            favicon,
            clicks: record.clicks,
        }
    }
}

/// Echo of a persisted link, as returned by a successful create call.
///
/// Only the fields the pipeline inspects are modeled; the store may reject
/// or silently drop the favicon, so the echoed value is what decides
/// whether an icon was actually attached.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LinkEcho {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub favicon: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> LinkRecord {
        LinkRecord {
            original_id: "42".to_string(),
            url: "https://example.com".to_string(),
            name: "Example".to_string(),
            description: "An example".to_string(),
            tags: vec!["a".to_string(), "b".to_string()],
            username: Some("legacy-user".to_string()),
            email: None,
            added_date: "2020-01-01 00:00:00".to_string(),
            visibility: "public".to_string(),
            clicks: 7,
        }
    }

    #[test]
    fn test_payload_attributes_ownership_to_auth_user() {
        let payload = LinkPayload::from_record(&sample_record(), "usr_123", String::new());
        assert_eq!(payload.user, "usr_123");
        assert_eq!(payload.favicon, "");
        assert_eq!(payload.clicks, 7);
    }

    #[test]
    fn test_payload_serializes_store_fields_only() {
        let payload = LinkPayload::from_record(
            &sample_record(),
            "usr_123",
            "https://example.com/favicon.ico".to_string(),
        );
        let json = serde_json::to_value(&payload).unwrap();
        let object = json.as_object().unwrap();
        // The dump-side username/email never reach the store.
        assert!(!object.contains_key("username"));
        assert!(!object.contains_key("email"));
        assert!(!object.contains_key("added_date"));
        assert_eq!(json["favicon"], "https://example.com/favicon.ico");
        assert_eq!(json["tags"], serde_json::json!(["a", "b"]));
    }

    #[test]
    fn test_echo_tolerates_missing_fields() {
        let echo: LinkEcho = serde_json::from_str("{}").unwrap();
        assert_eq!(echo.favicon, "");
    }
}
