//! Extraction of link rows from a legacy SQL dump.
//!
//! This is deliberately not a SQL parser. Exactly one ten-column
//! `INSERT INTO \`links\`` statement shape is understood, located by a
//! regex scan over the raw text, and only the first matching statement
//! block is considered. Rows that do not match the row pattern are
//! silently dropped; callers relying on a 1:1 row count must validate
//! externally.

use std::path::Path;

use regex::Regex;

use crate::models::LinkRecord;

/// Matches the single supported INSERT statement shape and captures its
/// value list up to the terminating semicolon.
const STATEMENT_PATTERN: &str = r"(?s)INSERT INTO `links` \(`id`, `url`, `name`, `description`, `tags`, `username`, `email`, `added_date`, `visibility`, `clicks`\) VALUES\s*([^;]+);";

/// Matches one parenthesized row: integer id, four quoted strings, two
/// NULL-or-quoted fields, quoted date, quoted visibility, trailing integer.
/// Quoted fields may contain SQL-escaped quotes (`''`).
const ROW_PATTERN: &str = r"\((\d+),\s*'((?:[^']|'')*)',\s*'((?:[^']|'')*)',\s*'((?:[^']|'')*)',\s*'((?:[^']|'')*)',\s*(NULL|'(?:[^']|'')*'),\s*(NULL|'(?:[^']|'')*'),\s*'((?:[^']|'')*)',\s*'((?:[^']|'')*)',\s*(\d+)\)";

/// Undo SQL quote escaping inside a quoted field.
fn unescape(field: &str) -> String {
    field.replace("''", "'")
}

/// A field that is either the literal `NULL` or a quoted string.
fn optional_field(field: &str) -> Option<String> {
    let field = field.trim();
    if field == "NULL" {
        return None;
    }
    let inner = field
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(field);
    Some(unescape(inner))
}

/// Split a comma-delimited tags field, trimming each tag.
///
/// An empty field yields a single empty-string tag. That quirk is load
/// bearing: downstream rows keep their original tag arity.
fn split_tags(field: &str) -> Vec<String> {
    field.split(',').map(|tag| tag.trim().to_string()).collect()
}

/// Extract link records from raw SQL text.
///
/// Returns an empty vector when no matching statement or rows are found;
/// the caller decides whether that is fatal.
pub fn extract(sql_text: &str) -> Vec<LinkRecord> {
    let statement = Regex::new(STATEMENT_PATTERN).unwrap();
    let row = Regex::new(ROW_PATTERN).unwrap();

    let values = match statement.captures(sql_text) {
        Some(captures) => captures.get(1).map(|m| m.as_str()).unwrap_or(""),
        None => {
            tracing::warn!("no matching INSERT statement found");
            return Vec::new();
        }
    };

    let records: Vec<LinkRecord> = row
        .captures_iter(values)
        .map(|captures| LinkRecord {
            original_id: captures[1].to_string(),
            url: unescape(&captures[2]),
            name: unescape(&captures[3]),
            description: unescape(&captures[4]),
            tags: split_tags(&captures[5]),
            username: optional_field(&captures[6]),
            email: optional_field(&captures[7]),
            added_date: unescape(&captures[8]),
            visibility: unescape(&captures[9]),
            clicks: captures[10].parse().unwrap_or(0),
        })
        .collect();

    tracing::info!(count = records.len(), "parsed link rows from SQL dump");
    records
}

/// Read a dump file and extract its link records.
///
/// An unreadable or missing file yields an empty vector, matching the
/// contract of [`extract`].
pub fn extract_file(path: &Path) -> Vec<LinkRecord> {
    match std::fs::read_to_string(path) {
        Ok(sql_text) => extract(&sql_text),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not read SQL file");
            Vec::new()
        }
    }
}
