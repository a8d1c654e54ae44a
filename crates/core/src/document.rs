//! Hand-authored and AI-extracted show documents.
//!
//! Documents arrive base64-encoded. The decoded text is either raw JSON (a
//! record object or an array of records) or Markdown carrying the JSON in a
//! fenced ```` ```json ```` block.

use std::sync::LazyLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;

use crate::error::CoreError;
use crate::raw_event::{parse_records, RawEventRecord};

/// Upper bound on decoded document size.
pub const MAX_DOCUMENT_BYTES: usize = 1024 * 1024;

static FENCED_JSON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json|JSON)?[ \t]*\r?\n(.*?)```").expect("valid regex"));

/// Decode base64 content into UTF-8 text.
pub fn decode_content(encoded: &str) -> Result<String, CoreError> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(CoreError::Validation("Document content is empty".to_string()));
    }
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| CoreError::Validation(format!("Document content is not valid base64: {e}")))?;
    if bytes.len() > MAX_DOCUMENT_BYTES {
        return Err(CoreError::Validation(format!(
            "Document exceeds {MAX_DOCUMENT_BYTES} bytes"
        )));
    }
    String::from_utf8(bytes)
        .map_err(|_| CoreError::Validation("Document content is not UTF-8 text".to_string()))
}

/// Locate the JSON payload inside decoded document text.
pub fn extract_embedded_json(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return Some(trimmed);
    }
    FENCED_JSON_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|body| !body.is_empty())
}

/// Decode and parse a base64 document into raw records.
pub fn parse_document(encoded: &str) -> Result<Vec<RawEventRecord>, CoreError> {
    let text = decode_content(encoded)?;
    let json = extract_embedded_json(&text).ok_or_else(|| {
        CoreError::Validation("Document does not contain a JSON show record".to_string())
    })?;
    parse_records(json)
}
