//! Recipient-file parsing.
//!
//! Three interchangeable layouts are accepted:
//! - JSON object: `{"recipients": ["a@x.com", "b@y.com"]}`
//! - JSON array: `["a@x.com", "b@y.com"]`
//! - Plain text: one address per line, blank lines ignored.
//!
//! Content whose first non-whitespace byte looks like JSON must parse as
//! JSON; it is not re-read as plain text on failure.

use std::path::Path;

use serde_json::Value;

use crate::errors::{MailError, MailResult};

/// Reads and parses a recipient file into raw address strings.
///
/// Address validation is the caller's job; this only deals with layout.
pub fn load(path: &Path) -> MailResult<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        MailError::recipient_file(format!("{}: {}", path.display(), e)).with_cause(e)
    })?;

    parse(&content)
        .map_err(|e| MailError::recipient_file(format!("{}: {}", path.display(), e.message())))
}

/// Parses recipient-file content into raw address strings.
pub fn parse(content: &str) -> MailResult<Vec<String>> {
    let trimmed = content.trim_start();
    let addresses = if trimmed.starts_with('{') || trimmed.starts_with('[') {
        from_json(content)?
    } else {
        from_lines(content)
    };

    if addresses.is_empty() {
        return Err(MailError::recipient_file("no addresses found"));
    }
    Ok(addresses)
}

fn from_json(content: &str) -> MailResult<Vec<String>> {
    let value: Value = serde_json::from_str(content)
        .map_err(|e| MailError::recipient_file(format!("invalid JSON: {}", e)).with_cause(e))?;

    let entries = match &value {
        Value::Object(map) => map
            .get("recipients")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                MailError::recipient_file("JSON object has no \"recipients\" array")
            })?,
        Value::Array(entries) => entries,
        _ => {
            return Err(MailError::recipient_file(
                "JSON must be an object with a \"recipients\" array or a bare array",
            ))
        }
    };

    entries
        .iter()
        .map(|entry| {
            entry
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| MailError::recipient_file("recipient entries must be strings"))
        })
        .collect()
}

fn from_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
