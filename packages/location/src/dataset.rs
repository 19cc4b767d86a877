//! Dataset file loading.
//!
//! A dataset file is one of:
//! - a JSON array of entries
//! - a JSON object with a `records` array
//! - newline-delimited JSON, one entry per line
//!
//! Any other top-level JSON value (including a plain object without
//! `records`) is re-read as newline-delimited JSON, so a one-line object
//! file yields a single entry. Lines that fail to parse are skipped
//! individually.

use std::path::{Path, PathBuf};

use crate::LocationError;
use crate::normalize::RawEntry;

/// The entries parsed from one dataset file.
#[derive(Debug, Default)]
pub struct ParsedDataset {
    /// Key/value entries in file order.
    pub entries: Vec<RawEntry>,
    /// Values that parsed but were not key/value objects.
    pub rejected: u64,
    /// Newline-delimited lines that failed to parse.
    pub malformed_lines: u64,
}

/// Parses the contents of a dataset file.
///
/// # Errors
///
/// Returns [`LocationError::MalformedDataset`] if the text is not blank but
/// no supported format yields anything from it.
pub fn parse_dataset(raw: &str) -> Result<ParsedDataset, LocationError> {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Array(values)) => return Ok(collect_entries(values)),
        Ok(serde_json::Value::Object(mut object)) => {
            if let Some(serde_json::Value::Array(values)) = object.remove("records") {
                return Ok(collect_entries(values));
            }
        }
        _ => {}
    }

    parse_json_lines(raw)
}

/// Reads and parses one dataset file.
///
/// Invalid UTF-8 is replaced with `U+FFFD` rather than failing the file.
///
/// # Errors
///
/// Returns [`LocationError::Io`] if the file cannot be read, or
/// [`LocationError::MalformedDataset`] if it cannot be parsed as any
/// supported format.
pub fn read_dataset(path: &Path) -> Result<ParsedDataset, LocationError> {
    let bytes = std::fs::read(path)?;
    let raw = String::from_utf8_lossy(&bytes);
    parse_dataset(&raw).map_err(|e| match e {
        LocationError::MalformedDataset { message, .. } => LocationError::MalformedDataset {
            path: path.display().to_string(),
            message,
        },
        other => other,
    })
}

/// De-duplicates dataset paths by resolved location, preserving order.
///
/// Paths that exist are compared in canonical form; missing paths are
/// compared as given.
#[must_use]
pub fn dedup_paths(paths: impl IntoIterator<Item = PathBuf>) -> Vec<PathBuf> {
    let mut seen: Vec<PathBuf> = Vec::new();
    let mut out = Vec::new();

    for path in paths {
        if path.as_os_str().is_empty() {
            continue;
        }
        let resolved = std::fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
        if seen.contains(&resolved) {
            continue;
        }
        seen.push(resolved);
        out.push(path);
    }

    out
}

fn parse_json_lines(raw: &str) -> Result<ParsedDataset, LocationError> {
    let mut values = Vec::new();
    let mut malformed_lines = 0u64;

    for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match serde_json::from_str::<serde_json::Value>(line) {
            Ok(value) => values.push(value),
            Err(e) => {
                log::trace!("Skipping malformed dataset line: {e}");
                malformed_lines += 1;
            }
        }
    }

    if values.is_empty() && malformed_lines > 0 {
        return Err(LocationError::MalformedDataset {
            path: String::new(),
            message: format!("none of {malformed_lines} lines parsed as JSON"),
        });
    }

    let mut parsed = collect_entries(values);
    parsed.malformed_lines = malformed_lines;
    Ok(parsed)
}

fn collect_entries(values: Vec<serde_json::Value>) -> ParsedDataset {
    let mut parsed = ParsedDataset::default();
    for value in values {
        match value {
            serde_json::Value::Object(entry) => parsed.entries.push(entry),
            _ => parsed.rejected += 1,
        }
    }
    parsed
}
