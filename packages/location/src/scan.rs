//! Slow-scan fallback for postal codes missing from the index.
//!
//! The eager build does not keep the parsed entries around, so a miss is
//! answered by re-reading the dataset files from disk and picking out the
//! entries for one postal code. Scanning stops at the first file that has
//! any match.

use std::path::{Path, PathBuf};

use krishi_mitra_location_models::{FallbackRecord, FieldMapping};

use crate::dataset::read_dataset;
use crate::normalize::{extract_postal_code, normalize_entry};

/// Records found for a postal code by a slow scan.
#[derive(Debug, Default)]
pub struct ScanHits {
    /// The file the records came from.
    pub file: Option<PathBuf>,
    /// Normalized matching records, in file order.
    pub records: Vec<FallbackRecord>,
}

/// Scans `files` in order for entries whose postal code normalizes to
/// `target`.
///
/// Files that are missing or cannot be read or parsed contribute nothing.
/// Returns the matches of the first file that has any.
#[must_use]
pub fn scan_for_postal_code(files: &[PathBuf], target: &str, fields: &FieldMapping) -> ScanHits {
    for file in files {
        let records = scan_file(file, target, fields);
        if !records.is_empty() {
            return ScanHits {
                file: Some(file.clone()),
                records,
            };
        }
    }
    ScanHits::default()
}

fn scan_file(file: &Path, target: &str, fields: &FieldMapping) -> Vec<FallbackRecord> {
    if !file.exists() {
        return Vec::new();
    }

    let parsed = match read_dataset(file) {
        Ok(parsed) => parsed,
        Err(e) => {
            log::warn!("Slow scan skipped {}: {e}", file.display());
            return Vec::new();
        }
    };

    parsed
        .entries
        .iter()
        .filter(|entry| extract_postal_code(entry, fields).as_deref() == Some(target))
        .map(|entry| normalize_entry(entry, fields))
        .collect()
}
