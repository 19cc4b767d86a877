#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared types for the offline location fallback resolver.
//!
//! This crate contains only data types, configuration structs, and simple
//! conversions. It performs no I/O and carries no indexing logic.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A canonical location record extracted from one raw dataset entry.
///
/// Text fields keep the case they had in the dataset (trimmed). Index
/// keys are upper-cased separately, so `"Kannur"` stays `"Kannur"` here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackRecord {
    /// Six-digit postal code, present only if it normalized successfully.
    pub postal_code: Option<String>,
    /// State name as it appeared in the dataset.
    pub state: Option<String>,
    /// City or district name.
    pub city: Option<String>,
    /// Assembly constituency name.
    pub constituency: Option<String>,
    /// Gram panchayat name.
    pub gram_panchayat: Option<String>,
    /// Post office name, passed through untouched.
    pub office_name: Option<serde_json::Value>,
    /// Sub-district / taluk, passed through untouched.
    pub sub_district: Option<serde_json::Value>,
    /// Latitude, passed through untouched (datasets mix numbers and strings).
    pub latitude: Option<serde_json::Value>,
    /// Longitude, passed through untouched.
    pub longitude: Option<serde_json::Value>,
}

impl FallbackRecord {
    /// Upper-cased state, used as the state index key.
    #[must_use]
    pub fn state_key(&self) -> Option<String> {
        self.state.as_deref().map(str::to_uppercase)
    }

    /// Upper-cased city, used in the constituency composite key.
    #[must_use]
    pub fn city_key(&self) -> Option<String> {
        self.city.as_deref().map(str::to_uppercase)
    }
}

/// Ordered raw key names accepted for each logical record field.
///
/// The first key present with a non-null value wins. Deserialized from the
/// embedded `fields.toml` table, or from a caller-supplied table when a new
/// dataset vendor uses different column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Postal code keys.
    pub postal_code: Vec<String>,
    /// State keys.
    pub state: Vec<String>,
    /// City / district keys.
    pub city: Vec<String>,
    /// Constituency keys.
    pub constituency: Vec<String>,
    /// Gram panchayat keys.
    #[serde(default)]
    pub gram_panchayat: Vec<String>,
    /// Post office name keys.
    #[serde(default)]
    pub office_name: Vec<String>,
    /// Sub-district / taluk keys.
    #[serde(default)]
    pub sub_district: Vec<String>,
    /// Latitude keys.
    #[serde(default)]
    pub latitude: Vec<String>,
    /// Longitude keys.
    #[serde(default)]
    pub longitude: Vec<String>,
}

/// Configuration for the offline location fallback.
///
/// Read once at process start. Both dataset paths are tried; the resolver
/// merges whatever they contain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationFallbackConfig {
    /// Bundled dataset path relative to the project root.
    #[serde(default)]
    pub default_file: Option<PathBuf>,
    /// Operator-supplied dataset path.
    #[serde(default)]
    pub override_file: Option<PathBuf>,
    /// Recognized state names. Empty means no restriction.
    #[serde(default)]
    pub allowed_states: Vec<String>,
    /// Maximum entries per file indexed during the eager build. Entries
    /// past the limit are only reachable through a slow scan.
    #[serde(default)]
    pub eager_record_limit: Option<usize>,
}

impl LocationFallbackConfig {
    /// Returns the allow-list upper-cased with blanks removed.
    #[must_use]
    pub fn allowed_state_keys(&self) -> BTreeSet<String> {
        self.allowed_states
            .iter()
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Parses a comma-separated state allow-list (e.g. `"KERALA, punjab"`).
///
/// Entries are trimmed and upper-cased; empty entries are dropped.
#[must_use]
pub fn parse_state_list(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for state in raw.split(',').map(|s| s.trim().to_uppercase()) {
        if !state.is_empty() && !out.contains(&state) {
            out.push(state);
        }
    }
    out
}

/// Diagnostics about the built index and the slow scans run against it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    /// Dataset paths the build tried.
    pub files_considered: u64,
    /// Files that were read and parsed.
    pub files_loaded: u64,
    /// Configured files that did not exist.
    pub files_missing: u64,
    /// Files that existed but could not be read or parsed.
    pub files_skipped: u64,
    /// Entries read from all loaded files.
    pub entries_seen: u64,
    /// Entries past the eager limit, left for slow scans.
    pub entries_deferred: u64,
    /// Entries that were not key/value objects.
    pub entries_rejected: u64,
    /// Newline-delimited lines that failed to parse.
    pub malformed_lines: u64,
    /// Records added to the postal code index.
    pub records_by_postal_code: u64,
    /// Records without a valid postal code.
    pub records_without_postal_code: u64,
    /// Distinct states in the state index.
    pub states: u64,
    /// Distinct state/city keys in the constituency index.
    pub constituency_keys: u64,
    /// Time the eager build took, in seconds.
    pub build_time_secs: f64,
    /// Slow scans run after postal code misses.
    pub slow_scans: u64,
    /// Slow scans that found and indexed the requested code.
    pub slow_scan_hits: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_state_list() {
        assert_eq!(
            parse_state_list(" kerala, PUNJAB ,,Uttar Pradesh"),
            vec!["KERALA", "PUNJAB", "UTTAR PRADESH"]
        );
    }

    #[test]
    fn parses_blank_state_list_as_unrestricted() {
        assert!(parse_state_list("").is_empty());
        assert!(parse_state_list(" , ,").is_empty());
    }

    #[test]
    fn state_list_drops_duplicates() {
        assert_eq!(parse_state_list("KERALA,kerala"), vec!["KERALA"]);
    }

    #[test]
    fn allowed_state_keys_are_upper_cased() {
        let config = LocationFallbackConfig {
            allowed_states: vec!["odisha".to_string(), " ".to_string()],
            ..LocationFallbackConfig::default()
        };
        let keys = config.allowed_state_keys();
        assert_eq!(keys.len(), 1);
        assert!(keys.contains("ODISHA"));
    }

    #[test]
    fn record_keys_fold_case() {
        let record = FallbackRecord {
            state: Some("Kerala".to_string()),
            city: Some("Kannur".to_string()),
            ..FallbackRecord::default()
        };
        assert_eq!(record.state_key().as_deref(), Some("KERALA"));
        assert_eq!(record.city_key().as_deref(), Some("KANNUR"));
    }

    #[test]
    fn record_serializes_camel_case() {
        let record = FallbackRecord {
            postal_code: Some("683572".to_string()),
            gram_panchayat: Some("Ayyampuzha".to_string()),
            ..FallbackRecord::default()
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["postalCode"], "683572");
        assert_eq!(json["gramPanchayat"], "Ayyampuzha");
    }
}
