//! Environment-driven resolver configuration.
//!
//! | Variable | Meaning |
//! |---|---|
//! | `LOCATION_FALLBACK_FILE` | extra dataset path, merged with the bundled one |
//! | `LOCATION_FALLBACK_STATES` | comma-separated state allow-list |
//! | `LOCATION_FALLBACK_EAGER_LIMIT` | per-file cap on eagerly indexed entries |

use std::path::PathBuf;

use krishi_mitra_location_models::{LocationFallbackConfig, parse_state_list};

use crate::dataset::dedup_paths;
use crate::paths;

/// Dataset override path variable.
pub const FILE_VAR: &str = "LOCATION_FALLBACK_FILE";
/// State allow-list variable.
pub const STATES_VAR: &str = "LOCATION_FALLBACK_STATES";
/// Eager indexing limit variable.
pub const EAGER_LIMIT_VAR: &str = "LOCATION_FALLBACK_EAGER_LIMIT";

/// Builds the configuration from the process environment.
///
/// Unset or blank variables mean "not configured": no override file, no
/// state restriction, no eager limit.
#[must_use]
pub fn from_env() -> LocationFallbackConfig {
    from_lookup(|name| std::env::var(name).ok())
}

/// Builds the configuration from an arbitrary variable lookup.
#[must_use]
pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> LocationFallbackConfig {
    let override_file = lookup(FILE_VAR)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from);

    let allowed_states = lookup(STATES_VAR)
        .map(|v| parse_state_list(&v))
        .unwrap_or_default();

    let eager_record_limit = lookup(EAGER_LIMIT_VAR).and_then(|v| match v.trim().parse::<usize>() {
        Ok(limit) => Some(limit),
        Err(e) => {
            log::warn!("Ignoring {EAGER_LIMIT_VAR}={v:?}: {e}");
            None
        }
    });

    LocationFallbackConfig {
        default_file: Some(paths::default_dataset_path()),
        override_file,
        allowed_states,
        eager_record_limit,
    }
}

/// Dataset paths to read: the default path, then the override,
/// de-duplicated by resolved path.
#[must_use]
pub fn dataset_files(config: &LocationFallbackConfig) -> Vec<PathBuf> {
    dedup_paths(
        config
            .default_file
            .iter()
            .chain(config.override_file.iter())
            .cloned(),
    )
}
