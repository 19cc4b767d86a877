#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Offline location fallback resolver.
//!
//! Answers "which states, cities, and constituencies exist" and "where is
//! this postal code" from bundled dataset files, without a database or a
//! geocoding service.
//!
//! # Architecture
//!
//! - **Build**: on first query (or [`LocationResolver::prewarm`]) every
//!   configured dataset file is parsed, each entry is normalized through the
//!   field mapping table, and the records are inserted into a
//!   [`LocationIndex`]. The build runs once per resolver; concurrent first
//!   callers wait for it.
//! - **Query**: the four list/lookup operations read the index. They never
//!   fail; missing or malformed data yields empty results.
//! - **Slow scan**: a postal code missing from the index triggers a re-read
//!   of the dataset files for that one code. Matches are added to the index
//!   so later lookups are answered from memory. Misses are not cached.
//!
//! # Usage
//!
//! ```rust,no_run
//! use krishi_mitra_location::LocationResolver;
//!
//! let resolver = LocationResolver::from_env();
//! for state in resolver.list_states() {
//!     println!("{state}: {:?}", resolver.list_cities(Some(state.as_str())));
//! }
//! let records = resolver.lookup_by_postal_code("683572");
//! ```

pub mod config;
pub mod dataset;
pub mod fields;
pub mod index;
pub mod normalize;
pub mod paths;
pub mod postal;
pub mod scan;

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock, Mutex, OnceLock, PoisonError, RwLock};
use std::time::Instant;

pub use index::LocationIndex;
pub use krishi_mitra_location_models::{
    FallbackRecord, FieldMapping, IndexStats, LocationFallbackConfig,
};
pub use postal::normalize_postal_code;

/// Errors from loading location data.
///
/// These never reach callers of the query operations; they are logged and
/// counted in [`IndexStats`] instead.
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A field mapping table could not be parsed.
    #[error("Field mapping error: {0}")]
    FieldMapping(#[from] toml::de::Error),

    /// A dataset file matched none of the supported formats.
    #[error("Malformed dataset {path}: {message}")]
    MalformedDataset {
        /// Path of the offending file (empty when parsing raw text).
        path: String,
        /// Description of what went wrong.
        message: String,
    },

    /// Async task join error.
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

static SHARED: LazyLock<LocationResolver> =
    LazyLock::new(|| LocationResolver::new(config::from_env()));

/// Returns the process-wide resolver configured from the environment.
///
/// Prefer constructing a [`LocationResolver`] at startup and passing it to
/// the code that needs it; this exists for callers without access to
/// shared application state.
#[must_use]
pub fn shared() -> &'static LocationResolver {
    &SHARED
}

/// The built index plus the diagnostics gathered while building it.
struct BuiltIndex {
    index: RwLock<LocationIndex>,
    build_stats: IndexStats,
}

struct Inner {
    config: LocationFallbackConfig,
    fields: FieldMapping,
    files: Vec<PathBuf>,
    built: OnceLock<BuiltIndex>,
    scan_lock: Mutex<()>,
    slow_scans: AtomicU64,
    slow_scan_hits: AtomicU64,
}

/// Lazily built, thread-safe location resolver.
///
/// Cloning is cheap; clones share the same index.
#[derive(Clone)]
pub struct LocationResolver {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for LocationResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationResolver")
            .field("files", &self.inner.files)
            .field("allowed_states", &self.inner.config.allowed_states)
            .field("built", &self.is_built())
            .finish_non_exhaustive()
    }
}

impl LocationResolver {
    /// Creates a resolver using the embedded field mapping table.
    ///
    /// No files are read until the first query.
    #[must_use]
    pub fn new(config: LocationFallbackConfig) -> Self {
        Self::with_field_mapping(config, fields::default_mapping().clone())
    }

    /// Creates a resolver configured from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(config::from_env())
    }

    /// Creates a resolver with a custom field mapping table.
    #[must_use]
    pub fn with_field_mapping(config: LocationFallbackConfig, fields: FieldMapping) -> Self {
        let files = config::dataset_files(&config);
        Self {
            inner: Arc::new(Inner {
                config,
                fields,
                files,
                built: OnceLock::new(),
                scan_lock: Mutex::new(()),
                slow_scans: AtomicU64::new(0),
                slow_scan_hits: AtomicU64::new(0),
            }),
        }
    }

    /// Dataset files this resolver reads, in order.
    #[must_use]
    pub fn dataset_files(&self) -> &[PathBuf] {
        &self.inner.files
    }

    /// Returns `true` once the index has been built.
    #[must_use]
    pub fn is_built(&self) -> bool {
        self.inner.built.get().is_some()
    }

    /// Builds the index if it has not been built yet.
    pub fn ensure_built(&self) {
        let _ = self.built();
    }

    /// Builds the index on a blocking thread, for use at startup so the
    /// first request does not pay for it.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::Join`] if the build thread panicked.
    pub async fn prewarm(&self) -> Result<IndexStats, LocationError> {
        let resolver = self.clone();
        Ok(tokio::task::spawn_blocking(move || {
            resolver.ensure_built();
            resolver.stats()
        })
        .await?)
    }

    /// Upper-cased state names in first-seen order, restricted to the
    /// allow-list when one is configured.
    #[must_use]
    pub fn list_states(&self) -> Vec<String> {
        self.read_index().states()
    }

    /// Cities of `state`, or of every allowed state when `state` is `None`
    /// or blank. Unknown or disallowed states yield an empty list.
    #[must_use]
    pub fn list_cities(&self, state: Option<&str>) -> Vec<String> {
        self.read_index().cities(non_blank(state))
    }

    /// Constituencies of a state/city pair, of every city in a state, or of
    /// everything when neither is given.
    #[must_use]
    pub fn list_constituencies(&self, state: Option<&str>, city: Option<&str>) -> Vec<String> {
        self.read_index()
            .constituencies(non_blank(state), non_blank(city))
    }

    /// Records for a postal code in any textual form.
    ///
    /// A code missing from the index is looked up by a slow scan of the
    /// dataset files. With an allow-list configured, records from other
    /// states are dropped unless that would leave nothing.
    #[must_use]
    pub fn lookup_by_postal_code(&self, code: &str) -> Vec<FallbackRecord> {
        let built = self.built();
        let key = normalize_postal_code(code);

        let indexed = key
            .as_deref()
            .is_some_and(|k| read(&built.index).contains_postal_code(k));
        if !indexed {
            self.slow_scan(built, code);
        }

        key.map(|k| read(&built.index).records(&k))
            .unwrap_or_default()
    }

    /// [`Self::lookup_by_postal_code`] on a blocking thread.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::Join`] if the lookup thread panicked.
    pub async fn lookup_by_postal_code_async(
        &self,
        code: &str,
    ) -> Result<Vec<FallbackRecord>, LocationError> {
        let resolver = self.clone();
        let code = code.to_string();
        Ok(tokio::task::spawn_blocking(move || resolver.lookup_by_postal_code(&code)).await?)
    }

    /// Build and slow-scan diagnostics. Builds the index if needed.
    #[must_use]
    pub fn stats(&self) -> IndexStats {
        let built = self.built();
        let index = read(&built.index);
        IndexStats {
            states: index.state_count() as u64,
            constituency_keys: index.constituency_key_count() as u64,
            slow_scans: self.inner.slow_scans.load(Ordering::Relaxed),
            slow_scan_hits: self.inner.slow_scan_hits.load(Ordering::Relaxed),
            ..built.build_stats.clone()
        }
    }

    /// A copy of the current index, including slow-scan additions.
    #[must_use]
    pub fn snapshot(&self) -> LocationIndex {
        self.read_index().clone()
    }

    fn read_index(&self) -> std::sync::RwLockReadGuard<'_, LocationIndex> {
        read(&self.built().index)
    }

    fn built(&self) -> &BuiltIndex {
        self.inner.built.get_or_init(|| self.build())
    }

    fn build(&self) -> BuiltIndex {
        let start = Instant::now();
        let inner = &self.inner;
        let limit = inner.config.eager_record_limit.unwrap_or(usize::MAX);

        let mut index = LocationIndex::new(inner.config.allowed_state_keys());
        let mut stats = IndexStats {
            files_considered: inner.files.len() as u64,
            ..IndexStats::default()
        };

        for file in &inner.files {
            if !file.exists() {
                log::debug!("Location dataset not found: {}", file.display());
                stats.files_missing += 1;
                continue;
            }

            let parsed = match dataset::read_dataset(file) {
                Ok(parsed) => parsed,
                Err(e) => {
                    log::warn!("Skipping location dataset {}: {e}", file.display());
                    stats.files_skipped += 1;
                    continue;
                }
            };

            stats.files_loaded += 1;
            stats.entries_seen += parsed.entries.len() as u64;
            stats.entries_deferred += parsed.entries.len().saturating_sub(limit) as u64;
            stats.entries_rejected += parsed.rejected;
            stats.malformed_lines += parsed.malformed_lines;

            for entry in parsed.entries.iter().take(limit) {
                let outcome = index.insert(normalize::normalize_entry(entry, &inner.fields));
                if outcome.by_postal_code {
                    stats.records_by_postal_code += 1;
                } else {
                    stats.records_without_postal_code += 1;
                }
            }
        }

        stats.states = index.state_count() as u64;
        stats.constituency_keys = index.constituency_key_count() as u64;
        stats.build_time_secs = start.elapsed().as_secs_f64();

        log::info!(
            "Location fallback loaded: files={} states={} constituencyKeys={} postalCodes={} sampleKey={} ({:.2}s)",
            stats.files_loaded,
            stats.states,
            stats.constituency_keys,
            index.postal_code_count(),
            index.sample_key().as_deref().unwrap_or("N/A"),
            stats.build_time_secs,
        );
        if stats.entries_deferred > 0 {
            log::info!(
                "  {} entries past the eager limit are left for slow scans",
                stats.entries_deferred
            );
        }

        BuiltIndex {
            index: RwLock::new(index),
            build_stats: stats,
        }
    }

    /// Scans the dataset files for `raw` and indexes any matches.
    ///
    /// Scans are serialized, and the index is re-checked once the scan lock
    /// is held so concurrent misses on one code index it only once.
    fn slow_scan(&self, built: &BuiltIndex, raw: &str) {
        let Some(target) = normalize_postal_code(raw) else {
            log::debug!("Slow scan skipped: {raw:?} is not a postal code");
            return;
        };

        let _guard = self
            .inner
            .scan_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if read(&built.index).contains_postal_code(&target) {
            return;
        }

        self.inner.slow_scans.fetch_add(1, Ordering::Relaxed);
        let hits = scan::scan_for_postal_code(&self.inner.files, &target, &self.inner.fields);

        let Some(file) = hits.file else {
            log::debug!("Slow scan found no records for postal code {target}");
            return;
        };

        self.inner.slow_scan_hits.fetch_add(1, Ordering::Relaxed);
        log::debug!(
            "Slow scan indexed postal code {target} from {}: {} records",
            file.display(),
            hits.records.len()
        );

        let mut index = built.index.write().unwrap_or_else(PoisonError::into_inner);
        for record in hits.records {
            index.insert(record);
        }
    }
}

/// The index is append-only, so a panic while it was locked leaves it
/// usable.
fn read(lock: &RwLock<LocationIndex>) -> std::sync::RwLockReadGuard<'_, LocationIndex> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
