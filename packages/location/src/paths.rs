#![allow(clippy::module_name_repetitions)]
//! Canonical file paths for bundled location data.
//!
//! All paths are relative to the project root.

use std::path::{Path, PathBuf};

/// File name of the bundled offline location dataset.
pub const DEFAULT_DATASET_FILE_NAME: &str = "New_DataSet.json";

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`. Falls back to the
/// manifest directory itself if it has fewer than two ancestors.
#[must_use]
pub fn project_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .ancestors()
        .nth(2)
        .unwrap_or(manifest_dir)
        .to_path_buf()
}

/// Returns the path of the bundled dataset at the project root.
#[must_use]
pub fn default_dataset_path() -> PathBuf {
    project_root().join(DEFAULT_DATASET_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_root_contains_workspace_manifest() {
        assert!(project_root().join("Cargo.toml").exists());
        assert!(project_root().join("packages").is_dir());
    }

    #[test]
    fn default_dataset_lives_at_root() {
        let path = default_dataset_path();
        assert_eq!(path.parent(), Some(project_root().as_path()));
        assert!(path.ends_with(DEFAULT_DATASET_FILE_NAME));
    }
}
