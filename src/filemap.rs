//! Locating the build-output map that ties a compiled unit back to its
//! source inputs.
//!
//! The Swift driver writes a `<unit>-OutputFileMap.json` into the build
//! intermediates of each target; its keys are the source files that fed the
//! unit (plus a single `""` key for whole-module outputs). Those keys are
//! the candidate set for digest resolution.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{CovupError, Result};
use crate::model::CandidateSet;

/// Find a file by name anywhere under `root`. Unreadable directory entries
/// are skipped rather than aborting the walk.
#[must_use]
pub fn find_file(file_name: &str, root: &Path) -> Option<PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .find(|entry| entry.file_type().is_file() && entry.file_name() == file_name)
        .map(|entry| entry.into_path())
}

/// Parse an output file map and return its keys as the candidate set.
pub fn candidates_from_map(map_path: &Path) -> Result<CandidateSet> {
    let content = std::fs::read_to_string(map_path)?;
    let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&content)?;

    let paths = map
        .keys()
        .filter(|key| !key.is_empty())
        .map(PathBuf::from)
        .collect();

    Ok(CandidateSet::new(paths))
}

/// Resolve the candidate set for one coverage unit. The map lives somewhere
/// under `<derived_data>/Build/Intermediates.noindex`.
pub fn candidates_for_unit(unit_name: &str, derived_data_dir: &Path) -> Result<CandidateSet> {
    let map_name = format!("{unit_name}-OutputFileMap.json");
    let build_dir = derived_data_dir.join("Build").join("Intermediates.noindex");

    let map_path = find_file(&map_name, &build_dir)
        .ok_or_else(|| CovupError::FileMapNotFound(unit_name.to_string()))?;

    candidates_from_map(&map_path)
}
