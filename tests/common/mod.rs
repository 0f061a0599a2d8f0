use std::path::PathBuf;

use covup::model::CandidateSet;
use tempfile::TempDir;

/// Write candidate source files into a fresh temp dir, returning the dir
/// handle (the caller must keep it alive) and the candidate set in the
/// given order.
pub fn candidate_files(files: &[(&str, &str)]) -> (TempDir, CandidateSet) {
    let dir = tempfile::tempdir().unwrap();
    let mut paths: Vec<PathBuf> = Vec::new();

    for (name, content) in files {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        paths.push(path);
    }

    (dir, CandidateSet::new(paths))
}
