//! Conversion of resolved units into the Coveralls `source_files` payload.

use std::path::Path;

use crate::model::{CoveragePayload, ResolvedUnit, SourceFile};

/// Build the submission payload from resolved units.
///
/// Entry order follows unit discovery order. Units sharing a file name stay
/// separate entries: two test targets covering the same source each report
/// their own counts and nothing is summed.
#[must_use]
pub fn build(units: &[ResolvedUnit], repo_root: Option<&Path>) -> CoveragePayload {
    let source_files = units
        .iter()
        .map(|unit| SourceFile {
            name: relative_name(&unit.path, repo_root),
            source_digest: unit.source_digest.clone(),
            coverage: unit.lines.iter().map(|line| line.hits).collect(),
        })
        .collect();

    CoveragePayload { source_files }
}

/// Path shown to the aggregation service: relative to the repository root
/// when the unit path lives under it, verbatim otherwise.
fn relative_name(path: &Path, repo_root: Option<&Path>) -> String {
    repo_root
        .and_then(|root| path.strip_prefix(root).ok())
        .unwrap_or(path)
        .display()
        .to_string()
}
