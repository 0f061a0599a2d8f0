//! Resolution of report segments to source files.
//!
//! A multi-unit report names each file in its header lines. A single-unit
//! report names nothing, so the file has to be recovered: the segment's
//! reconstructed source is digested and compared against the digest of
//! every file the build could have compiled. Content equality guarantees at
//! most one candidate can match, so scan order never changes the result.
//!
//! Whole-set digesting is O(segments × candidates). Candidate sets are tens
//! of files per build target and resolution runs once per build, so nothing
//! fancier is warranted.

use std::fs;
use std::path::PathBuf;

use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::llvm;
use crate::model::{
    CandidateSet, CandidateSkip, CoverageSegment, FailureReason, LineCoverage, ReportCoverage,
    ResolutionFailure, ResolvedUnit,
};

/// SHA-256 hex digest of a string.
fn hex_digest(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// Digest for content matching. The source reconstructed from a report
/// never carries the file's final newline, so both sides of a comparison
/// are digested with at most one trailing newline trimmed.
fn match_digest(text: &str) -> String {
    hex_digest(text.strip_suffix('\n').unwrap_or(text))
}

/// Run the line parser over every content line of a segment.
fn parse_lines(segment: &CoverageSegment) -> Vec<LineCoverage> {
    segment
        .text
        .lines()
        .enumerate()
        .map(|(i, line)| LineCoverage {
            line_number: i as u32 + 1,
            hits: llvm::parse_line_hits(line),
        })
        .collect()
}

/// Find the candidate whose content digest matches the segment's
/// reconstructed source. Unreadable candidates are skipped and recorded;
/// a stale path in the output file map must not sink the whole unit.
fn match_candidate(
    text: &str,
    candidates: &CandidateSet,
    skips: &mut Vec<CandidateSkip>,
) -> Option<PathBuf> {
    let wanted = match_digest(&llvm::strip_annotations(text));

    for path in &candidates.paths {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(error) => {
                skips.push(CandidateSkip {
                    path: path.clone(),
                    error,
                });
                continue;
            }
        };
        if match_digest(&content) == wanted {
            return Some(path.clone());
        }
    }

    None
}

/// Resolve one segment into a `ResolvedUnit`.
///
/// The header path is trusted when present; otherwise the file is found by
/// digest matching. The unit's `source_digest` fingerprints the annotated
/// report text, so a repeat run over unchanged input reproduces it exactly.
pub fn extract(
    segment: &CoverageSegment,
    index: usize,
    candidates: &CandidateSet,
    skips: &mut Vec<CandidateSkip>,
) -> std::result::Result<ResolvedUnit, ResolutionFailure> {
    let path = match &segment.header {
        Some(header) => PathBuf::from(header),
        None => match match_candidate(&segment.text, candidates, skips) {
            Some(path) => path,
            None => {
                return Err(ResolutionFailure {
                    segment_index: index,
                    line_count: segment.line_count(),
                    reason: FailureReason::NoMatch {
                        candidates: candidates.len(),
                    },
                });
            }
        },
    };

    Ok(ResolvedUnit {
        path,
        source_digest: hex_digest(&segment.text),
        lines: parse_lines(segment),
    })
}

/// Segment a raw dump and resolve every unit in it.
///
/// Per-unit failures are accumulated, not propagated: one unmatched unit
/// must not cost the rest of the report. Only a segmentation accounting
/// violation is fatal, since it means the report format itself changed.
pub fn resolve_dump(dump: &str, candidates: &CandidateSet) -> Result<ReportCoverage> {
    let segments = llvm::segment(dump)?;

    let mut report = ReportCoverage::default();
    for (index, segment) in segments.iter().enumerate() {
        match extract(segment, index, candidates, &mut report.skipped_candidates) {
            Ok(unit) => report.units.push(unit),
            Err(failure) => report.failures.push(failure),
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_with_header_reads_no_candidates() {
        let segment = CoverageSegment {
            header: Some("/src/A.swift".to_string()),
            text: "    1|      4|a()\n    2|       |".to_string(),
        };
        let candidates = CandidateSet::default();
        let mut skips = Vec::new();

        let unit = extract(&segment, 0, &candidates, &mut skips).unwrap();
        assert_eq!(unit.path, PathBuf::from("/src/A.swift"));
        assert_eq!(
            unit.lines,
            vec![
                LineCoverage {
                    line_number: 1,
                    hits: Some(4)
                },
                LineCoverage {
                    line_number: 2,
                    hits: None
                },
            ]
        );
        assert!(skips.is_empty());
    }

    #[test]
    fn test_source_digest_is_deterministic() {
        let segment = CoverageSegment {
            header: Some("/src/A.swift".to_string()),
            text: "    1|      4|a()".to_string(),
        };
        let candidates = CandidateSet::default();
        let mut skips = Vec::new();

        let first = extract(&segment, 0, &candidates, &mut skips).unwrap();
        let second = extract(&segment, 0, &candidates, &mut skips).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_no_match_without_header_or_candidates() {
        let segment = CoverageSegment {
            header: None,
            text: "    1|      4|a()".to_string(),
        };
        let candidates = CandidateSet::default();
        let mut skips = Vec::new();

        let failure = extract(&segment, 3, &candidates, &mut skips).unwrap_err();
        assert_eq!(failure.segment_index, 3);
        assert_eq!(failure.line_count, 1);
        assert_eq!(failure.reason, FailureReason::NoMatch { candidates: 0 });
    }

    #[test]
    fn test_executable_and_covered_counts() {
        let segment = CoverageSegment {
            header: Some("/src/A.swift".to_string()),
            text: "    1|      4|a()\n    2|      0|b()\n    3|       |".to_string(),
        };
        let mut skips = Vec::new();
        let unit = extract(&segment, 0, &CandidateSet::default(), &mut skips).unwrap();
        assert_eq!(unit.executable_lines(), 2);
        assert_eq!(unit.covered_lines(), 1);
    }
}
