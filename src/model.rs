//! Uniform in-memory representation of one coverage run, independent of the
//! submission wire format. The report parser produces segments, resolution
//! turns them into `ResolvedUnit`s, and the payload builder maps those onto
//! the `source_files` entries Coveralls expects.

use std::path::PathBuf;

use thiserror::Error;

/// Compute a coverage rate, returning 0.0 when the total is zero.
#[must_use]
pub fn rate(covered: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        covered as f64 / total as f64
    }
}

/// The source files eligible to match a report segment that carries no
/// explicit path header. Supplied per compiled artifact by the build-output
/// map; resolution only reads it.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    pub paths: Vec<PathBuf>,
}

impl CandidateSet {
    #[must_use]
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// A contiguous block of report text describing exactly one compiled unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageSegment {
    /// Explicit path header. Only multi-unit reports name their files.
    pub header: Option<String>,
    /// The annotated content lines, header excluded, without a trailing
    /// newline.
    pub text: String,
}

impl CoverageSegment {
    /// Number of content lines in the segment.
    #[must_use]
    pub fn line_count(&self) -> usize {
        if self.text.is_empty() {
            0
        } else {
            self.text.lines().count()
        }
    }
}

/// One parsed report line. `hits` is `None` for lines the instrumentation
/// does not consider executable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCoverage {
    pub line_number: u32,
    pub hits: Option<u64>,
}

/// The fully resolved coverage for one compiled unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUnit {
    /// Source file path, taken from the segment header or recovered by
    /// digest matching against the candidate set.
    pub path: PathBuf,
    /// Hex digest of the annotated segment text, used downstream for
    /// change detection.
    pub source_digest: String,
    /// Per-line records in file order, starting at line 1.
    pub lines: Vec<LineCoverage>,
}

impl ResolvedUnit {
    /// Number of executable lines in the unit.
    #[must_use]
    pub fn executable_lines(&self) -> u64 {
        self.lines.iter().filter(|l| l.hits.is_some()).count() as u64
    }

    /// Number of executable lines hit at least once.
    #[must_use]
    pub fn covered_lines(&self) -> u64 {
        self.lines
            .iter()
            .filter(|l| matches!(l.hits, Some(hits) if hits > 0))
            .count() as u64
    }
}

/// Why a segment could not be resolved to a source file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    /// The segment had no path header and no candidate file's content
    /// digest matched its reconstructed source.
    #[error("no digest match among {candidates} candidate files")]
    NoMatch { candidates: usize },
}

/// A per-unit resolution failure. The unit is excluded from the payload;
/// the caller decides whether to log, skip, or abort the submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionFailure {
    /// Zero-based index of the segment within its dump.
    pub segment_index: usize,
    /// Number of content lines in the failed segment.
    pub line_count: usize,
    pub reason: FailureReason,
}

/// A candidate file that could not be read while digesting. The candidate
/// is skipped; resolution of the segment continues with the rest.
#[derive(Debug)]
pub struct CandidateSkip {
    pub path: PathBuf,
    pub error: std::io::Error,
}

/// Everything resolved out of one raw dump: the units that made it, the
/// per-unit failures, and the candidates skipped along the way.
#[derive(Debug, Default)]
pub struct ReportCoverage {
    pub units: Vec<ResolvedUnit>,
    pub failures: Vec<ResolutionFailure>,
    pub skipped_candidates: Vec<CandidateSkip>,
}

/// One `source_files` entry of a Coveralls job.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SourceFile {
    /// File path relative to the repository root.
    pub name: String,
    /// Fingerprint of the annotated report text for this file.
    pub source_digest: String,
    /// Per-line hit counts; `null` marks non-executable lines.
    pub coverage: Vec<Option<u64>>,
}

/// The normalized, submission-ready coverage data for one run.
/// Serializes as a plain array of entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct CoveragePayload {
    pub source_files: Vec<SourceFile>,
}
