//! Parser for the textual per-line reports emitted by `llvm-cov show`.
//!
//! Reference: https://llvm.org/docs/CommandGuide/llvm-cov.html
//!
//! A report annotates every source line with a line-number column and a hit
//! count column:
//!
//! ```text
//!     1|      4|func run() {
//!     2|   2.3k|    tick()
//!     3|       |}
//! ```
//!
//! Hit counts come in several encodings: a bare integer, a decimal with a
//! `k`/`M` suffix, or a run of `#` when the counter is unavailable. An empty
//! count column marks a non-executable line. Older toolchains separate the
//! columns with `:` instead of `|`.
//!
//! Two framings exist. When a single source file matched the instrumented
//! binary, the dump is just that file's annotated source and starts directly
//! with its `1|` line — no path appears anywhere, and the file identity has
//! to be recovered by digest matching (see `resolve`). When several files
//! matched, each unit leads with a `<path>:` header and units are separated
//! by a blank line.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{CovupError, Result};
use crate::model::CoverageSegment;

/// Matches the line-number column and captures the count token that
/// follows, e.g. `   12|      4|...` captures `4`.
static HIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\d+\|\s*([^|\s]+)").unwrap());

/// Matches a count with a thousands/millions suffix, e.g. `2.3k`, `1.4M`.
static SUFFIXED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+(?:\.\d+)?)(k|M)$").unwrap());

/// Matches the full annotation prefix of a line: line-number column, count
/// column (possibly empty), and the trailing separator.
static PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+[|:]\s*(?:[0-9.]+[kM]?|#+)?[|:]?").unwrap());

/// Parse one report line into its hit count.
///
/// Returns `None` for lines the instrumentation does not consider
/// executable, including anything that fails to parse — the format is too
/// loose to treat a stray line as fatal. A `#` run means the line exists
/// but its counter is unavailable, which we report as zero hits.
#[must_use]
pub fn parse_line_hits(line: &str) -> Option<u64> {
    let line = line.replace(':', "|");

    let captures = HIT_RE.captures(&line)?;
    let token = captures.get(1)?.as_str();

    if token.bytes().all(|b| b.is_ascii_digit()) {
        return token.parse().ok();
    }

    if token.bytes().all(|b| b == b'#') {
        return Some(0);
    }

    if let Some(caps) = SUFFIXED_RE.captures(token) {
        let value: f64 = caps[1].parse().ok()?;
        let multiplier = if &caps[2] == "k" { 1_000.0 } else { 1_000_000.0 };
        return Some((value * multiplier).round() as u64);
    }

    None
}

/// Reconstruct the unannotated source of a segment by dropping the
/// annotation prefix from every line. The result is the original file
/// content modulo its trailing newline, which is what digest matching
/// compares against.
#[must_use]
pub fn strip_annotations(text: &str) -> String {
    let stripped: Vec<&str> = text.lines().map(strip_line).collect();
    stripped.join("\n")
}

fn strip_line(line: &str) -> &str {
    match PREFIX_RE.find(line) {
        Some(m) => &line[m.end()..],
        None => line,
    }
}

/// Does this line open the annotated source of a file (its line 1)?
/// llvm-cov omits the path header exactly when the report covers a single
/// file, so a dump or block starting this way carries no path.
fn is_first_source_line(line: &str) -> bool {
    line.replace(':', "|").trim_start().starts_with("1|")
}

/// Strip the trailing `:` from a `<path>:` header line.
fn header_path(line: &str) -> String {
    line.trim().trim_end_matches(':').to_string()
}

/// Split one raw dump into per-unit segments.
///
/// Framing is detected from the first line: if it is a file's `1|` coverage
/// line the dump is single-unit and becomes one headerless segment spanning
/// the whole text. Otherwise the dump is multi-unit: units are separated by
/// blank lines and each block normally leads with a `<path>:` header. A
/// block whose first line is itself a coverage line is kept as a headerless
/// block for digest resolution.
///
/// Every input line ends up in exactly one segment (headers are consumed,
/// not duplicated into content); a violation of that accounting means the
/// upstream format changed and is fatal.
pub fn segment(dump: &str) -> Result<Vec<CoverageSegment>> {
    let lines: Vec<&str> = dump.lines().collect();
    if lines.iter().all(|line| line.trim().is_empty()) {
        return Ok(Vec::new());
    }

    if is_first_source_line(lines[0]) {
        return Ok(vec![CoverageSegment {
            header: None,
            text: lines.join("\n"),
        }]);
    }

    let mut segments: Vec<CoverageSegment> = Vec::new();
    let mut header: Option<String> = None;
    let mut block: Vec<&str> = Vec::new();
    let mut blank_lines = 0usize;
    let mut at_block_start = true;

    for line in &lines {
        if line.trim().is_empty() {
            blank_lines += 1;
            if header.is_some() || !block.is_empty() {
                segments.push(CoverageSegment {
                    header: header.take(),
                    text: block.join("\n"),
                });
                block.clear();
            }
            at_block_start = true;
            continue;
        }

        if at_block_start {
            at_block_start = false;
            if !is_first_source_line(line) {
                header = Some(header_path(line));
                continue;
            }
        }
        block.push(line);
    }
    if header.is_some() || !block.is_empty() {
        segments.push(CoverageSegment {
            header: header.take(),
            text: block.join("\n"),
        });
    }

    // Exhaustiveness check: headers + content + separators must account for
    // the entire dump.
    let accounted = blank_lines
        + segments
            .iter()
            .map(|s| s.line_count() + usize::from(s.header.is_some()))
            .sum::<usize>();
    if accounted != lines.len() {
        return Err(CovupError::Segmentation {
            accounted,
            total: lines.len(),
        });
    }

    Ok(segments)
}
