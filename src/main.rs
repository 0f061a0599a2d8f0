use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;

use covup::model::{rate, ReportCoverage, ResolvedUnit};
use covup::{coveralls, filemap, payload, resolve};

/// covup — parse llvm-cov text reports and submit them to Coveralls.
#[derive(Parser)]
#[command(name = "covup", version, about)]
struct Cli {
    /// The repo_token for your Coveralls repository.
    #[arg(long)]
    repo_token: String,

    /// Directory containing the generated coverage reports, one text file
    /// per test target (default: ./CoverageData).
    #[arg(long)]
    coverage_data_dir: Option<PathBuf>,

    /// Path to the Xcode derived data directory holding the build output
    /// maps (default: ./localDerivedData).
    #[arg(long)]
    derived_data_dir: Option<PathBuf>,

    /// Pull request id associated with this build.
    #[arg(long)]
    pull_request_id: Option<String>,

    /// CI build number.
    #[arg(long)]
    build_number: Option<String>,

    /// Git commit sha of this build.
    #[arg(long)]
    commit_sha: Option<String>,

    /// Repository root used to relativize payload file names
    /// (default: current directory).
    #[arg(long)]
    repo_root: Option<PathBuf>,

    /// Print the job JSON instead of submitting it.
    #[arg(long)]
    dry_run: bool,
}

fn warn(msg: &str) {
    eprintln!("warning: {msg}");
}

fn info(msg: &str) {
    println!("info: {msg}");
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let start = Utc::now();

    let coverage_data_dir = cli.coverage_data_dir.unwrap_or_else(|| {
        warn("coverage data directory not provided, defaulting to ./CoverageData");
        PathBuf::from("./CoverageData")
    });
    let derived_data_dir = cli.derived_data_dir.unwrap_or_else(|| {
        warn("derived data directory not provided, defaulting to ./localDerivedData");
        PathBuf::from("./localDerivedData")
    });
    let repo_root = match cli.repo_root {
        Some(root) => root,
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };

    let mut units: Vec<ResolvedUnit> = Vec::new();
    let mut failed_units = 0usize;
    let mut failed_targets = 0usize;

    for report_path in coverage_files(&coverage_data_dir)? {
        let unit_name = report_path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("unnamed")
            .to_string();

        info(&format!("resolving coverage for {unit_name}"));

        match process_target(&report_path, &unit_name, &derived_data_dir) {
            Ok(report) => {
                for skip in &report.skipped_candidates {
                    warn(&format!(
                        "skipped unreadable candidate {}: {}",
                        skip.path.display(),
                        skip.error
                    ));
                }
                for failure in &report.failures {
                    warn(&format!(
                        "{unit_name}: segment {} ({} lines) dropped: {}",
                        failure.segment_index, failure.line_count, failure.reason
                    ));
                    failed_units += 1;
                }
                units.extend(report.units);
            }
            // One target's report must not sink the others; record and
            // move on.
            Err(err) => {
                eprintln!("error: {unit_name}: {err:#}");
                failed_targets += 1;
            }
        }
    }

    let payload = payload::build(&units, Some(&repo_root));

    let mut job = coveralls::Job::new(cli.repo_token, payload);
    job.service_number = cli.build_number;
    job.service_pull_request = cli.pull_request_id;
    job.commit_sha = cli.commit_sha;

    if cli.dry_run {
        println!("{}", job.to_json()?);
    } else {
        let response = coveralls::submit(&job)?;
        info(&format!("coveralls response: {response}"));
    }

    print_summary(&units, failed_units, failed_targets);

    let elapsed = Utc::now() - start;
    info(&format!(
        "covup took {:.1}s to run",
        elapsed.num_milliseconds() as f64 / 1000.0
    ));

    Ok(())
}

/// List the per-target report files in the coverage data directory, sorted
/// by name so runs are reproducible.
fn coverage_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read coverage data directory {}", dir.display()))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    Ok(files)
}

/// Resolve one test target's report against its build output map.
fn process_target(
    report_path: &Path,
    unit_name: &str,
    derived_data_dir: &Path,
) -> Result<ReportCoverage> {
    let candidates = filemap::candidates_for_unit(unit_name, derived_data_dir)
        .with_context(|| format!("Failed to locate source candidates for {unit_name}"))?;

    let dump = fs::read_to_string(report_path)
        .with_context(|| format!("Failed to read report {}", report_path.display()))?;

    resolve::resolve_dump(&dump, &candidates)
        .with_context(|| format!("Failed to resolve report {}", report_path.display()))
}

fn print_summary(units: &[ResolvedUnit], failed_units: usize, failed_targets: usize) {
    let total: u64 = units.iter().map(ResolvedUnit::executable_lines).sum();
    let covered: u64 = units.iter().map(ResolvedUnit::covered_lines).sum();

    info(&format!(
        "payload: {} files, {}/{} lines covered ({:.1}%)",
        units.len(),
        covered,
        total,
        rate(covered, total) * 100.0
    ));
    if failed_units > 0 {
        warn(&format!("{failed_units} units could not be resolved"));
    }
    if failed_targets > 0 {
        warn(&format!("{failed_targets} targets failed to process"));
    }
}
