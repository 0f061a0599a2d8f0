mod common;

use covup::model::{CandidateSet, FailureReason};
use covup::{payload, resolve};

/// A dump with one header unit and one headerless unit: the header is
/// trusted, the headerless block is digest-matched against the candidates,
/// and both end up in the payload.
#[test]
fn end_to_end_two_units() {
    let (dir, candidates) = common::candidate_files(&[("a.swift", "x = 1\n")]);

    let dump = "/src/b.swift:\n    1|      #|y = 2\n\n    1|      4|x = 1\n";
    let report = resolve::resolve_dump(dump, &candidates).unwrap();
    assert_eq!(report.units.len(), 2);
    assert_eq!(report.failures.len(), 0);

    let payload = payload::build(&report.units, Some(dir.path()));
    assert_eq!(payload.source_files.len(), 2);

    // The hash marker means an unavailable counter: present but zero.
    assert_eq!(payload.source_files[0].name, "/src/b.swift");
    assert_eq!(payload.source_files[0].coverage, vec![Some(0)]);

    assert_eq!(payload.source_files[1].name, "a.swift");
    assert_eq!(payload.source_files[1].coverage, vec![Some(4)]);
}

/// Same dump, but the matching candidate is gone: the headerless unit is
/// dropped from the payload and reported as a NoMatch failure.
#[test]
fn end_to_end_missing_candidate() {
    let (dir, candidates) = common::candidate_files(&[("other.swift", "let unrelated = true\n")]);

    let dump = "/src/b.swift:\n    1|      #|y = 2\n\n    1|      4|x = 1\n";
    let report = resolve::resolve_dump(dump, &candidates).unwrap();

    assert_eq!(report.units.len(), 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(
        report.failures[0].reason,
        FailureReason::NoMatch { candidates: 1 }
    );

    let payload = payload::build(&report.units, Some(dir.path()));
    assert_eq!(payload.source_files.len(), 1);
    assert_eq!(payload.source_files[0].name, "/src/b.swift");
}

#[test]
fn multi_unit_fixture_payload() {
    let dump = include_str!("fixtures/multi_unit.txt");
    let report = resolve::resolve_dump(dump, &CandidateSet::default()).unwrap();

    let payload = payload::build(&report.units, None);
    assert_eq!(payload.source_files.len(), 2);

    assert_eq!(payload.source_files[0].name, "/src/Engine.swift");
    assert_eq!(
        payload.source_files[0].coverage,
        vec![Some(12), Some(12), None]
    );

    assert_eq!(payload.source_files[1].name, "/src/Wheel.swift");
    assert_eq!(
        payload.source_files[1].coverage,
        vec![Some(2_300), Some(2_300), None]
    );
}

/// Two targets exercising the same source file produce two separate,
/// non-additive entries.
#[test]
fn duplicate_files_across_targets_are_not_merged() {
    let (_dir, candidates) = common::candidate_files(&[("shared.swift", "x = 1\n")]);

    let run_one = resolve::resolve_dump("    1|      4|x = 1\n", &candidates).unwrap();
    let run_two = resolve::resolve_dump("    1|      9|x = 1\n", &candidates).unwrap();

    let mut units = run_one.units;
    units.extend(run_two.units);

    let payload = payload::build(&units, None);
    assert_eq!(payload.source_files.len(), 2);
    assert_eq!(payload.source_files[0].name, payload.source_files[1].name);
    assert_eq!(payload.source_files[0].coverage, vec![Some(4)]);
    assert_eq!(payload.source_files[1].coverage, vec![Some(9)]);
    // Different annotated text, different fingerprint.
    assert_ne!(
        payload.source_files[0].source_digest,
        payload.source_files[1].source_digest
    );
}
