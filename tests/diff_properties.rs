//! Integration tests for the diff engine's documented invariants.

use pretty_assertions::assert_eq;
use symdiff::parser::{parse_chars, ConcatReader, Reader};
use symdiff::{Diff, Dmp, Operation};

fn text_of(diffs: &[Diff<symdiff::Payload>]) -> String {
    diffs.iter().map(|d| ConcatReader.join(&d.symbols)).collect()
}

fn non_insert_text(diffs: &[Diff<symdiff::Payload>]) -> String {
    diffs
        .iter()
        .filter(|d| d.op != Operation::Insert)
        .map(|d| ConcatReader.join(&d.symbols))
        .collect()
}

fn non_delete_text(diffs: &[Diff<symdiff::Payload>]) -> String {
    diffs
        .iter()
        .filter(|d| d.op != Operation::Delete)
        .map(|d| ConcatReader.join(&d.symbols))
        .collect()
}

#[test]
fn identity_on_equal_inputs() {
    let dmp = Dmp::new();
    let a = parse_chars("the quick brown fox");
    let diffs = dmp.diff_main(&a, &a);
    assert!(diffs.is_empty() || (diffs.len() == 1 && diffs[0].op == Operation::Equal));
}

#[test]
fn coverage_reconstructs_both_sides() {
    let dmp = Dmp::new();
    let a = parse_chars("The quick brown fox jumps over the lazy dog.");
    let b = parse_chars("That quick brown fox jumped over a lazy dog.");
    let diffs = dmp.diff_main(&a, &b);
    assert_eq!(non_insert_text(&diffs), "The quick brown fox jumps over the lazy dog.");
    assert_eq!(non_delete_text(&diffs), "That quick brown fox jumped over a lazy dog.");
}

#[test]
fn cleanup_merge_is_idempotent_and_well_formed() {
    let dmp = Dmp::new();
    let a = parse_chars("abcabc");
    let b = parse_chars("abxabc");
    let mut diffs = dmp.diff_main(&a, &b);
    dmp.diff_cleanup_merge(&mut diffs);
    let once = diffs.clone();
    dmp.diff_cleanup_merge(&mut diffs);
    assert_eq!(once, diffs);

    for pair in diffs.windows(2) {
        assert_ne!(pair[0].op, pair[1].op);
    }
    assert!(diffs.iter().all(|d| !d.is_empty()));
}

#[test]
fn concrete_scenario_abc_abd() {
    let dmp = Dmp::new();
    let a = parse_chars("abc");
    let b = parse_chars("abd");
    let diffs = dmp.diff_main(&a, &b);
    assert_eq!(diffs.len(), 3);
    assert_eq!(diffs[0].op, Operation::Equal);
    assert_eq!(ConcatReader.join(&diffs[0].symbols), "ab");
    assert_eq!(diffs[1].op, Operation::Delete);
    assert_eq!(ConcatReader.join(&diffs[1].symbols), "c");
    assert_eq!(diffs[2].op, Operation::Insert);
    assert_eq!(ConcatReader.join(&diffs[2].symbols), "d");
}

#[test]
fn common_overlap_concrete() {
    let dmp = Dmp::new();
    assert_eq!(dmp.diff_common_overlap(&parse_chars("abcd"), &parse_chars("cdef")), 2);
}

#[test]
fn common_prefix_bounds_and_matches() {
    let dmp = Dmp::new();
    let a = parse_chars("abcdxyz");
    let b = parse_chars("abcdefg");
    let n = dmp.diff_common_prefix(&a, &b);
    assert!(n <= a.len().min(b.len()));
    assert_eq!(&a[..n], &b[..n]);
}

#[test]
fn delta_round_trips_and_matches_documented_encoding() {
    let dmp = Dmp::new();
    let diffs = vec![
        Diff::new(Operation::Equal, parse_chars("jump")),
        Diff::new(Operation::Delete, parse_chars("s over")),
        Diff::new(Operation::Insert, parse_chars(" jumped over ")),
    ];
    let delta = dmp.diff_to_delta(&diffs, false);
    assert_eq!(delta, "=4\t-6\t+%20jumped%20over%20");

    let source = parse_chars("jumps over");
    let back = dmp.diff_from_delta(&source, &delta, false).unwrap();
    assert_eq!(back.len(), diffs.len());
    for (l, r) in back.iter().zip(diffs.iter()) {
        assert_eq!(l.op, r.op);
        assert_eq!(text_of(std::slice::from_ref(l)), text_of(std::slice::from_ref(r)));
    }
}

#[test]
fn boundary_score_stays_in_range() {
    let a = symdiff::Symbol::new(symdiff::Payload::Chunk("foo\n\n".to_string()));
    let b = symdiff::Symbol::new(symdiff::Payload::Chunk("bar".to_string()));
    assert!(a.boundary_score(&b) <= 5);
}

#[test]
fn semantic_lossless_preserves_applied_text() {
    let dmp = Dmp::new();
    let a = parse_chars("The cat came.");
    let b = parse_chars("The catapult came.");
    let mut diffs = dmp.diff_main(&a, &b);
    dmp.diff_cleanup_semantic_lossless(&mut diffs);
    assert_eq!(non_insert_text(&diffs), ConcatReader.join(&a));
    assert_eq!(non_delete_text(&diffs), ConcatReader.join(&b));
}
