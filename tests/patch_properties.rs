//! Integration tests for the patch engine's documented invariants.

use pretty_assertions::assert_eq;
use symdiff::parser::{parse_chars, ConcatReader, Reader};
use symdiff::{Dmp, Patch};

#[test]
fn patch_soundness_concrete_scenario() {
    let dmp = Dmp::new();
    let a = parse_chars("The quick brown fox jumps over the lazy dog.");
    let b = parse_chars("That quick brown fox jumped over a lazy dog.");
    let patches = dmp.patch_make_from_texts(&a, &b);
    let (applied, results) = dmp.patch_apply(&patches, &a);
    assert!(results.iter().all(|ok| *ok));
    assert_eq!(ConcatReader.join(&applied), ConcatReader.join(&b));
}

#[test]
fn patch_text_round_trip() {
    let dmp = Dmp::new();
    let a = parse_chars("The quick brown fox jumps over the lazy dog.");
    let b = parse_chars("The quick brown fox leaps over the lazy dog.");
    let patches = dmp.patch_make_from_texts(&a, &b);

    let text = dmp.patch_to_text(&patches);
    let parsed: Vec<Patch<symdiff::Payload>> = dmp.patch_from_text(&text).unwrap();
    assert_eq!(parsed.len(), patches.len());

    let text_again = dmp.patch_to_text(&parsed);
    assert_eq!(text, text_again);
}

#[test]
fn patch_apply_tolerates_a_shifted_target() {
    let dmp = Dmp::new();
    let a = parse_chars("The quick brown fox jumps over the lazy dog.");
    let b = parse_chars("The quick brown fox leaps over the lazy dog.");
    let patches = dmp.patch_make_from_texts(&a, &b);

    let mut shifted_text = String::from("Some unrelated preamble paragraph.\n\n");
    shifted_text.push_str(&ConcatReader.join(&a));
    let shifted = parse_chars(&shifted_text);

    let (applied, results) = dmp.patch_apply(&patches, &shifted);
    assert!(results.iter().all(|ok| *ok));
    assert!(ConcatReader.join(&applied).contains("leaps"));
}

#[test]
fn patch_apply_reports_failure_on_unrelated_text() {
    let dmp = Dmp::new();
    let a = parse_chars("The quick brown fox jumps over the lazy dog.");
    let b = parse_chars("The quick brown fox leaps over the lazy dog.");
    let patches = dmp.patch_make_from_texts(&a, &b);

    let unrelated = parse_chars("Completely unrelated content with no overlap whatsoever here.");
    let (_, results) = dmp.patch_apply(&patches, &unrelated);
    assert!(results.iter().any(|ok| !*ok));
}

#[test]
fn patch_deep_copy_is_independent() {
    let dmp = Dmp::new();
    let a = parse_chars("abcdefghij");
    let b = parse_chars("abcXefghij");
    let patches = dmp.patch_make_from_texts(&a, &b);
    let copy = dmp.patch_deep_copy(&patches);
    assert_eq!(copy, patches);
}

#[test]
fn large_patch_gets_split_and_still_applies() {
    let dmp = Dmp::new();
    let base = "x".repeat(200);
    let mut changed = base.clone();
    changed.replace_range(50..51, "Y");
    changed.replace_range(150..151, "Z");

    let a = parse_chars(&base);
    let b = parse_chars(&changed);
    let patches = dmp.patch_make_from_texts(&a, &b);
    let (applied, results) = dmp.patch_apply(&patches, &a);
    assert!(results.iter().all(|ok| *ok));
    assert_eq!(ConcatReader.join(&applied), changed);
}
