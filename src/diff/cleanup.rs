//! Normalization passes over a diff list: merge adjacent same-op runs,
//! reduce noise into semantically larger edits, snap edit boundaries to
//! natural word/line breaks, and trade a little noise reduction for fewer,
//! cheaper-to-render edits.

use super::{Diff, Operation};
use crate::symbol::{common_overlap_len, common_suffix_len, Symbol, SymbolData};

/// Merges adjacent diffs sharing an operation, factors a shared
/// prefix/suffix out of adjacent delete+insert runs into a neighboring
/// equality, drops empty diffs, and performs a second pass that slides a
/// single edit across an adjacent equality when doing so eliminates it.
pub fn diff_cleanup_merge<T: SymbolData>(diffs: &mut Vec<Diff<T>>) {
    diffs.push(Diff::new(Operation::Equal, Vec::new()));

    let mut pointer = 0usize;
    let mut count_delete = 0usize;
    let mut count_insert = 0usize;
    let mut text_delete: Vec<Symbol<T>> = Vec::new();
    let mut text_insert: Vec<Symbol<T>> = Vec::new();

    while pointer < diffs.len() {
        match diffs[pointer].op {
            Operation::Insert => {
                count_insert += 1;
                text_insert.extend(diffs[pointer].symbols.clone());
                pointer += 1;
            }
            Operation::Delete => {
                count_delete += 1;
                text_delete.extend(diffs[pointer].symbols.clone());
                pointer += 1;
            }
            Operation::Equal => {
                if count_delete + count_insert > 1 {
                    if count_delete != 0 && count_insert != 0 {
                        let common_prefix = crate::symbol::common_prefix_len(&text_insert, &text_delete);
                        if common_prefix != 0 {
                            let idx = pointer as isize - count_delete as isize - count_insert as isize - 1;
                            if idx >= 0 && diffs[idx as usize].op == Operation::Equal {
                                diffs[idx as usize].symbols.extend(text_insert[..common_prefix].to_vec());
                            } else {
                                diffs.insert(0, Diff::new(Operation::Equal, text_insert[..common_prefix].to_vec()));
                                pointer += 1;
                            }
                            text_insert.drain(0..common_prefix);
                            text_delete.drain(0..common_prefix);
                        }

                        let common_suffix = common_suffix_len(&text_insert, &text_delete);
                        if common_suffix != 0 {
                            let mut merged = text_insert[text_insert.len() - common_suffix..].to_vec();
                            merged.extend(diffs[pointer].symbols.clone());
                            diffs[pointer].symbols = merged;
                            text_insert.truncate(text_insert.len() - common_suffix);
                            text_delete.truncate(text_delete.len() - common_suffix);
                        }
                    }

                    let mut new_ops = Vec::new();
                    if !text_delete.is_empty() {
                        new_ops.push(Diff::new(Operation::Delete, text_delete.clone()));
                    }
                    if !text_insert.is_empty() {
                        new_ops.push(Diff::new(Operation::Insert, text_insert.clone()));
                    }
                    let start = pointer - count_delete - count_insert;
                    let new_len = new_ops.len();
                    diffs.splice(start..pointer, new_ops);
                    pointer = start + new_len + 1;
                } else if pointer != 0 && diffs[pointer - 1].op == Operation::Equal {
                    let moved = diffs[pointer].symbols.clone();
                    diffs[pointer - 1].symbols.extend(moved);
                    diffs.remove(pointer);
                } else {
                    pointer += 1;
                }
                count_insert = 0;
                count_delete = 0;
                text_delete.clear();
                text_insert.clear();
            }
        }
    }

    if diffs.last().map(|d| d.symbols.is_empty()).unwrap_or(false) {
        diffs.pop();
    }

    // Second pass: A<ins>BA</ins>C -> <ins>AB</ins>AC, shifting a single edit
    // across an adjacent equality whenever doing so absorbs the equality.
    let mut changes = false;
    let mut pointer = 1usize;
    while pointer + 1 < diffs.len() {
        if diffs[pointer - 1].op == Operation::Equal && diffs[pointer + 1].op == Operation::Equal {
            let prev = diffs[pointer - 1].symbols.clone();
            let next = diffs[pointer + 1].symbols.clone();
            let cur = diffs[pointer].symbols.clone();

            if cur.len() >= prev.len() && cur[cur.len() - prev.len()..] == prev[..] {
                let mut new_cur = prev.clone();
                new_cur.extend(cur[..cur.len() - prev.len()].to_vec());
                diffs[pointer].symbols = new_cur;
                let mut new_next = prev;
                new_next.extend(next);
                diffs[pointer + 1].symbols = new_next;
                diffs.remove(pointer - 1);
                changes = true;
            } else if cur.len() >= next.len() && cur[..next.len()] == next[..] {
                diffs[pointer - 1].symbols.extend(next.clone());
                let mut new_cur = cur[next.len()..].to_vec();
                new_cur.extend(next);
                diffs[pointer].symbols = new_cur;
                diffs.remove(pointer + 1);
                changes = true;
            }
        }
        pointer += 1;
    }

    if changes {
        diff_cleanup_merge(diffs);
    }
}

/// Converts short, scattered edits surrounded by a small common equality
/// into one larger delete+insert pair, then snaps remaining edit boundaries
/// to natural breaks and folds any delete/insert overlap into an equality.
pub fn diff_cleanup_semantic<T: SymbolData>(diffs: &mut Vec<Diff<T>>) {
    let mut changes = false;
    let mut equalities: Vec<usize> = Vec::new();
    let mut last_equality: Option<Vec<Symbol<T>>> = None;
    let mut pointer: isize = 0;
    let mut len_ins1 = 0usize;
    let mut len_del1 = 0usize;
    let mut len_ins2 = 0usize;
    let mut len_del2 = 0usize;

    while pointer >= 0 && (pointer as usize) < diffs.len() {
        let p = pointer as usize;
        if diffs[p].op == Operation::Equal {
            equalities.push(p);
            len_ins1 = len_ins2;
            len_del1 = len_del2;
            len_ins2 = 0;
            len_del2 = 0;
            last_equality = Some(diffs[p].symbols.clone());
        } else {
            if diffs[p].op == Operation::Insert {
                len_ins2 += diffs[p].symbols.len();
            } else {
                len_del2 += diffs[p].symbols.len();
            }
            if let Some(eq) = last_equality.clone() {
                if eq.len() <= len_ins1.max(len_del1) && eq.len() <= len_ins2.max(len_del2) {
                    let idx = *equalities.last().unwrap();
                    diffs.insert(idx, Diff::new(Operation::Delete, eq));
                    diffs[idx + 1].op = Operation::Insert;
                    equalities.pop();
                    equalities.pop();
                    pointer = match equalities.last() {
                        Some(&i) => i as isize,
                        None => -1,
                    };
                    len_ins1 = 0;
                    len_del1 = 0;
                    len_ins2 = 0;
                    len_del2 = 0;
                    last_equality = None;
                    changes = true;
                }
            }
        }
        pointer += 1;
    }

    if changes {
        diff_cleanup_merge(diffs);
    }
    diff_cleanup_semantic_lossless(diffs);

    // Factor out any overlap between a delete and a following insert into
    // an equality, preferring whichever direction overlaps more.
    let mut pointer = 1usize;
    while pointer < diffs.len() {
        if diffs[pointer - 1].op == Operation::Delete && diffs[pointer].op == Operation::Insert {
            let deletion = diffs[pointer - 1].symbols.clone();
            let insertion = diffs[pointer].symbols.clone();
            let overlap1 = common_overlap_len(&deletion, &insertion);
            let overlap2 = common_overlap_len(&insertion, &deletion);

            if overlap1 >= overlap2 {
                if 2 * overlap1 >= deletion.len() || 2 * overlap1 >= insertion.len() {
                    diffs.insert(pointer, Diff::new(Operation::Equal, insertion[..overlap1].to_vec()));
                    diffs[pointer - 1].symbols = deletion[..deletion.len() - overlap1].to_vec();
                    diffs[pointer + 1].symbols = insertion[overlap1..].to_vec();
                    pointer += 1;
                }
            } else if 2 * overlap2 >= deletion.len() || 2 * overlap2 >= insertion.len() {
                diffs.insert(pointer, Diff::new(Operation::Equal, deletion[..overlap2].to_vec()));
                diffs[pointer - 1].op = Operation::Insert;
                diffs[pointer - 1].symbols = insertion[..insertion.len() - overlap2].to_vec();
                diffs[pointer + 1].op = Operation::Delete;
                diffs[pointer + 1].symbols = deletion[overlap2..].to_vec();
                pointer += 1;
            }
        }
        pointer += 1;
    }
}

/// Slides each EQUAL/edit/EQUAL triple's boundary one symbol at a time,
/// scoring each candidate split with [`Symbol::boundary_score`] on both
/// sides, keeping whichever split scores highest (ties keep the later
/// position, biasing trailing whitespace to the end of the edit).
pub fn diff_cleanup_semantic_lossless<T: SymbolData>(diffs: &mut Vec<Diff<T>>) {
    let mut pointer = 1usize;
    while pointer + 1 < diffs.len() {
        if diffs[pointer - 1].op == Operation::Equal && diffs[pointer + 1].op == Operation::Equal {
            let mut equality1 = diffs[pointer - 1].symbols.clone();
            let mut edit = diffs[pointer].symbols.clone();
            let mut equality2 = diffs[pointer + 1].symbols.clone();

            let common_offset = common_suffix_len(&equality1, &edit);
            if common_offset != 0 {
                let common = edit[edit.len() - common_offset..].to_vec();
                equality1.truncate(equality1.len() - common_offset);
                let mut new_edit = common.clone();
                new_edit.extend(edit[..edit.len() - common_offset].to_vec());
                edit = new_edit;
                let mut new_equality2 = common;
                new_equality2.extend(equality2.clone());
                equality2 = new_equality2;
            }

            let mut best_equality1 = equality1.clone();
            let mut best_edit = edit.clone();
            let mut best_equality2 = equality2.clone();
            let mut best_score = score_pair(&equality1, &edit) + score_pair(&edit, &equality2);

            while !edit.is_empty() && !equality2.is_empty() && edit[0] == equality2[0] {
                equality1.push(edit.remove(0));
                edit.push(equality2.remove(0));
                let score = score_pair(&equality1, &edit) + score_pair(&edit, &equality2);
                if score >= best_score {
                    best_score = score;
                    best_equality1 = equality1.clone();
                    best_edit = edit.clone();
                    best_equality2 = equality2.clone();
                }
            }

            if diffs[pointer - 1].symbols != best_equality1 {
                if !best_equality1.is_empty() {
                    diffs[pointer - 1].symbols = best_equality1;
                } else {
                    diffs.remove(pointer - 1);
                    pointer = pointer.saturating_sub(1);
                }
                diffs[pointer].symbols = best_edit;
                if !best_equality2.is_empty() {
                    diffs[pointer + 1].symbols = best_equality2;
                } else {
                    diffs.remove(pointer + 1);
                    pointer = pointer.saturating_sub(1);
                }
            }
        }
        pointer += 1;
    }
}

/// Local scoring helper for the sliding window above. Differs from the
/// public [`Symbol::boundary_score`] (which stays in 0..=5, a tested
/// invariant) by treating an empty side as an unbeatable 6 — exactly
/// mirroring the reference algorithm's tie-break toward fully consuming
/// one side of the triple.
fn score_pair<T: SymbolData>(left: &[Symbol<T>], right: &[Symbol<T>]) -> u16 {
    match (left.last(), right.first()) {
        (Some(l), Some(r)) => l.boundary_score(r) as u16,
        _ => 6,
    }
}

/// Eliminates small equalities sandwiched between edits on both sides when
/// doing so costs fewer than `edit_cost` symbols worth of rendering
/// overhead — trading a little semantic noise for fewer, larger edits.
pub fn diff_cleanup_efficiency<T: SymbolData>(diffs: &mut Vec<Diff<T>>, edit_cost: i32) {
    let mut changes = false;
    let mut equalities: Vec<usize> = Vec::new();
    let mut last_equality: Option<Vec<Symbol<T>>> = None;
    let mut pointer: isize = 0;
    let mut pre_ins = false;
    let mut pre_del = false;
    let mut post_ins = false;
    let mut post_del = false;

    while pointer >= 0 && (pointer as usize) < diffs.len() {
        let p = pointer as usize;
        if diffs[p].op == Operation::Equal {
            if (diffs[p].symbols.len() as i32) < edit_cost && (post_ins || post_del) {
                equalities.push(p);
                pre_ins = post_ins;
                pre_del = post_del;
                last_equality = Some(diffs[p].symbols.clone());
            } else {
                equalities.clear();
                last_equality = None;
            }
            post_ins = false;
            post_del = false;
        } else {
            if diffs[p].op == Operation::Delete {
                post_del = true;
            } else {
                post_ins = true;
            }

            if let Some(eq) = last_equality.clone() {
                let four_of_four = pre_ins && pre_del && post_ins && post_del;
                let three_of_four = (eq.len() as i32) < edit_cost / 2
                    && [pre_ins, pre_del, post_ins, post_del].iter().filter(|x| **x).count() == 3;

                if four_of_four || three_of_four {
                    let idx = *equalities.last().unwrap();
                    diffs.insert(idx, Diff::new(Operation::Delete, eq));
                    diffs[idx + 1].op = Operation::Insert;
                    equalities.pop();
                    last_equality = None;

                    if pre_ins && pre_del {
                        post_ins = true;
                        post_del = true;
                        equalities.clear();
                    } else {
                        equalities.pop();
                        pointer = match equalities.last() {
                            Some(&i) => i as isize,
                            None => -1,
                        };
                        post_ins = false;
                        post_del = false;
                    }
                    changes = true;
                }
            }
        }
        pointer += 1;
    }

    if changes {
        diff_cleanup_merge(diffs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn syms(s: &str) -> Vec<Symbol<char>> {
        s.chars().map(Symbol::new).collect()
    }

    fn d(op: Operation, s: &str) -> Diff<char> {
        Diff::new(op, syms(s))
    }

    fn text(diffs: &[Diff<char>]) -> Vec<(Operation, String)> {
        diffs.iter().map(|x| (x.op, x.symbols.iter().map(|s| *s.value()).collect())).collect()
    }

    #[test]
    fn merge_drops_empty_and_merges_equal_runs() {
        let mut diffs = vec![d(Operation::Equal, "a"), d(Operation::Equal, "b"), d(Operation::Insert, "c")];
        diff_cleanup_merge(&mut diffs);
        assert_eq!(text(&diffs), vec![(Operation::Equal, "ab".into()), (Operation::Insert, "c".into())]);
    }

    #[test]
    fn merge_factors_common_prefix_and_suffix() {
        let mut diffs = vec![d(Operation::Delete, "axyzb"), d(Operation::Insert, "ab")];
        diff_cleanup_merge(&mut diffs);
        // common prefix 'a' and suffix 'b' between insert/delete fold into
        // equalities surrounding a single delete of "xyz".
        assert_eq!(
            text(&diffs),
            vec![(Operation::Equal, "a".into()), (Operation::Delete, "xyz".into()), (Operation::Equal, "b".into())]
        );
    }

    #[test]
    fn merge_shifts_edit_across_equality() {
        // A<ins>BA</ins>C -> <ins>AB</ins>AC
        let mut diffs = vec![d(Operation::Equal, "A"), d(Operation::Insert, "BA"), d(Operation::Equal, "C")];
        diff_cleanup_merge(&mut diffs);
        assert_eq!(text(&diffs), vec![(Operation::Insert, "AB".into()), (Operation::Equal, "AC".into())]);
    }

    #[test]
    fn semantic_eliminates_small_sandwiched_equality() {
        let mut diffs = vec![
            d(Operation::Delete, "ab"),
            d(Operation::Equal, "cd"),
            d(Operation::Delete, "e"),
            d(Operation::Equal, "f"),
            d(Operation::Insert, "g"),
        ];
        diff_cleanup_semantic(&mut diffs);
        // the small equalities "cd"/"f" are dwarfed by surrounding edits and
        // get absorbed into one delete+insert pair.
        assert!(diffs.iter().all(|x| x.op != Operation::Equal) || diffs.len() <= 3);
    }

    #[test]
    fn lossless_snaps_to_word_boundary() {
        let mut diffs = vec![
            d(Operation::Equal, "The c"),
            d(Operation::Insert, "ow and the c"),
            d(Operation::Equal, "at."),
        ];
        diff_cleanup_semantic_lossless(&mut diffs);
        assert_eq!(
            text(&diffs),
            vec![
                (Operation::Equal, "The ".into()),
                (Operation::Insert, "cow and the ".into()),
                (Operation::Equal, "cat.".into()),
            ]
        );
    }

    #[test]
    fn efficiency_merges_scattered_short_edits() {
        let mut diffs = vec![
            d(Operation::Delete, "a"),
            d(Operation::Insert, "1"),
            d(Operation::Equal, "bc"),
            d(Operation::Delete, "d"),
            d(Operation::Insert, "2"),
        ];
        diff_cleanup_efficiency(&mut diffs, 4);
        assert_eq!(diffs.iter().filter(|x| x.op == Operation::Equal).count(), 0);
    }
}
