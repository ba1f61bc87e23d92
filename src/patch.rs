//! Context-aware patches (§4.E): a patch bundles a run of diffs together
//! with enough surrounding equal-symbol context to relocate itself against
//! a text that has since shifted, via [`crate::rematch::Dmp::match_main`].

use crate::diff::{Diff, Operation};
use crate::engine::Dmp;
use crate::error::{Error, Result};
use crate::symbol::{index_of, last_index_of, Symbol, SymbolData};

/// One hunk: a run of diffs plus the symbol ranges it covers in the source
/// (`start1`/`length1`) and destination (`start2`/`length2`) sequences.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Patch<T> {
    pub diffs: Vec<Diff<T>>,
    pub start1: usize,
    pub start2: usize,
    pub length1: usize,
    pub length2: usize,
}

impl<T> Patch<T> {
    fn empty() -> Self {
        Patch { diffs: Vec::new(), start1: 0, start2: 0, length1: 0, length2: 0 }
    }
}

fn diffs_text1<T: SymbolData>(diffs: &[Diff<T>]) -> Vec<Symbol<T>> {
    diffs
        .iter()
        .filter(|d| d.op != Operation::Insert)
        .flat_map(|d| d.symbols.clone())
        .collect()
}

fn diffs_text2<T: SymbolData>(diffs: &[Diff<T>]) -> Vec<Symbol<T>> {
    diffs
        .iter()
        .filter(|d| d.op != Operation::Delete)
        .flat_map(|d| d.symbols.clone())
        .collect()
}

impl Dmp {
    /// Diffs `a` against `b` (cleaning up the result when it's non-trivial)
    /// and turns the diff into context-bearing patches.
    pub fn patch_make_from_texts<T: SymbolData>(&self, a: &[Symbol<T>], b: &[Symbol<T>]) -> Vec<Patch<T>> {
        let mut diffs = self.diff_main(a, b);
        if diffs.len() > 2 {
            self.diff_cleanup_semantic(&mut diffs);
            self.diff_cleanup_efficiency(&mut diffs);
        }
        self.patch_make(a, &diffs)
    }

    /// Turns a diff list into patches, reconstructing `text1` (the
    /// pre-image) from the diff's equal/delete runs.
    pub fn patch_make_from_diffs<T: SymbolData>(&self, diffs: &[Diff<T>]) -> Vec<Patch<T>> {
        let text1 = diffs_text1(diffs);
        self.patch_make(&text1, diffs)
    }

    /// Turns a diff list (already computed against `text1`) into patches.
    pub fn patch_make<T: SymbolData>(&self, text1: &[Symbol<T>], diffs: &[Diff<T>]) -> Vec<Patch<T>> {
        if diffs.is_empty() {
            return Vec::new();
        }

        let mut patches = Vec::new();
        let mut patch = Patch::empty();
        let mut char_count1 = 0usize;
        let mut char_count2 = 0usize;
        let mut prepatch_text: Vec<Symbol<T>> = text1.to_vec();
        let mut postpatch_text: Vec<Symbol<T>> = text1.to_vec();

        for (i, d) in diffs.iter().enumerate() {
            if patch.diffs.is_empty() && d.op != Operation::Equal {
                patch.start1 = char_count1;
                patch.start2 = char_count2;
            }

            match d.op {
                Operation::Insert => {
                    patch.length2 += d.symbols.len();
                    let at = char_count2.min(postpatch_text.len());
                    postpatch_text.splice(at..at, d.symbols.clone());
                    patch.diffs.push(d.clone());
                }
                Operation::Delete => {
                    patch.length1 += d.symbols.len();
                    let at = char_count2.min(postpatch_text.len());
                    let end = (at + d.symbols.len()).min(postpatch_text.len());
                    postpatch_text.splice(at..end, []);
                    patch.diffs.push(d.clone());
                }
                Operation::Equal => {
                    if d.symbols.len() <= 2 * self.patch_margin as usize && !patch.diffs.is_empty() && i + 1 != diffs.len() {
                        patch.diffs.push(d.clone());
                        patch.length1 += d.symbols.len();
                        patch.length2 += d.symbols.len();
                    } else if d.symbols.len() >= 2 * self.patch_margin as usize && !patch.diffs.is_empty() {
                        self.patch_add_context(&mut patch, &prepatch_text);
                        patches.push(patch);
                        patch = Patch::empty();
                        prepatch_text = postpatch_text.clone();
                        char_count1 = char_count2;
                    }
                }
            }

            if d.op != Operation::Insert {
                char_count1 += d.symbols.len();
            }
            if d.op != Operation::Delete {
                char_count2 += d.symbols.len();
            }
        }

        if !patch.diffs.is_empty() {
            self.patch_add_context(&mut patch, &prepatch_text);
            patches.push(patch);
        }

        patches
    }

    /// Grows `patch` with up to `patch_margin` symbols of equal context on
    /// each side, widening further (up to `match_max_bits - 2*patch_margin`)
    /// if the pattern would otherwise be ambiguous (occur more than once in
    /// `text`).
    fn patch_add_context<T: SymbolData>(&self, patch: &mut Patch<T>, text: &[Symbol<T>]) {
        if text.is_empty() {
            return;
        }

        let mut pattern_start = patch.start2;
        let mut pattern_end = (patch.start2 + patch.length1).min(text.len());
        let mut padding = 0usize;

        let max_pattern_len = (self.match_max_bits - 2 * self.patch_margin).max(0) as usize;
        loop {
            let pattern = &text[pattern_start.min(text.len())..pattern_end];
            let occurs_once = index_of(text, pattern, 0) == last_index_of(text, pattern, text.len());
            if occurs_once || pattern.len() >= max_pattern_len {
                break;
            }
            padding += self.patch_margin as usize;
            pattern_start = patch.start2.saturating_sub(padding);
            pattern_end = (patch.start2 + patch.length1 + padding).min(text.len());
        }

        padding += self.patch_margin as usize;

        let prefix_start = patch.start2.saturating_sub(padding);
        let prefix = text[prefix_start..patch.start2.min(text.len())].to_vec();
        if !prefix.is_empty() {
            let mut diffs = vec![Diff::new(Operation::Equal, prefix.clone())];
            diffs.extend(patch.diffs.drain(..));
            patch.diffs = diffs;
        }

        let suffix_start = (patch.start2 + patch.length1).min(text.len());
        let suffix_end = (suffix_start + padding).min(text.len());
        let suffix = text[suffix_start..suffix_end].to_vec();
        if !suffix.is_empty() {
            patch.diffs.push(Diff::new(Operation::Equal, suffix.clone()));
        }

        patch.start1 = patch.start1.saturating_sub(prefix.len());
        patch.start2 = patch.start2.saturating_sub(prefix.len());
        patch.length1 += prefix.len() + suffix.len();
        patch.length2 += prefix.len() + suffix.len();
    }

    /// Splits any patch whose source span exceeds `match_max_bits` symbols
    /// into several smaller patches stitched together with overlapping
    /// equal-context, so every patch's pattern stays within what
    /// [`crate::rematch::Dmp::match_main`] can search for.
    fn patch_split_max<T: SymbolData>(&self, patches: &mut Vec<Patch<T>>) {
        let patch_size = self.match_max_bits.max(0) as usize;
        if patch_size == 0 {
            return;
        }

        let mut x = 0usize;
        while x < patches.len() {
            if patches[x].length1 <= patch_size {
                x += 1;
                continue;
            }

            let bigpatch = patches.remove(x);
            let mut start1 = bigpatch.start1;
            let mut start2 = bigpatch.start2;
            let mut precontext: Vec<Symbol<T>> = Vec::new();
            let mut remaining: std::collections::VecDeque<Diff<T>> = bigpatch.diffs.into_iter().collect();
            let mut insert_at = x;

            while !remaining.is_empty() {
                let mut patch = Patch::empty();
                let mut empty = true;
                patch.start1 = start1.saturating_sub(precontext.len());
                patch.start2 = start2.saturating_sub(precontext.len());
                if !precontext.is_empty() {
                    patch.length1 = precontext.len();
                    patch.length2 = precontext.len();
                    patch.diffs.push(Diff::new(Operation::Equal, precontext.clone()));
                }

                while !remaining.is_empty() && patch.length1 < patch_size.saturating_sub(self.patch_margin as usize) {
                    let d = remaining.front().unwrap().clone();
                    match d.op {
                        Operation::Insert => {
                            patch.length2 += d.symbols.len();
                            start2 += d.symbols.len();
                            patch.diffs.push(remaining.pop_front().unwrap());
                            empty = false;
                        }
                        Operation::Delete
                            if patch.diffs.len() == 1
                                && patch.diffs[0].op == Operation::Equal
                                && d.symbols.len() > 2 * patch_size =>
                        {
                            patch.length1 += d.symbols.len();
                            start1 += d.symbols.len();
                            empty = false;
                            patch.diffs.push(d);
                            remaining.pop_front();
                        }
                        _ => {
                            let take = patch_size.saturating_sub(patch.length1).saturating_sub(self.patch_margin as usize);
                            let take = take.min(d.symbols.len());
                            let piece = d.symbols[..take].to_vec();
                            patch.length1 += piece.len();
                            start1 += piece.len();
                            if d.op == Operation::Equal {
                                patch.length2 += piece.len();
                                start2 += piece.len();
                            } else {
                                empty = false;
                            }
                            patch.diffs.push(Diff::new(d.op, piece.clone()));
                            if piece.len() == d.symbols.len() {
                                remaining.pop_front();
                            } else {
                                remaining[0].symbols.drain(..piece.len());
                            }
                        }
                    }
                }

                precontext = diffs_text2(&patch.diffs);
                let keep = self.patch_margin.max(0) as usize;
                if precontext.len() > keep {
                    precontext = precontext[precontext.len() - keep..].to_vec();
                }

                let remaining_text1 = diffs_text1(&remaining.iter().cloned().collect::<Vec<_>>());
                let postcontext_len = (self.patch_margin.max(0) as usize).min(remaining_text1.len());
                let postcontext = remaining_text1[..postcontext_len].to_vec();
                if !postcontext.is_empty() {
                    patch.length1 += postcontext.len();
                    patch.length2 += postcontext.len();
                    if let Some(last) = patch.diffs.last_mut() {
                        if last.op == Operation::Equal {
                            last.symbols.extend(postcontext.clone());
                        } else {
                            patch.diffs.push(Diff::new(Operation::Equal, postcontext));
                        }
                    } else {
                        patch.diffs.push(Diff::new(Operation::Equal, postcontext));
                    }
                }

                if !empty {
                    patches.insert(insert_at, patch);
                    insert_at += 1;
                }
            }

            x = insert_at;
        }
    }

    /// Applies `patches` to `text`, relocating each patch's pattern via
    /// [`crate::rematch::Dmp::match_main`] when it no longer lines up
    /// exactly. Returns the patched sequence and one success flag per
    /// patch, in order.
    pub fn patch_apply<T: SymbolData>(&self, patches: &[Patch<T>], text: &[Symbol<T>]) -> (Vec<Symbol<T>>, Vec<bool>) {
        if patches.is_empty() {
            return (text.to_vec(), Vec::new());
        }

        let mut patches = patches.to_vec();
        self.patch_split_max(&mut patches);

        let mut text = text.to_vec();
        let mut delta: isize = 0;
        let mut results = Vec::with_capacity(patches.len());

        for patch in &patches {
            let expected_loc = (patch.start2 as isize + delta).max(0) as usize;
            let text1 = diffs_text1(&patch.diffs);

            let (start_loc, end_loc) = if text1.len() as i32 > self.match_max_bits {
                let head = &text1[..self.match_max_bits as usize];
                let head_loc = self.match_main(&text, head, expected_loc);
                match head_loc {
                    Some(head_loc) => {
                        let tail_start = text1.len() - self.match_max_bits as usize;
                        let tail = &text1[tail_start..];
                        let tail_loc = self.match_main(&text, tail, expected_loc + tail_start);
                        match tail_loc {
                            Some(tail_loc) if tail_loc > head_loc => (Some(head_loc), Some(tail_loc)),
                            _ => (None, None),
                        }
                    }
                    None => (None, None),
                }
            } else {
                (self.match_main(&text, &text1, expected_loc), None)
            };

            match start_loc {
                None => {
                    results.push(false);
                    delta -= patch.length2 as isize - patch.length1 as isize;
                }
                Some(start_loc) => {
                    delta = start_loc as isize - patch.start2 as isize;

                    let text2_end = match end_loc {
                        None => (start_loc + text1.len()).min(text.len()),
                        Some(end_loc) => (end_loc + self.match_max_bits as usize).min(text.len()),
                    };
                    let text2 = text[start_loc..text2_end].to_vec();

                    if text1 == text2 {
                        let insert = diffs_text2(&patch.diffs);
                        let end = (start_loc + text1.len()).min(text.len());
                        text.splice(start_loc..end, insert);
                        results.push(true);
                    } else {
                        let sub_diffs = self.diff_main(&text1, &text2);
                        let mismatch_too_large = text1.len() as i32 > self.match_max_bits
                            && self.diff_levenshtein(&sub_diffs) as f64 / text1.len() as f64 > self.patch_delete_threshold;

                        if mismatch_too_large {
                            results.push(false);
                        } else {
                            let mut sub_diffs = sub_diffs;
                            self.diff_cleanup_semantic_lossless(&mut sub_diffs);

                            let mut index1 = 0usize;
                            for m in &patch.diffs {
                                let index2 = if m.op != Operation::Equal { self.diff_x_index(&sub_diffs, index1) } else { 0 };
                                match m.op {
                                    Operation::Insert => {
                                        let at = (start_loc + index2).min(text.len());
                                        text.splice(at..at, m.symbols.clone());
                                    }
                                    Operation::Delete => {
                                        let from = (start_loc + index2).min(text.len());
                                        let to_index2 = self.diff_x_index(&sub_diffs, index1 + m.symbols.len());
                                        let to = (start_loc + to_index2).min(text.len()).max(from);
                                        text.splice(from..to, []);
                                    }
                                    Operation::Equal => {}
                                }
                                if m.op != Operation::Delete {
                                    index1 += m.symbols.len();
                                }
                            }
                            results.push(true);
                        }
                    }
                }
            }
        }

        (text, results)
    }

    /// A structural deep copy: every patch's diff list is cloned
    /// independently, so mutating one copy (e.g. during
    /// [`Self::patch_apply`]'s internal splitting) never aliases another.
    pub fn patch_deep_copy<T: SymbolData>(&self, patches: &[Patch<T>]) -> Vec<Patch<T>> {
        patches.to_vec()
    }

    /// Serializes patches to the unified-diff-style text form: one
    /// `@@ -start1,len1 +start2,len2 @@` header per patch (1-based,
    /// omitting `,len` when `len == 1`), followed by ` `/`-`/`+`-prefixed
    /// context/delete/insert lines.
    pub fn patch_to_text<T: SymbolData>(&self, patches: &[Patch<T>]) -> String {
        patches.iter().map(patch_to_string).collect()
    }

    /// Parses the text form produced by [`Self::patch_to_text`].
    pub fn patch_from_text<T: FromPatchText>(&self, text: &str) -> Result<Vec<Patch<T>>> {
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let mut patches = Vec::new();
        let lines: Vec<&str> = text.split('\n').collect();
        let mut i = 0usize;

        while i < lines.len() {
            if lines[i].is_empty() {
                i += 1;
                continue;
            }
            let header = parse_patch_header(lines[i])?;
            let mut patch = Patch::<T>::empty();
            patch.start1 = header.start1;
            patch.length1 = header.length1;
            patch.start2 = header.start2;
            patch.length2 = header.length2;
            i += 1;

            while i < lines.len() {
                let line = lines[i];
                if line.is_empty() {
                    i += 1;
                    continue;
                }
                let sign = line.chars().next().unwrap();
                if sign == '@' {
                    break;
                }
                let decoded = crate::diff::url_decode(&line[1..])?;
                let symbols = T::from_patch_text(&decoded);
                match sign {
                    '-' => patch.diffs.push(Diff::new(Operation::Delete, symbols)),
                    '+' => patch.diffs.push(Diff::new(Operation::Insert, symbols)),
                    ' ' => patch.diffs.push(Diff::new(Operation::Equal, symbols)),
                    _ => return Err(Error::InvalidInput(format!("invalid patch line mode {sign:?} in {line:?}"))),
                }
                i += 1;
            }

            patches.push(patch);
        }

        Ok(patches)
    }
}

/// Same idea as [`crate::symbol::FromText`], but for the patch text format,
/// which uses literal spaces rather than `%20` (see [`patch_line_encode`]).
pub trait FromPatchText: SymbolData + Sized {
    fn from_patch_text(text: &str) -> Vec<Symbol<Self>>;
}

impl FromPatchText for char {
    fn from_patch_text(text: &str) -> Vec<Symbol<char>> {
        text.chars().map(Symbol::new).collect()
    }
}

impl FromPatchText for crate::symbol::Payload {
    fn from_patch_text(text: &str) -> Vec<Symbol<crate::symbol::Payload>> {
        if text.is_empty() {
            Vec::new()
        } else {
            vec![Symbol::new(crate::symbol::Payload::Chunk(text.to_string()))]
        }
    }
}

/// `url_encode`, but with escaped spaces restored to literal spaces — the
/// convention patch text lines use (unlike delta payloads, which keep
/// spaces escaped).
fn patch_line_encode<T: SymbolData>(symbols: &[Symbol<T>]) -> String {
    let text: String = symbols.iter().map(|s| s.to_text().into_owned()).collect();
    crate::diff::url_encode(&text).replace("%20", " ")
}

fn patch_to_string<T: SymbolData>(patch: &Patch<T>) -> String {
    let coords1 = format_coords(patch.start1, patch.length1);
    let coords2 = format_coords(patch.start2, patch.length2);
    let mut out = format!("@@ -{coords1} +{coords2} @@\n");
    for d in &patch.diffs {
        let op = match d.op {
            Operation::Insert => '+',
            Operation::Delete => '-',
            Operation::Equal => ' ',
        };
        out.push(op);
        out.push_str(&patch_line_encode(&d.symbols));
        out.push('\n');
    }
    out
}

fn format_coords(start: usize, length: usize) -> String {
    match length {
        0 => format!("{start},0"),
        1 => format!("{}", start + 1),
        n => format!("{},{}", start + 1, n),
    }
}

struct PatchHeader {
    start1: usize,
    length1: usize,
    start2: usize,
    length2: usize,
}

fn parse_patch_header(line: &str) -> Result<PatchHeader> {
    let err = || Error::InvalidInput(format!("invalid patch header: {line:?}"));

    let rest = line.strip_prefix("@@ -").ok_or_else(err)?;
    let rest = rest.strip_suffix(" @@").ok_or_else(err)?;
    let (left, right) = rest.split_once(" +").ok_or_else(err)?;

    let (start1, length1) = parse_range(left).map_err(|_| err())?;
    let (start2, length2) = parse_range(right).map_err(|_| err())?;

    Ok(PatchHeader { start1, length1, start2, length2 })
}

/// Parses one `start[,length]` half of a header, applying the GNU
/// unified-diff convention: an omitted length means length 1 (and the
/// 1-based `start` is decremented); an explicit `0` length leaves `start`
/// as written (it already points at the insertion gap).
fn parse_range(s: &str) -> std::result::Result<(usize, usize), std::num::ParseIntError> {
    match s.split_once(',') {
        None => {
            let start: usize = s.parse()?;
            Ok((start.saturating_sub(1), 1))
        }
        Some((start, "0")) => {
            let start: usize = start.parse()?;
            Ok((start, 0))
        }
        Some((start, len)) => {
            let start: usize = start.parse()?;
            let len: usize = len.parse()?;
            Ok((start.saturating_sub(1), len))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_chars;

    #[test]
    fn make_and_apply_round_trip() {
        let dmp = Dmp::new();
        let a = parse_chars("The quick brown fox jumps over the lazy dog.");
        let b = parse_chars("The quick brown fox leaps over the lazy dog.");
        let patches = dmp.patch_make_from_texts(&a, &b);
        assert!(!patches.is_empty());
        let (applied, results) = dmp.patch_apply(&patches, &a);
        assert!(results.iter().all(|ok| *ok));
        assert_eq!(applied, b);
    }

    #[test]
    fn apply_tolerates_shifted_context() {
        let dmp = Dmp::new();
        let a = parse_chars("The quick brown fox jumps over the lazy dog.");
        let b = parse_chars("The quick brown fox leaps over the lazy dog.");
        let patches = dmp.patch_make_from_texts(&a, &b);

        let shifted = parse_chars("Some prefix text.\nThe quick brown fox jumps over the lazy dog.");
        let (applied, results) = dmp.patch_apply(&patches, &shifted);
        assert!(results.iter().all(|ok| *ok));
        let applied_text: String = applied.iter().map(|s| s.to_text().into_owned()).collect();
        assert!(applied_text.contains("leaps"));
    }

    #[test]
    fn to_text_and_from_text_round_trip_header() {
        let dmp = Dmp::new();
        let a = parse_chars("The quick brown fox jumps over the lazy dog.");
        let b = parse_chars("The quick brown fox leaps over the lazy dog.");
        let patches = dmp.patch_make_from_texts(&a, &b);
        let text = dmp.patch_to_text(&patches);
        assert!(text.starts_with("@@ -"));
        let parsed: Vec<Patch<crate::symbol::Payload>> = dmp.patch_from_text(&text).unwrap();
        assert_eq!(parsed.len(), patches.len());
    }

    #[test]
    fn coords_formatting_omits_length_one_and_keeps_zero() {
        assert_eq!(format_coords(0, 1), "1");
        assert_eq!(format_coords(0, 0), "0,0");
        assert_eq!(format_coords(3, 5), "4,5");
    }
}
