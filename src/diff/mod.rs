//! The diff engine: Myers O(ND) bisection with prefix/suffix stripping,
//! the half-match heuristic, and the cleanup/delta passes over the result.

mod cleanup;
mod delta;

pub use cleanup::{
    diff_cleanup_efficiency, diff_cleanup_merge, diff_cleanup_semantic, diff_cleanup_semantic_lossless,
};
pub use delta::{url_decode, url_encode};

use crate::engine::Dmp;
use crate::error::Result;
use crate::symbol::{common_overlap_len, common_prefix_len, common_suffix_len, index_of, FromText, Symbol, SymbolData};
use std::time::Instant;

/// The three edit operations a diff entry can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operation {
    Delete,
    Insert,
    Equal,
}

/// A contiguous run of symbols sharing one [`Operation`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diff<T> {
    pub op: Operation,
    pub symbols: Vec<Symbol<T>>,
}

impl<T> Diff<T> {
    pub fn new(op: Operation, symbols: Vec<Symbol<T>>) -> Self {
        Diff { op, symbols }
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

impl Dmp {
    /// Computes the diff between `a` and `b`: strips the common prefix and
    /// suffix, then recursively finds edits in the remainder, cleaning up the
    /// merged result before returning it. Never fails — on timeout it
    /// degrades to `[Delete(a), Insert(b)]` for whatever remainder the
    /// bisection didn't get to.
    pub fn diff_main<T: SymbolData>(&self, a: &[Symbol<T>], b: &[Symbol<T>]) -> Vec<Diff<T>> {
        let deadline = self
            .diff_timeout
            .filter(|d| !d.is_zero())
            .map(|d| Instant::now() + d);
        self.diff_main_deadline(a, b, deadline)
    }

    fn diff_main_deadline<T: SymbolData>(
        &self,
        a: &[Symbol<T>],
        b: &[Symbol<T>],
        deadline: Option<Instant>,
    ) -> Vec<Diff<T>> {
        if a == b {
            return if a.is_empty() {
                Vec::new()
            } else {
                vec![Diff::new(Operation::Equal, a.to_vec())]
            };
        }

        let prefix_len = common_prefix_len(a, b);
        let common_prefix = a[..prefix_len].to_vec();
        let a1 = &a[prefix_len..];
        let b1 = &b[prefix_len..];

        let suffix_len = common_suffix_len(a1, b1);
        let common_suffix = a1[a1.len() - suffix_len..].to_vec();
        let a_mid = &a1[..a1.len() - suffix_len];
        let b_mid = &b1[..b1.len() - suffix_len];

        let mut result = Vec::new();
        if !common_prefix.is_empty() {
            result.push(Diff::new(Operation::Equal, common_prefix));
        }
        result.extend(self.diff_compute(a_mid, b_mid, deadline));
        if !common_suffix.is_empty() {
            result.push(Diff::new(Operation::Equal, common_suffix));
        }

        cleanup::diff_cleanup_merge(&mut result);
        result
    }

    fn diff_compute<T: SymbolData>(
        &self,
        a: &[Symbol<T>],
        b: &[Symbol<T>],
        deadline: Option<Instant>,
    ) -> Vec<Diff<T>> {
        if a.is_empty() {
            return if b.is_empty() {
                Vec::new()
            } else {
                vec![Diff::new(Operation::Insert, b.to_vec())]
            };
        }
        if b.is_empty() {
            return vec![Diff::new(Operation::Delete, a.to_vec())];
        }

        let (long, short, a_is_longer) = if a.len() > b.len() { (a, b, true) } else { (b, a, false) };

        if let Some(pos) = index_of(long, short, 0) {
            let op_outer = if a_is_longer { Operation::Delete } else { Operation::Insert };
            let mut result = Vec::new();
            if pos > 0 {
                result.push(Diff::new(op_outer, long[..pos].to_vec()));
            }
            result.push(Diff::new(Operation::Equal, short.to_vec()));
            let tail = pos + short.len();
            if tail < long.len() {
                result.push(Diff::new(op_outer, long[tail..].to_vec()));
            }
            return result;
        }

        if short.len() == 1 {
            return vec![Diff::new(Operation::Delete, a.to_vec()), Diff::new(Operation::Insert, b.to_vec())];
        }

        if deadline.is_some() {
            if let Some((a_prefix, a_suffix, b_prefix, b_suffix, common)) = self.diff_half_match(a, b) {
                let mut result = self.diff_main_deadline(&a_prefix, &b_prefix, deadline);
                result.push(Diff::new(Operation::Equal, common));
                result.extend(self.diff_main_deadline(&a_suffix, &b_suffix, deadline));
                return result;
            }
        }

        self.diff_bisect(a, b, deadline)
    }

    /// The half-match heuristic: when the deadline is live, looks for a
    /// common substring covering at least half of the longer sequence,
    /// anchored at the quarter- and half-length offsets, and splits the
    /// problem into the two halves around it.
    #[allow(clippy::type_complexity)]
    fn diff_half_match<T: SymbolData>(
        &self,
        a: &[Symbol<T>],
        b: &[Symbol<T>],
    ) -> Option<(Vec<Symbol<T>>, Vec<Symbol<T>>, Vec<Symbol<T>>, Vec<Symbol<T>>, Vec<Symbol<T>>)> {
        let (long, short, a_is_long) = if a.len() > b.len() { (a, b, true) } else { (b, a, false) };
        if long.len() < 4 || short.len() * 2 < long.len() {
            return None;
        }

        let hm1 = Self::half_match_i(long, short, (long.len() + 3) / 4);
        let hm2 = Self::half_match_i(long, short, (long.len() + 1) / 2);

        let hm = match (hm1, hm2) {
            (None, None) => return None,
            (Some(h1), None) => h1,
            (None, Some(h2)) => h2,
            (Some(h1), Some(h2)) => {
                if h1.4.len() >= h2.4.len() {
                    h1
                } else {
                    h2
                }
            }
        };

        let (long_a, long_b, short_a, short_b, common) = hm;
        if a_is_long {
            Some((long_a, long_b, short_a, short_b, common))
        } else {
            Some((short_a, short_b, long_a, long_b, common))
        }
    }

    #[allow(clippy::type_complexity)]
    fn half_match_i<T: SymbolData>(
        long: &[Symbol<T>],
        short: &[Symbol<T>],
        i: usize,
    ) -> Option<(Vec<Symbol<T>>, Vec<Symbol<T>>, Vec<Symbol<T>>, Vec<Symbol<T>>, Vec<Symbol<T>>)> {
        let seed = &long[i..i + long.len() / 4];
        let mut best: Option<(Vec<Symbol<T>>, Vec<Symbol<T>>, Vec<Symbol<T>>, Vec<Symbol<T>>, Vec<Symbol<T>>)> = None;
        let mut best_len = 0usize;

        let mut from = 0usize;
        while let Some(j) = index_of(short, seed, from) {
            from = j + 1;
            let prefix_len = common_prefix_len(&long[i..], &short[j..]);
            let suffix_len = common_suffix_len(&long[..i], &short[..j]);
            if best_len < suffix_len + prefix_len {
                best_len = suffix_len + prefix_len;
                let mut common = short[j - suffix_len..j].to_vec();
                common.extend_from_slice(&short[j..j + prefix_len]);
                best = Some((
                    long[..i - suffix_len].to_vec(),
                    long[i + prefix_len..].to_vec(),
                    short[..j - suffix_len].to_vec(),
                    short[j + prefix_len..].to_vec(),
                    common,
                ));
            }
        }

        if best_len * 2 >= long.len() {
            best
        } else {
            None
        }
    }

    /// Myers O(ND) bisection: expands forward and reverse edit-graph
    /// frontiers simultaneously; the first `d` at which they meet gives the
    /// split point for a divide-and-conquer recursion. Falls back to
    /// `[Delete(a), Insert(b)]` if the deadline expires before the frontiers
    /// meet.
    fn diff_bisect<T: SymbolData>(&self, a: &[Symbol<T>], b: &[Symbol<T>], deadline: Option<Instant>) -> Vec<Diff<T>> {
        let a_len = a.len() as i64;
        let b_len = b.len() as i64;
        let max_d = (a_len + b_len + 1) / 2;
        let v_offset = max_d;
        let v_len = 2 * max_d;

        let mut v1 = vec![-1i64; v_len as usize];
        let mut v2 = vec![-1i64; v_len as usize];
        v1[(v_offset + 1) as usize] = 0;
        v2[(v_offset + 1) as usize] = 0;

        let delta = a_len - b_len;
        let front = delta % 2 != 0;

        let mut k1start = 0i64;
        let mut k1end = 0i64;
        let mut k2start = 0i64;
        let mut k2end = 0i64;

        for d in 0..max_d {
            if let Some(dl) = deadline {
                if Instant::now() >= dl {
                    break;
                }
            }

            let mut k1 = -d + k1start;
            while k1 <= d - k1end {
                let k1_offset = v_offset + k1;
                let mut x1 = if k1 == -d || (k1 != d && v1[(k1_offset - 1) as usize] < v1[(k1_offset + 1) as usize]) {
                    v1[(k1_offset + 1) as usize]
                } else {
                    v1[(k1_offset - 1) as usize] + 1
                };
                let mut y1 = x1 - k1;
                while x1 < a_len && y1 < b_len && a[x1 as usize] == b[y1 as usize] {
                    x1 += 1;
                    y1 += 1;
                }
                v1[k1_offset as usize] = x1;
                if x1 > a_len {
                    k1end += 2;
                } else if y1 > b_len {
                    k1start += 2;
                } else if front {
                    let k2_offset = v_offset + delta - k1;
                    if k2_offset >= 0 && k2_offset < v_len && v2[k2_offset as usize] != -1 {
                        let x2 = a_len - v2[k2_offset as usize];
                        if x1 >= x2 {
                            return self.diff_bisect_split(a, b, x1, y1, deadline);
                        }
                    }
                }
                k1 += 2;
            }

            let mut k2 = -d + k2start;
            while k2 <= d - k2end {
                let k2_offset = v_offset + k2;
                let mut x2 = if k2 == -d || (k2 != d && v2[(k2_offset - 1) as usize] < v2[(k2_offset + 1) as usize]) {
                    v2[(k2_offset + 1) as usize]
                } else {
                    v2[(k2_offset - 1) as usize] + 1
                };
                let mut y2 = x2 - k2;
                while x2 < a_len && y2 < b_len && a[(a_len - x2 - 1) as usize] == b[(b_len - y2 - 1) as usize] {
                    x2 += 1;
                    y2 += 1;
                }
                v2[k2_offset as usize] = x2;
                if x2 > a_len {
                    k2end += 2;
                } else if y2 > b_len {
                    k2start += 2;
                } else if !front {
                    let k1_offset = v_offset + delta - k2;
                    if k1_offset >= 0 && k1_offset < v_len && v1[k1_offset as usize] != -1 {
                        let x1 = v1[k1_offset as usize];
                        let y1 = v_offset + x1 - k1_offset;
                        let x2_mirror = a_len - x2;
                        if x1 >= x2_mirror {
                            return self.diff_bisect_split(a, b, x1, y1, deadline);
                        }
                    }
                }
                k2 += 2;
            }
        }

        // Deadline expired before the frontiers met; no edit script found.
        vec![Diff::new(Operation::Delete, a.to_vec()), Diff::new(Operation::Insert, b.to_vec())]
    }

    fn diff_bisect_split<T: SymbolData>(
        &self,
        a: &[Symbol<T>],
        b: &[Symbol<T>],
        x: i64,
        y: i64,
        deadline: Option<Instant>,
    ) -> Vec<Diff<T>> {
        let (a1, a2) = a.split_at(x as usize);
        let (b1, b2) = b.split_at(y as usize);
        let mut diffs = self.diff_main_deadline(a1, b1, deadline);
        diffs.extend(self.diff_main_deadline(a2, b2, deadline));
        diffs
    }

    /// In-place normalization passes, exposed as thin wrappers so every
    /// public operation reads as a method on the engine.
    pub fn diff_cleanup_merge<T: SymbolData>(&self, diffs: &mut Vec<Diff<T>>) {
        cleanup::diff_cleanup_merge(diffs)
    }

    pub fn diff_cleanup_semantic<T: SymbolData>(&self, diffs: &mut Vec<Diff<T>>) {
        cleanup::diff_cleanup_semantic(diffs)
    }

    pub fn diff_cleanup_semantic_lossless<T: SymbolData>(&self, diffs: &mut Vec<Diff<T>>) {
        cleanup::diff_cleanup_semantic_lossless(diffs)
    }

    pub fn diff_cleanup_efficiency<T: SymbolData>(&self, diffs: &mut Vec<Diff<T>>) {
        cleanup::diff_cleanup_efficiency(diffs, self.diff_edit_cost)
    }

    pub fn diff_common_prefix<T: SymbolData>(&self, a: &[Symbol<T>], b: &[Symbol<T>]) -> usize {
        common_prefix_len(a, b)
    }

    pub fn diff_common_suffix<T: SymbolData>(&self, a: &[Symbol<T>], b: &[Symbol<T>]) -> usize {
        common_suffix_len(a, b)
    }

    pub fn diff_common_overlap<T: SymbolData>(&self, a: &[Symbol<T>], b: &[Symbol<T>]) -> usize {
        common_overlap_len(a, b)
    }

    /// Maps a symbol index in `text1` (the pre-diff sequence) to the
    /// corresponding index in `text2` (post-diff), per `diffs`.
    pub fn diff_x_index<T: SymbolData>(&self, diffs: &[Diff<T>], loc: usize) -> usize {
        let mut chars1 = 0usize;
        let mut chars2 = 0usize;
        let mut last_chars1 = 0usize;
        let mut last_chars2 = 0usize;
        let mut last_op: Option<Operation> = None;

        for d in diffs {
            if d.op != Operation::Insert {
                chars1 += d.symbols.len();
            }
            if d.op != Operation::Delete {
                chars2 += d.symbols.len();
            }
            if chars1 > loc {
                last_op = Some(d.op);
                break;
            }
            last_chars1 = chars1;
            last_chars2 = chars2;
        }

        if last_op == Some(Operation::Delete) {
            last_chars2
        } else {
            last_chars2 + (loc - last_chars1)
        }
    }

    /// Symbol-level Levenshtein distance implied by an edit script: the sum,
    /// over each run of consecutive non-equal diffs, of the larger of its
    /// insertion/deletion length.
    pub fn diff_levenshtein<T: SymbolData>(&self, diffs: &[Diff<T>]) -> usize {
        let mut levenshtein = 0usize;
        let mut insertions = 0usize;
        let mut deletions = 0usize;
        for d in diffs {
            match d.op {
                Operation::Insert => insertions += d.symbols.len(),
                Operation::Delete => deletions += d.symbols.len(),
                Operation::Equal => {
                    levenshtein += insertions.max(deletions);
                    insertions = 0;
                    deletions = 0;
                }
            }
        }
        levenshtein + insertions.max(deletions)
    }

    /// Serializes a diff list to the compact delta format (§6): tab-joined
    /// `=n` / `-n` / `+payload` tokens, counts in symbols unless
    /// `char_counts` is set (then counts are `to_text()` character lengths).
    pub fn diff_to_delta<T: SymbolData>(&self, diffs: &[Diff<T>], char_counts: bool) -> String {
        delta::diff_to_delta(diffs, char_counts)
    }

    /// Reconstructs a diff list from `delta` against `source` (the original
    /// `text1` the delta was produced from — always required, never
    /// optional, so a malformed delta is caught as an error rather than a
    /// null dereference).
    pub fn diff_from_delta<T: FromText>(
        &self,
        source: &[Symbol<T>],
        delta: &str,
        char_counts: bool,
    ) -> Result<Vec<Diff<T>>> {
        delta::diff_from_delta(source, delta, char_counts)
    }
}
