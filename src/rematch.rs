//! Fuzzy substring matching (§4.D): a Baeza-Yates/Gonnet ("Bitap") search
//! bounded to patterns of at most `match_max_bits` symbols, used by
//! [`crate::patch::Dmp::patch_apply`] to relocate a patch's pattern when the
//! target text has shifted.

use crate::engine::Dmp;
use crate::symbol::{Symbol, SymbolData};
use std::collections::HashMap;

impl Dmp {
    /// Locates `pattern` in `text`, starting the search near `loc`. Returns
    /// `None` if nothing scores at or below `match_threshold`.
    ///
    /// Delegates to exact search when `pattern` is empty (no match) or when
    /// `text == pattern` lines up trivially; otherwise falls back to
    /// [`Self::match_bitap`].
    pub fn match_main<T: SymbolData>(&self, text: &[Symbol<T>], pattern: &[Symbol<T>], loc: usize) -> Option<usize> {
        let loc = loc.min(text.len());

        if text == pattern {
            return Some(0);
        }
        if text.is_empty() || pattern.is_empty() {
            return None;
        }
        if loc + pattern.len() <= text.len() && text[loc..loc + pattern.len()] == *pattern {
            return Some(loc);
        }
        if pattern.len() as i32 > self.match_max_bits {
            // The bit-vector core only has room for match_max_bits symbols;
            // beyond that, only the exact alignment check above can match.
            return None;
        }

        self.match_bitap(text, pattern, loc)
    }

    /// Bitap search proper: builds an alphabet-hash mapping each distinct
    /// symbol to a bitmask of the positions it occupies in `pattern`, then
    /// for increasing edit distance `d` runs a nested binary search to
    /// bound the region of `text` worth checking, deriving each row from
    /// the previous one. Stops at the first `d` producing a candidate
    /// scoring at or under `match_threshold`.
    fn match_bitap<T: SymbolData>(&self, text: &[Symbol<T>], pattern: &[Symbol<T>], loc: usize) -> Option<usize> {
        let pattern_len = pattern.len();
        debug_assert!(pattern_len as i32 <= self.match_max_bits);

        let alphabet = Self::alphabet(pattern);
        let matchmask: u32 = 1u32 << (pattern_len - 1);

        let mut best_loc: Option<usize> = None;
        let mut score_threshold = self.match_threshold;

        let mut bin_max = pattern_len + text.len();
        let mut last_rd: Vec<u32> = Vec::new();

        for d in 0..pattern_len {
            let mut bin_min = 0usize;
            let mut bin_mid = bin_max;
            while bin_min < bin_mid {
                if self.match_bitap_score(d, loc + bin_mid, loc, pattern_len) <= score_threshold {
                    bin_min = bin_mid;
                } else {
                    bin_max = bin_mid;
                }
                bin_mid = (bin_max - bin_min) / 2 + bin_min;
            }
            bin_max = bin_mid;

            let mut start = 1.max(loc as isize - bin_mid as isize + 1) as usize;
            let finish = (loc + bin_mid).min(text.len()) + pattern_len;

            let mut rd = vec![0u32; finish + 2];
            rd[finish + 1] = (1u32 << d) - 1;

            let mut j = finish;
            while j >= start {
                let char_match = if j > text.len() {
                    0u32
                } else {
                    *alphabet.get(text[j - 1].value()).unwrap_or(&0)
                };

                rd[j] = if d == 0 {
                    ((rd[j + 1] << 1) | 1) & char_match
                } else {
                    (((rd[j + 1] << 1) | 1) & char_match)
                        | (((last_rd.get(j + 1).copied().unwrap_or(0) | last_rd.get(j).copied().unwrap_or(0)) << 1) | 1)
                        | last_rd.get(j + 1).copied().unwrap_or(0)
                };

                if rd[j] & matchmask != 0 {
                    let score = self.match_bitap_score(d, j - 1, loc, pattern_len);
                    if score <= score_threshold {
                        score_threshold = score;
                        best_loc = Some(j - 1);
                        if best_loc.unwrap() > loc {
                            start = 1.max(2 * loc as isize - best_loc.unwrap() as isize) as usize;
                        } else {
                            break;
                        }
                    }
                }

                if j == 0 {
                    break;
                }
                j -= 1;
            }

            if self.match_bitap_score(d + 1, loc, loc, pattern_len) > score_threshold {
                break;
            }
            last_rd = rd;
        }

        best_loc
    }

    /// `score = d/pattern_len + |x - loc|/match_distance`, clamped so a
    /// `match_distance` of 0 never divides by zero.
    fn match_bitap_score(&self, d: usize, x: usize, loc: usize, pattern_len: usize) -> f64 {
        let accuracy = d as f64 / pattern_len as f64;
        let proximity = x.abs_diff(loc) as f64;
        if self.match_distance == 0 {
            if proximity == 0.0 {
                accuracy
            } else {
                1.0
            }
        } else {
            accuracy + proximity / self.match_distance as f64
        }
    }

    fn alphabet<T: SymbolData>(pattern: &[Symbol<T>]) -> HashMap<T, u32> {
        let pattern_len = pattern.len();
        let mut map = HashMap::new();
        for (i, s) in pattern.iter().enumerate() {
            let bit = 1u32 << (pattern_len - 1 - i);
            map.entry(s.value().clone()).and_modify(|m| *m |= bit).or_insert(bit);
        }
        map
    }
}
