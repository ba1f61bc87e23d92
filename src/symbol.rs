//! The symbol model: a typed wrapper over a generic payload, plus the
//! sequence-level operations (slicing, search, boundary scoring) the diff,
//! match, and patch engines build on.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use std::fmt;
use std::hash::Hash;

/// A payload usable as a diff symbol: comparable, hashable (for the Bitap
/// alphabet in [`crate::rematch`]), and reducible to text for boundary
/// scoring and rendering.
pub trait SymbolData: Clone + PartialEq + Eq + Hash + fmt::Debug {
    /// The textual form of this payload, used by readers and by boundary
    /// scoring (only the first/last character of this text participates in
    /// the scoring ladder, per the Design Notes).
    fn to_text(&self) -> Cow<'_, str>;
}

impl SymbolData for char {
    fn to_text(&self) -> Cow<'_, str> {
        let mut buf = [0u8; 4];
        Cow::Owned(self.encode_utf8(&mut buf).to_string())
    }
}

impl SymbolData for String {
    fn to_text(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }
}

/// The sum-type payload the HTML and general-purpose text parsers of
/// [`crate::parser`] produce: a single character, a multi-character chunk
/// (word/line/delimited fragment), an HTML tag literal, or an HTML comment
/// literal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Payload {
    Char(char),
    Chunk(String),
    Tag(String),
    Comment(String),
}

impl SymbolData for Payload {
    fn to_text(&self) -> Cow<'_, str> {
        match self {
            Payload::Char(c) => c.to_text(),
            Payload::Chunk(s) | Payload::Tag(s) | Payload::Comment(s) => Cow::Borrowed(s.as_str()),
        }
    }
}

/// An immutable value wrapping a payload. Equality is payload equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Symbol<T>(pub T);

impl<T> Symbol<T> {
    pub fn new(value: T) -> Self {
        Symbol(value)
    }

    pub fn value(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: SymbolData> Symbol<T> {
    /// The symbol's textual form, as produced by [`SymbolData::to_text`].
    pub fn to_text(&self) -> Cow<'_, str> {
        self.0.to_text()
    }

    /// A 0–5 rating of how natural a break between `self` and `next` is.
    ///
    /// Defined over the representative last character of `self`'s text and
    /// first character of `next`'s text for the whitespace/alphanumeric
    /// checks, and over each symbol's full text for the blank-line checks
    /// (a symbol is "a blank line" when its text is nothing but line-break
    /// characters — the natural signal once line symbols carry their
    /// trailing newline).
    pub fn boundary_score(&self, next: &Symbol<T>) -> u8 {
        boundary_score_text(&self.to_text(), &next.to_text())
    }
}

static BLANKLINE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\r?\n$").unwrap());
static BLANKLINE_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\r?\n\r?\n").unwrap());

/// Core of [`Symbol::boundary_score`], factored out so it can be reused by
/// the HTML renderer's text segments, which are not wrapped in `Symbol`.
pub fn boundary_score_text(prev: &str, next: &str) -> u8 {
    let char1 = prev.chars().next_back();
    let char2 = next.chars().next();

    let (char1, char2) = match (char1, char2) {
        (Some(a), Some(b)) => (a, b),
        _ => return 0,
    };

    let nonalnum1 = !char1.is_alphanumeric();
    let nonalnum2 = !char2.is_alphanumeric();
    let whitespace1 = nonalnum1 && char1.is_whitespace();
    let whitespace2 = nonalnum2 && char2.is_whitespace();
    let linebreak1 = whitespace1 && (char1 == '\n' || char1 == '\r');
    let linebreak2 = whitespace2 && (char2 == '\n' || char2 == '\r');
    let blankline1 = linebreak1 && BLANKLINE_END.is_match(prev);
    let blankline2 = linebreak2 && BLANKLINE_START.is_match(next);

    if blankline1 || blankline2 {
        5
    } else if linebreak1 || linebreak2 {
        4
    } else if nonalnum1 && !whitespace1 && whitespace2 {
        3
    } else if whitespace1 || whitespace2 {
        2
    } else if nonalnum1 || nonalnum2 {
        1
    } else {
        0
    }
}

/// Length of the longest common prefix of two symbol sequences.
pub fn common_prefix_len<T: PartialEq>(a: &[Symbol<T>], b: &[Symbol<T>]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}

/// Length of the longest common suffix of two symbol sequences.
pub fn common_suffix_len<T: PartialEq>(a: &[Symbol<T>], b: &[Symbol<T>]) -> usize {
    a.iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

/// Length of the longest suffix of `a` that is also a prefix of `b`.
pub fn common_overlap_len<T: PartialEq>(a: &[Symbol<T>], b: &[Symbol<T>]) -> usize {
    let a_len = a.len();
    let b_len = b.len();
    if a_len == 0 || b_len == 0 {
        return 0;
    }
    let min_len = a_len.min(b_len);
    // a truncated to at most b's length, and vice versa, so overlap can't
    // exceed either sequence.
    let a = &a[a_len - min_len..];
    let b = &b[..min_len];

    for overlap in (1..=min_len).rev() {
        if a[min_len - overlap..] == b[..overlap] {
            return overlap;
        }
    }
    0
}

/// First index at which `needle` occurs in `haystack` at or after `from`.
pub fn index_of<T: PartialEq>(haystack: &[Symbol<T>], needle: &[Symbol<T>], from: usize) -> Option<usize> {
    if needle.is_empty() || from > haystack.len() {
        return None;
    }
    if needle.len() > haystack.len() {
        return None;
    }
    (from..=haystack.len() - needle.len()).find(|&i| haystack[i..i + needle.len()] == *needle)
}

/// Reconstructs symbols from the decoded text of a delta's insert token.
/// [`crate::diff::Dmp::diff_from_delta`] needs this to turn a `+payload`
/// token back into `Symbol<T>`s without knowing which parser produced the
/// original sequence.
pub trait FromText: SymbolData + Sized {
    fn from_text(text: &str) -> Vec<Symbol<Self>>;
}

impl FromText for char {
    fn from_text(text: &str) -> Vec<Symbol<char>> {
        text.chars().map(Symbol::new).collect()
    }
}

impl FromText for Payload {
    /// An inserted run decodes to a single [`Payload::Chunk`] — delta
    /// encoding does not preserve which parser (words, lines, HTML) produced
    /// the original symbol boundaries inside an insert, only its text.
    fn from_text(text: &str) -> Vec<Symbol<Payload>> {
        if text.is_empty() {
            Vec::new()
        } else {
            vec![Symbol::new(Payload::Chunk(text.to_string()))]
        }
    }
}

/// Last index at which `needle` occurs in `haystack` at or before `from`.
pub fn last_index_of<T: PartialEq>(haystack: &[Symbol<T>], needle: &[Symbol<T>], from: usize) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    let max_start = (haystack.len() - needle.len()).min(from);
    (0..=max_start)
        .rev()
        .find(|&i| haystack[i..i + needle.len()] == *needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn syms(s: &str) -> Vec<Symbol<char>> {
        s.chars().map(Symbol::new).collect()
    }

    #[test]
    fn common_prefix_basic() {
        assert_eq!(common_prefix_len(&syms("abcde"), &syms("abxyz")), 2);
        assert_eq!(common_prefix_len(&syms(""), &syms("abc")), 0);
    }

    #[test]
    fn common_suffix_basic() {
        assert_eq!(common_suffix_len(&syms("abcxyz"), &syms("qqqxyz")), 3);
    }

    #[test]
    fn common_overlap_basic() {
        assert_eq!(common_overlap_len(&syms("abcd"), &syms("cdef")), 2);
        assert_eq!(common_overlap_len(&syms(""), &syms("abc")), 0);
        assert_eq!(common_overlap_len(&syms("abc"), &syms("abc")), 3);
    }

    #[test]
    fn index_of_basic() {
        let hay = syms("the quick brown fox");
        let needle = syms("quick");
        assert_eq!(index_of(&hay, &needle, 0), Some(4));
        assert_eq!(index_of(&hay, &needle, 5), None);
    }

    #[test]
    fn boundary_score_range() {
        for prev in ["a", " ", "\n", ".", "\n\n"] {
            for next in ["b", " ", "\n", ".", "\n\n"] {
                let score = boundary_score_text(prev, next);
                assert!(score <= 5);
            }
        }
    }

    #[test]
    fn boundary_score_blank_line_highest() {
        // A symbol that is itself a blank line scores the transition at 5.
        assert_eq!(boundary_score_text("foo\n\n", "bar"), 5);
        assert_eq!(boundary_score_text("foo", "\n\nbar"), 5);
    }

    #[test]
    fn boundary_score_plain_linebreak() {
        assert_eq!(boundary_score_text("foo\n", "bar"), 4);
    }

    #[test]
    fn boundary_score_whitespace() {
        assert_eq!(boundary_score_text("foo ", "bar"), 2);
    }

    #[test]
    fn boundary_score_non_alnum() {
        assert_eq!(boundary_score_text("foo,", "bar"), 1);
    }

    #[test]
    fn boundary_score_none() {
        assert_eq!(boundary_score_text("foo", "bar"), 0);
    }
}
