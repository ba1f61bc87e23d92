//! Symbol parsers and readers.
//!
//! A parser turns a string into an ordered symbol sequence; a [`Reader`]
//! turns a symbol back into a textual fragment and joins a sequence back
//! into a string.

use crate::symbol::{Payload, Symbol, SymbolData};
use std::borrow::Cow;

/// Turns a symbol back into text and joins a sequence of symbols back into
/// a string. The default join is plain concatenation, which is correct for
/// every parser in this module except [`parse_lines`] (see [`LineReader`]).
pub trait Reader<T: SymbolData> {
    fn read<'a>(&self, symbol: &'a Symbol<T>) -> Cow<'a, str> {
        symbol.to_text()
    }

    fn join(&self, symbols: &[Symbol<T>]) -> String {
        symbols.iter().map(|s| self.read(s).into_owned()).collect()
    }
}

/// Reader whose join is plain concatenation of each symbol's text.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConcatReader;

impl<T: SymbolData> Reader<T> for ConcatReader {}

/// Reader for [`parse_lines`] output: lines were split on (and stripped of)
/// `\n`, so joining re-inserts a single `\n` between consecutive lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct LineReader;

impl<T: SymbolData> Reader<T> for LineReader {
    fn join(&self, symbols: &[Symbol<T>]) -> String {
        symbols
            .iter()
            .map(|s| self.read(s).into_owned())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// One symbol per character.
pub fn parse_chars(text: &str) -> Vec<Symbol<Payload>> {
    text.chars().map(|c| Symbol::new(Payload::Char(c))).collect()
}

/// Split on `\n`. Because this is a plain (non-inclusive) split, an input
/// ending in `\n` yields a trailing empty-string symbol — pair with
/// [`LineReader`] to round-trip.
pub fn parse_lines(text: &str) -> Vec<Symbol<Payload>> {
    text.split('\n')
        .map(|line| Symbol::new(Payload::Chunk(line.to_string())))
        .collect()
}

/// Split on any character in `delims`. Each delimiter is kept attached to
/// the end of the chunk it terminates, so concatenation (via
/// [`ConcatReader`]) always reproduces the input exactly, regardless of
/// which of the delimiter characters occurred at a given split point.
pub fn parse_delimited(text: &str, delims: &[char]) -> Vec<Symbol<Payload>> {
    let mut out = Vec::new();
    let mut chunk = String::new();
    for c in text.chars() {
        chunk.push(c);
        if delims.contains(&c) {
            out.push(Symbol::new(Payload::Chunk(std::mem::take(&mut chunk))));
        }
    }
    if !chunk.is_empty() {
        out.push(Symbol::new(Payload::Chunk(chunk)));
    }
    out
}

/// Start a new symbol whenever `predicate` flips value between consecutive
/// characters; the first character always continues the symbol it starts.
pub fn parse_by_predicate(text: &str, predicate: impl Fn(char) -> bool) -> Vec<Symbol<Payload>> {
    let mut out = Vec::new();
    let mut chunk = String::new();
    let mut state: Option<bool> = None;

    for c in text.chars() {
        let p = predicate(c);
        match state {
            Some(prev) if prev == p => chunk.push(c),
            Some(_) => {
                out.push(Symbol::new(Payload::Chunk(std::mem::take(&mut chunk))));
                chunk.push(c);
                state = Some(p);
            }
            None => {
                chunk.push(c);
                state = Some(p);
            }
        }
    }
    if !chunk.is_empty() {
        out.push(Symbol::new(Payload::Chunk(chunk)));
    }
    out
}

/// Predicate-boundary parsing with "inside a letter-or-digit run" as the
/// predicate: alternates alphanumeric runs and non-alphanumeric runs
/// (whitespace and punctuation share a run unless they themselves alternate
/// with alphanumerics).
pub fn parse_words(text: &str) -> Vec<Symbol<Payload>> {
    parse_by_predicate(text, |c| c.is_alphanumeric())
}

fn starts_with_at(chars: &[char], at: usize, needle: &str) -> bool {
    let needle: Vec<char> = needle.chars().collect();
    chars.len() >= at + needle.len() && chars[at..at + needle.len()] == needle[..]
}

fn find_from(chars: &[char], from: usize, needle: &str) -> Option<usize> {
    let needle: Vec<char> = needle.chars().collect();
    if needle.is_empty() || chars.len() < needle.len() {
        return None;
    }
    (from..=chars.len() - needle.len()).find(|&i| chars[i..i + needle.len()] == needle[..])
}

/// End index (exclusive) of a `<...>` tag starting at `start`, honoring
/// quoted attribute values so a `>` inside `"..."`/`'...'` doesn't
/// terminate the tag early. Returns the length of the input if the tag is
/// never closed.
fn scan_tag_end(chars: &[char], start: usize) -> usize {
    let n = chars.len();
    let mut i = start + 1;
    let mut quote: Option<char> = None;
    while i < n {
        let c = chars[i];
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                }
            }
            None => match c {
                '"' | '\'' => quote = Some(c),
                '>' => return i + 1,
                _ => {}
            },
        }
        i += 1;
    }
    n
}

/// Tokenize HTML: one symbol per tag (`<...>`), one per comment
/// (`<!-- ... -->`, checked before tag detection), and word-level symbols
/// for the text outside tags (so a diff can isolate a single inserted or
/// deleted word inside a run of text). Joining every produced symbol's text
/// (via [`ConcatReader`]) reproduces the input exactly.
pub fn parse_html(text: &str) -> Vec<Symbol<Payload>> {
    let chars: Vec<char> = text.chars().collect();
    let n = chars.len();
    let mut out = Vec::new();
    let mut i = 0;

    while i < n {
        if starts_with_at(&chars, i, "<!--") {
            let end = find_from(&chars, i, "-->").map(|p| p + 3).unwrap_or(n);
            out.push(Symbol::new(Payload::Comment(chars[i..end].iter().collect())));
            i = end;
        } else if chars[i] == '<' {
            let end = scan_tag_end(&chars, i);
            out.push(Symbol::new(Payload::Tag(chars[i..end].iter().collect())));
            i = end;
        } else {
            let start = i;
            while i < n && chars[i] != '<' {
                i += 1;
            }
            let run: String = chars[start..i].iter().collect();
            out.extend(parse_words(&run));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn join_concat(syms: &[Symbol<Payload>]) -> String {
        ConcatReader.join(syms)
    }

    #[test]
    fn chars_round_trip() {
        let text = "hello, world!";
        let syms = parse_chars(text);
        assert_eq!(syms.len(), text.chars().count());
        assert_eq!(join_concat(&syms), text);
    }

    #[test]
    fn lines_split_and_rejoin() {
        let text = "foo\nbar\nbaz";
        let syms = parse_lines(text);
        assert_eq!(syms.len(), 3);
        assert_eq!(LineReader.join(&syms), text);
    }

    #[test]
    fn lines_retain_trailing_empty_segment() {
        let text = "foo\nbar\n";
        let syms = parse_lines(text);
        assert_eq!(syms.len(), 3);
        assert_eq!(syms[2].value(), &Payload::Chunk(String::new()));
        assert_eq!(LineReader.join(&syms), text);
    }

    #[test]
    fn delimited_round_trips_mixed_delimiters() {
        let text = "a,b;c,d;;e";
        let syms = parse_delimited(text, &[',', ';']);
        assert_eq!(join_concat(&syms), text);
    }

    #[test]
    fn predicate_boundary_first_char_continues() {
        let syms = parse_by_predicate("aab", |c| c == 'a');
        // "aa" (true run) then "b" (false run)
        assert_eq!(syms.len(), 2);
        assert_eq!(join_concat(&syms), "aab");
    }

    #[test]
    fn words_alternate_runs() {
        let syms = parse_words("Hello, brave world!");
        let texts: Vec<String> = syms.iter().map(|s| s.to_text().into_owned()).collect();
        assert_eq!(texts, vec!["Hello", ", ", "brave", " ", "world", "!"]);
        assert_eq!(join_concat(&syms), "Hello, brave world!");
    }

    #[test]
    fn html_splits_tags_comments_and_words() {
        let text = "<p>Hello <b>world</b></p>";
        let syms = parse_html(text);
        assert_eq!(join_concat(&syms), text);
        assert!(syms.iter().any(|s| matches!(s.value(), Payload::Tag(t) if t == "<p>")));
        assert!(syms.iter().any(|s| matches!(s.value(), Payload::Tag(t) if t == "<b>")));
        assert!(syms.iter().any(|s| matches!(s.value(), Payload::Tag(t) if t == "</b>")));
    }

    #[test]
    fn html_comment_takes_priority_over_tag() {
        let text = "<!-- a < b --> plain";
        let syms = parse_html(text);
        assert_eq!(join_concat(&syms), text);
        assert!(matches!(syms[0].value(), Payload::Comment(c) if c == "<!-- a < b -->"));
    }

    #[test]
    fn html_quoted_gt_does_not_close_tag() {
        let text = r#"<a title="a>b">x</a>"#;
        let syms = parse_html(text);
        assert_eq!(join_concat(&syms), text);
        assert!(matches!(syms[0].value(), Payload::Tag(t) if t == r#"<a title="a>b">"#));
    }

    #[test]
    fn html_unclosed_tag_consumes_rest() {
        let text = "<div class=broken";
        let syms = parse_html(text);
        assert_eq!(join_concat(&syms), text);
        assert_eq!(syms.len(), 1);
    }
}
