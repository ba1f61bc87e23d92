//! Delta serialization (§6): a compact, tab-joined text form of a diff list
//! — `=n` / `-n` / `+payload` tokens — plus the URL-style escaping its
//! insert payloads use.

use super::{Diff, Operation};
use crate::error::{Error, Result};
use crate::symbol::{FromText, Symbol, SymbolData};

/// Bytes that never need escaping.
fn is_always_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.')
}

/// Percent-encoded sequences (lower-case hex only) that are restored to
/// their literal character after the initial byte-for-byte escape. This is
/// the exact reserved set of `encodeURI`'s "never escape" characters beyond
/// the unreserved set above; anything not in this list (e.g. `*`, space)
/// stays percent-escaped.
const RESTORE: &[(&str, &str)] = &[
    ("%21", "!"),
    ("%7e", "~"),
    ("%27", "'"),
    ("%28", "("),
    ("%29", ")"),
    ("%3b", ";"),
    ("%2f", "/"),
    ("%3f", "?"),
    ("%3a", ":"),
    ("%40", "@"),
    ("%26", "&"),
    ("%3d", "="),
    ("%2b", "+"),
    ("%24", "$"),
    ("%2c", ","),
    ("%23", "#"),
];

/// Encodes `text` for use as a delta insert payload: percent-escape every
/// byte outside the unreserved set (lower-case hex), then restore the fixed
/// reserved set back to their literal form.
pub fn url_encode(text: &str) -> String {
    let mut raw = String::with_capacity(text.len());
    for b in text.as_bytes() {
        if is_always_unreserved(*b) {
            raw.push(*b as char);
        } else {
            raw.push_str(&format!("%{:02x}", b));
        }
    }
    for (enc, lit) in RESTORE {
        raw = raw.replace(enc, lit);
    }
    raw
}

/// Inverse of [`url_encode`]. A literal `+` is re-escaped to `%2b` before
/// the percent-unescape pass, guarding against a downstream consumer that
/// treats `+` as a space (the classic form-encoding convention) even though
/// this decoder itself does not.
pub fn url_decode(text: &str) -> Result<String> {
    let guarded = text.replace('+', "%2b");
    let bytes = guarded.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if i + 2 >= bytes.len() {
                return Err(Error::InvalidInput(format!("truncated percent-escape in {text:?}")));
            }
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3])
                .map_err(|_| Error::InvalidInput(format!("invalid percent-escape in {text:?}")))?;
            let byte = u8::from_str_radix(hex, 16)
                .map_err(|_| Error::InvalidInput(format!("invalid percent-escape %{hex} in {text:?}")))?;
            out.push(byte);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).map_err(|_| Error::InvalidInput(format!("invalid utf-8 after url-decoding {text:?}")))
}

/// Symbol or character count used for one delta token, per `char_counts`.
fn token_count<T: SymbolData>(symbols: &[Symbol<T>], char_counts: bool) -> usize {
    if char_counts {
        symbols.iter().map(|s| s.to_text().chars().count()).sum()
    } else {
        symbols.len()
    }
}

pub fn diff_to_delta<T: SymbolData>(diffs: &[Diff<T>], char_counts: bool) -> String {
    diffs
        .iter()
        .map(|d| match d.op {
            Operation::Equal => format!("={}", token_count(&d.symbols, char_counts)),
            Operation::Delete => format!("-{}", token_count(&d.symbols, char_counts)),
            Operation::Insert => {
                let text: String = d.symbols.iter().map(|s| s.to_text().into_owned()).collect();
                format!("+{}", url_encode(&text))
            }
        })
        .collect::<Vec<_>>()
        .join("\t")
}

/// Advances `start` through `source` until the cumulative character length
/// of the consumed symbols reaches exactly `chars`, for `char_counts` mode.
fn take_by_char_count<T: SymbolData>(source: &[Symbol<T>], start: usize, chars: usize) -> Result<usize> {
    let mut consumed = 0usize;
    let mut idx = start;
    while consumed < chars {
        if idx >= source.len() {
            return Err(Error::InvalidInput("delta count exceeds source length".into()));
        }
        consumed += source[idx].to_text().chars().count();
        idx += 1;
    }
    if consumed != chars {
        return Err(Error::InvalidInput("delta count does not land on a symbol boundary".into()));
    }
    Ok(idx)
}

pub fn diff_from_delta<T: FromText>(source: &[Symbol<T>], delta: &str, char_counts: bool) -> Result<Vec<Diff<T>>> {
    let mut diffs = Vec::new();
    let mut pointer = 0usize;

    for token in delta.split('\t') {
        if token.is_empty() {
            continue;
        }
        let mut chars = token.chars();
        let tag = chars.next().unwrap();
        let rest = chars.as_str();

        match tag {
            '+' => {
                let text = url_decode(rest)?;
                diffs.push(Diff::new(Operation::Insert, T::from_text(&text)));
            }
            '=' | '-' => {
                let n: i64 = rest
                    .parse()
                    .map_err(|_| Error::InvalidInput(format!("bad count in delta token {token:?}")))?;
                if n < 0 {
                    return Err(Error::InvalidInput(format!("negative count in delta token {token:?}")));
                }
                let n = n as usize;
                let end = if char_counts {
                    take_by_char_count(source, pointer, n)?
                } else {
                    let end = pointer + n;
                    if end > source.len() {
                        return Err(Error::InvalidInput("delta count exceeds source length".into()));
                    }
                    end
                };
                let symbols = source[pointer..end].to_vec();
                pointer = end;
                let op = if tag == '=' { Operation::Equal } else { Operation::Delete };
                diffs.push(Diff::new(op, symbols));
            }
            _ => return Err(Error::InvalidInput(format!("unrecognized delta opcode in {token:?}"))),
        }
    }

    if pointer != source.len() {
        return Err(Error::InvalidInput("delta does not consume the entire source".into()));
    }

    Ok(diffs)
}
