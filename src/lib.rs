#![forbid(unsafe_code)]

//! symdiff — a symbol-generic diff/match/patch engine.
//!
//! Computes, cleans up, applies, and serializes edit scripts between two
//! sequences of symbols, and renders HTML-to-HTML diffs as valid, visually
//! marked-up HTML. "Symbol" is deliberately generic: the same engine runs
//! over characters, words, lines, or HTML tokens, by parameterizing every
//! operation over `T: SymbolData`.
//!
//! # Quick start
//!
//! ```
//! use symdiff::{parser::parse_chars, Dmp};
//!
//! let dmp = Dmp::new();
//! let a = parse_chars("The quick brown fox");
//! let b = parse_chars("The slow brown fox");
//! let diffs = dmp.diff_main(&a, &b);
//! assert_eq!(dmp.diff_levenshtein(&diffs), 4);
//! ```
//!
//! # Patching
//!
//! ```
//! use symdiff::{parser::parse_chars, Dmp};
//!
//! let dmp = Dmp::new();
//! let a = parse_chars("The quick brown fox");
//! let b = parse_chars("The slow brown fox");
//! let patches = dmp.patch_make_from_texts(&a, &b);
//! let (applied, results) = dmp.patch_apply(&patches, &a);
//! assert!(results.iter().all(|ok| *ok));
//! assert_eq!(applied, b);
//! ```
//!
//! # HTML diffing
//!
//! ```
//! use symdiff::html::{html_diff, DefaultFormatter};
//! use symdiff::Dmp;
//!
//! let dmp = Dmp::new();
//! let out = html_diff(&dmp, "<p>Hello world</p>", "<p>Hello brave world</p>", &DefaultFormatter).unwrap();
//! assert!(out.contains("<ins"));
//! ```

pub mod diff;
pub mod engine;
pub mod error;
pub mod html;
pub mod parser;
pub mod patch;
pub mod rematch;
pub mod symbol;
mod templates;

pub use diff::{Diff, Operation};
pub use engine::Dmp;
pub use error::{Error, Result};
pub use patch::{FromPatchText, Patch};
pub use symbol::{FromText, Payload, Symbol, SymbolData};
