//! Error types shared across the diff, match, patch, and HTML renderer modules.

use thiserror::Error;

/// Errors produced by the diff/match/patch engine and the HTML renderer.
///
/// Timeouts and failed fuzzy matches are not represented here: a timed-out
/// [`crate::diff::Dmp::diff_main`] degrades to a trivial diff, and a failed
/// [`crate::patch::Dmp::patch_apply`] match reports `false` in its result
/// vector instead of returning an `Err`.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum Error {
    /// A malformed delta, malformed patch text, a negative count, a payload
    /// that failed to decode, or a length mismatch against the source.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A patch span exceeds the bounds of its source sequence.
    #[error("patch span out of range: {0}")]
    OutOfRange(String),

    /// A consumer of [`crate::html::DiffSeg`] asked a non-container segment
    /// for its children. Indicates a programming mistake, not a data problem.
    #[error("logic error: {0}")]
    LogicError(String),
}

pub type Result<T> = std::result::Result<T, Error>;
