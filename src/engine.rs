//! The engine: a bundle of the read-only configuration knobs every public
//! diff/match/patch operation is a method of.

use std::time::Duration;

/// Diff/match/patch engine configuration.
///
/// An instance is owned by one caller; its fields are read-only during an
/// operation (§5: no mutation of caller-owned sequences, no sharing of a
/// running operation across threads).
#[derive(Debug, Clone, PartialEq)]
pub struct Dmp {
    /// Wall-clock budget for [`crate::diff::Dmp::diff_main`]'s bisection
    /// search. `None` disables the deadline entirely (spec's "0/negative
    /// disables deadline", modeled as the absence of a duration).
    pub diff_timeout: Option<Duration>,
    /// Cost, in symbols, below which a small equality is eliminated by
    /// [`crate::diff::Dmp::diff_cleanup_efficiency`].
    pub diff_edit_cost: i32,
    /// Score ceiling (0.0 exact .. 1.0 none) for [`crate::rematch::Dmp::match_main`].
    pub match_threshold: f64,
    /// Proximity weight for Bitap scoring; larger values tolerate matches
    /// farther from the search hint.
    pub match_distance: i32,
    /// Maximum fraction of `text1`'s length that may be edited while still
    /// accepting a patch's fuzzy-matched location.
    pub patch_delete_threshold: f64,
    /// Number of equal symbols of rolling context kept on each side of a
    /// patch's edits.
    pub patch_margin: i32,
    /// Longest pattern Bitap can search for; also bounds how large a single
    /// patch's pattern may grow before [`crate::patch::Dmp::patch_split_max`]
    /// divides it.
    pub match_max_bits: i32,
}

impl Default for Dmp {
    fn default() -> Self {
        Self {
            diff_timeout: Some(Duration::from_secs(1)),
            diff_edit_cost: 4,
            match_threshold: 0.5,
            match_distance: 1000,
            patch_delete_threshold: 0.5,
            patch_margin: 4,
            match_max_bits: 32,
        }
    }
}

impl Dmp {
    /// A new engine with the defaults from §5.
    pub fn new() -> Self {
        Self::default()
    }
}
