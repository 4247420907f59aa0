//! Store Tree Merging
//!
//! Recursive fold of one store into another: groups are mirrored, datasets merged by
//! kind, and dataset attributes combined after their data.

pub mod attributes;
pub mod dataset;
pub mod walker;

pub use walker::{merge, MergeStats};

/// Number of raw-run records each side of a fold represents.
///
/// A destination weight of 0 marks an empty destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Weights {
    pub source: u64,
    pub dest: u64,
}
