//! Condmerge: consolidate hierarchical run files recorded under the same experimental
//! conditions into aggregate files, with provenance.
//!
//! The merge core ([`tree`]) folds one store into another; the clustering layer
//! ([`cluster`]) decides which run files belong together and drives the merges.

pub mod cli;
pub mod cluster;
pub mod config;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod store;
pub mod tree;
