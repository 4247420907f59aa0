//! Integration tests for the condmerge merge engine

mod clustering;
mod fs_campaign;
mod merge_semantics;
