//! Clustering: group run files by closeness of their summary parameters, merge each
//! group into one output, and track which raw files went where.

pub mod active;
pub mod closeness;
pub mod orchestrator;
pub mod provenance;

pub use active::{ActiveUnitSet, MergeUnit, UnitKind};
pub use closeness::UnitSummary;
pub use orchestrator::{final_output_path, MergeReport, Orchestrator, OutputReport};
pub use provenance::Provenance;
