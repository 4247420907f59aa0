//! Active unit set
//!
//! The list of units still taking part in clustering. Scanning for a candidate pair
//! borrows the set immutably; applying a merge takes it mutably. The two never overlap,
//! so every mutation is followed by a fresh scan from the start of the list.

use crate::cluster::closeness::UnitSummary;
use crate::cluster::provenance::{self, Provenance};
use crate::error::MergeError;
use std::path::{Path, PathBuf};

/// Whether a unit is an untouched raw input or a produced output
#[derive(Debug, Clone, PartialEq)]
pub enum UnitKind {
    Raw,
    Output(Provenance),
}

/// A working file taking part in clustering
#[derive(Debug, Clone, PartialEq)]
pub struct MergeUnit {
    pub path: PathBuf,
    pub kind: UnitKind,
    pub summary: UnitSummary,
}

impl MergeUnit {
    pub fn raw(path: PathBuf, summary: UnitSummary) -> Self {
        Self {
            path,
            kind: UnitKind::Raw,
            summary,
        }
    }

    pub fn output(path: PathBuf, provenance: Provenance, summary: UnitSummary) -> Self {
        Self {
            path,
            kind: UnitKind::Output(provenance),
            summary,
        }
    }

    /// Name recorded in provenance: the file name, or the whole path if it has none.
    pub fn name(&self) -> String {
        unit_name(&self.path)
    }

    pub fn is_raw(&self) -> bool {
        matches!(self.kind, UnitKind::Raw)
    }

    pub fn provenance(&self) -> Option<&Provenance> {
        match &self.kind {
            UnitKind::Output(provenance) => Some(provenance),
            UnitKind::Raw => None,
        }
    }
}

/// File name of `path` as recorded in provenance.
pub fn unit_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// An ordered pair of distinct positions in the active list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidatePair {
    pub first: usize,
    pub second: usize,
}

/// The single list change a merge produces: one slot takes a new unit, another leaves.
#[derive(Debug, Clone)]
pub struct Mutation {
    pub replace_at: usize,
    pub with: MergeUnit,
    pub remove_at: usize,
}

/// Units still active, plus the raw-input total they must account for
#[derive(Debug, Clone)]
pub struct ActiveUnitSet {
    units: Vec<MergeUnit>,
    total_inputs: u64,
}

impl ActiveUnitSet {
    /// Start from raw inputs only.
    pub fn new(units: Vec<MergeUnit>) -> Self {
        let total_inputs = units
            .iter()
            .map(|unit| unit.provenance().map_or(1, |p| p.filecount))
            .sum();
        Self {
            units,
            total_inputs,
        }
    }

    pub fn units(&self) -> &[MergeUnit] {
        &self.units
    }

    pub fn into_units(self) -> Vec<MergeUnit> {
        self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn total_inputs(&self) -> u64 {
        self.total_inputs
    }

    /// First ordered pair `(i, j)`, `i != j`, in list order for which `eligible` holds.
    ///
    /// Runs over a frozen view of the list; nothing can change it mid-scan.
    pub fn find_candidate<F>(&self, mut eligible: F) -> Option<CandidatePair>
    where
        F: FnMut(&MergeUnit, &MergeUnit) -> bool,
    {
        for (first, a) in self.units.iter().enumerate() {
            for (second, b) in self.units.iter().enumerate() {
                if first != second && eligible(a, b) {
                    return Some(CandidatePair { first, second });
                }
            }
        }
        None
    }

    /// Apply one merge's list change, then re-check conservation.
    pub fn apply(&mut self, mutation: Mutation) -> Result<(), MergeError> {
        let len = self.units.len();
        if mutation.replace_at >= len
            || mutation.remove_at >= len
            || mutation.replace_at == mutation.remove_at
        {
            return Err(MergeError::InvalidMutation(format!(
                "replace {} remove {} of {}",
                mutation.replace_at, mutation.remove_at, len
            )));
        }
        self.units[mutation.replace_at] = mutation.with;
        self.units.remove(mutation.remove_at);
        self.debug_check();
        Ok(())
    }

    /// Swap the unit at `index` for `unit` without shrinking the list.
    pub fn replace(&mut self, index: usize, unit: MergeUnit) {
        self.units[index] = unit;
        self.debug_check();
    }

    pub fn unit_mut(&mut self, index: usize) -> &mut MergeUnit {
        &mut self.units[index]
    }

    /// Σ Filecount(outputs) + raw units == total inputs.
    pub fn check_conservation(&self) -> Result<(), MergeError> {
        provenance::check_conservation(self.total_inputs, &self.units)
    }

    fn debug_check(&self) {
        debug_assert!(
            self.check_conservation().is_ok(),
            "provenance conservation violated: {:?}",
            self.check_conservation()
        );
    }
}
