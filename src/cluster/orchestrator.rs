//! Clustering orchestrator
//!
//! Greedy, bottom-up grouping to a fixed point: find the first close pair in list
//! order, merge it, restart the scan. Each merge shrinks the active list by one, so the
//! loop ends after at most `N - 1` merges.

use crate::cluster::active::{unit_name, ActiveUnitSet, CandidatePair, MergeUnit, Mutation, UnitKind};
use crate::cluster::closeness::{self, UnitSummary};
use crate::cluster::provenance::Provenance;
use crate::config::MergeConfig;
use crate::discovery::path_identity;
use crate::error::MergeError;
use crate::store::{Store, StoreBackend};
use crate::tree;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// One surviving output after a campaign
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputReport {
    pub path: PathBuf,
    pub filecount: u64,
    pub inputfiles: Vec<String>,
}

/// Outcome of a merge campaign
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub total_inputs: u64,
    pub merges: usize,
    pub passes: usize,
    pub outputs: Vec<OutputReport>,
}

/// Drives a merge campaign over one storage backend
pub struct Orchestrator<'a> {
    config: MergeConfig,
    backend: &'a dyn StoreBackend,
    output_dir: PathBuf,
    input_ids: HashSet<PathBuf>,
    next_output: usize,
    merges: usize,
    passes: usize,
}

impl<'a> Orchestrator<'a> {
    pub fn new(config: MergeConfig, backend: &'a dyn StoreBackend, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            backend,
            output_dir: output_dir.into(),
            input_ids: HashSet::new(),
            next_output: 1,
            merges: 0,
            passes: 0,
        }
    }

    /// Run the whole campaign over `inputs`, in the given order.
    #[instrument(skip(self, inputs), fields(inputs = inputs.len()))]
    pub fn run(mut self, inputs: &[PathBuf]) -> Result<MergeReport, MergeError> {
        if inputs.is_empty() {
            return Err(MergeError::NoInputs);
        }
        if self.config.parameters.is_empty() {
            return Err(MergeError::NoParameters);
        }
        self.input_ids = inputs.iter().map(|path| path_identity(path)).collect();

        let mut units = self.load_inputs(inputs)?;
        info!(units = units.len(), "Starting clustering");

        while self.step(&mut units)? {}
        info!(merges = self.merges, passes = self.passes, "Reached fixed point");

        self.emit_singletons(&mut units)?;
        self.finalize_names(&mut units)?;
        units.check_conservation()?;

        let total_inputs = units.total_inputs();
        let outputs = units
            .into_units()
            .into_iter()
            .filter_map(|unit| {
                let path = unit.path.clone();
                unit.provenance().map(|p| OutputReport {
                    path,
                    filecount: p.filecount,
                    inputfiles: p.inputfiles.clone(),
                })
            })
            .collect();

        Ok(MergeReport {
            total_inputs,
            merges: self.merges,
            passes: self.passes,
            outputs,
        })
    }

    /// One scan over a frozen list, and at most one merge.
    ///
    /// Returns whether a merge happened; the caller restarts the scan when it did.
    pub fn step(&mut self, units: &mut ActiveUnitSet) -> Result<bool, MergeError> {
        self.passes += 1;
        let parameters = &self.config.parameters;
        let candidate = units.find_candidate(|a, b| closeness::close(&a.summary, &b.summary, parameters));
        let Some(pair) = candidate else {
            debug!(pass = self.passes, units = units.len(), "No eligible pair");
            return Ok(false);
        };

        let mutation = self.merge_pair(units, pair)?;
        units.apply(mutation)?;
        self.merges += 1;
        Ok(true)
    }

    fn load_inputs(&self, inputs: &[PathBuf]) -> Result<ActiveUnitSet, MergeError> {
        let mut units = Vec::with_capacity(inputs.len());
        for path in inputs {
            let store = self.backend.load(path)?;
            if Provenance::read(&store)?.is_some() {
                warn!(path = %path.display(), "Input already carries provenance, treating it as raw");
            }
            let summary = UnitSummary::from_store(&store, &unit_name(path), &self.config)?;
            debug!(path = %path.display(), weight = summary.weight, means = ?summary.means, "Loaded input");
            units.push(MergeUnit::raw(path.clone(), summary));
        }
        Ok(ActiveUnitSet::new(units))
    }

    /// Apply the move rule for a close pair and describe the resulting list change.
    fn merge_pair(&mut self, units: &ActiveUnitSet, pair: CandidatePair) -> Result<Mutation, MergeError> {
        let a = &units.units()[pair.first];
        let b = &units.units()[pair.second];
        match (&a.kind, &b.kind) {
            (UnitKind::Raw, UnitKind::Raw) => {
                let founded = self.found_output(a, b)?;
                Ok(Mutation {
                    replace_at: pair.first,
                    with: founded,
                    remove_at: pair.second,
                })
            }
            (UnitKind::Output(_), UnitKind::Raw) => Ok(Mutation {
                replace_at: pair.first,
                with: self.absorb(a, b)?,
                remove_at: pair.second,
            }),
            (UnitKind::Raw, UnitKind::Output(_)) => Ok(Mutation {
                replace_at: pair.second,
                with: self.absorb(b, a)?,
                remove_at: pair.first,
            }),
            (UnitKind::Output(_), UnitKind::Output(_)) => Ok(Mutation {
                replace_at: pair.first,
                with: self.absorb(a, b)?,
                remove_at: pair.second,
            }),
        }
    }

    /// Both raw: fold both into a brand-new output. The raw files stay on disk.
    fn found_output(&mut self, a: &MergeUnit, b: &MergeUnit) -> Result<MergeUnit, MergeError> {
        let path = self.next_output_path();
        let mut store = Store::new();

        let first = self.backend.load(&a.path)?;
        tree::merge(&first, a.summary.weight, &mut store, 0)?;
        let dest_weight = closeness::unit_weight(&store, &unit_name(&path), &self.config.weight_path)?;
        let second = self.backend.load(&b.path)?;
        tree::merge(&second, b.summary.weight, &mut store, dest_weight)?;

        let provenance = Provenance::founding(&[a.name(), b.name()]);
        let unit = self.commit(path, store, provenance)?;
        info!(
            output = %unit.path.display(),
            first = %a.path.display(),
            second = %b.path.display(),
            "Founded output from two raw files"
        );
        Ok(unit)
    }

    /// Fold `absorbed` (raw or output) into the output `into`, in place.
    fn absorb(&mut self, into: &MergeUnit, absorbed: &MergeUnit) -> Result<MergeUnit, MergeError> {
        let mut provenance = match &into.kind {
            UnitKind::Output(provenance) => provenance.clone(),
            UnitKind::Raw => {
                return Err(MergeError::InvalidMutation(format!(
                    "{} is not an output",
                    into.path.display()
                )))
            }
        };
        let mut store = self.backend.load(&into.path)?;
        let source = self.backend.load(&absorbed.path)?;
        tree::merge(&source, absorbed.summary.weight, &mut store, into.summary.weight)?;

        match &absorbed.kind {
            UnitKind::Raw => provenance.absorb_raw(&absorbed.name()),
            UnitKind::Output(other) => provenance.absorb_output(other),
        }
        let unit = self.commit(into.path.clone(), store, provenance)?;

        if let UnitKind::Output(_) = absorbed.kind {
            self.backend.remove(&absorbed.path)?;
            info!(
                output = %unit.path.display(),
                removed = %absorbed.path.display(),
                filecount = unit.provenance().map_or(0, |p| p.filecount),
                "Merged outputs"
            );
        } else {
            info!(
                output = %unit.path.display(),
                raw = %absorbed.path.display(),
                filecount = unit.provenance().map_or(0, |p| p.filecount),
                "Folded raw file into output"
            );
        }
        Ok(unit)
    }

    /// Every raw unit left at the fixed point becomes its own output.
    fn emit_singletons(&mut self, units: &mut ActiveUnitSet) -> Result<(), MergeError> {
        for index in 0..units.len() {
            let unit = &units.units()[index];
            if !unit.is_raw() {
                continue;
            }
            let path = self.next_output_path();
            let source = self.backend.load(&unit.path)?;
            let mut store = Store::new();
            tree::merge(&source, unit.summary.weight, &mut store, 0)?;
            let singleton = self.commit(path, store, Provenance::founding(&[unit.name()]))?;
            info!(output = %singleton.path.display(), raw = %unit.path.display(), "Singleton output");
            units.replace(index, singleton);
        }
        Ok(())
    }

    /// Rename every output so its file name carries its final file count.
    ///
    /// A final name that is an input or an existing store is never overwritten; the
    /// output takes the next free output number instead.
    fn finalize_names(&mut self, units: &mut ActiveUnitSet) -> Result<(), MergeError> {
        for index in 0..units.len() {
            let unit = &units.units()[index];
            let Some(filecount) = unit.provenance().map(|p| p.filecount) else {
                continue;
            };
            let current = unit.path.clone();
            let mut final_path = final_output_path(&current, filecount);
            while final_path != current && self.is_taken(&final_path) {
                warn!(taken = %final_path.display(), "Final output name is taken, renumbering");
                final_path = final_output_path(&self.next_output_path(), filecount);
            }
            if final_path != current {
                self.backend.rename(&current, &final_path)?;
                debug!(from = %current.display(), to = %final_path.display(), "Renamed output");
                units.unit_mut(index).path = final_path;
            }
        }
        Ok(())
    }

    /// Stamp provenance, save, and build the unit with a fresh summary.
    fn commit(&self, path: PathBuf, mut store: Store, provenance: Provenance) -> Result<MergeUnit, MergeError> {
        provenance.write(&mut store);
        let summary = UnitSummary::from_store(&store, &unit_name(&path), &self.config)?;
        self.backend.save(&path, &store)?;
        Ok(MergeUnit::output(path, provenance, summary))
    }

    fn next_output_path(&mut self) -> PathBuf {
        loop {
            let candidate = self.output_dir.join(format!(
                "{}{}.{}",
                self.config.output_prefix, self.next_output, self.config.extension
            ));
            self.next_output += 1;
            if !self.is_taken(&candidate) {
                return candidate;
            }
        }
    }

    /// Whether writing to `path` would overwrite an input or an existing store.
    fn is_taken(&self, path: &Path) -> bool {
        self.backend.exists(path) || self.input_ids.contains(&path_identity(path))
    }
}

/// `<dir>/<stem>_x<count>.<ext>`
pub fn final_output_path(path: &Path, filecount: u64) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}_x{}.{}", stem, filecount, ext.to_string_lossy()),
        None => format!("{}_x{}", stem, filecount),
    };
    path.with_file_name(name)
}
