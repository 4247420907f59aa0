//! Provenance tracking
//!
//! Produced outputs carry two root attributes: `Filecount`, the number of raw files
//! folded in, and `Inputfiles`, their names as byte strings. Raw inputs never carry
//! either. The tree walker skips both names; only this module writes them.

use crate::cluster::active::{MergeUnit, UnitKind};
use crate::error::MergeError;
use crate::store::{AttrValue, Store};

pub const FILECOUNT_ATTR: &str = "Filecount";
pub const INPUTFILES_ATTR: &str = "Inputfiles";

/// Root attributes owned by provenance tracking
pub const RESERVED_ATTRS: &[&str] = &[FILECOUNT_ATTR, INPUTFILES_ATTR];

/// Which raw files compose a produced output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    pub filecount: u64,
    pub inputfiles: Vec<String>,
}

impl Provenance {
    /// Provenance of an output founded from the given raw files.
    pub fn founding<S: AsRef<str>>(names: &[S]) -> Self {
        Self {
            filecount: names.len() as u64,
            inputfiles: names.iter().map(|n| n.as_ref().to_string()).collect(),
        }
    }

    /// Read provenance from a store's root. `None` for raw inputs.
    pub fn read(store: &Store) -> Result<Option<Self>, MergeError> {
        let Some(count) = store.attr(FILECOUNT_ATTR) else {
            return Ok(None);
        };
        let filecount = count
            .as_int()
            .filter(|n| *n >= 0)
            .ok_or_else(|| MergeError::schema(FILECOUNT_ATTR, "expected a non-negative integer"))?;
        let inputfiles = match store.attr(INPUTFILES_ATTR) {
            Some(value) => value
                .to_strings()
                .ok_or_else(|| MergeError::schema(INPUTFILES_ATTR, "expected byte strings"))?,
            None => Vec::new(),
        };
        Ok(Some(Self {
            filecount: filecount as u64,
            inputfiles,
        }))
    }

    /// Write both attributes onto a store's root.
    pub fn write(&self, store: &mut Store) {
        store.set_attr(FILECOUNT_ATTR, AttrValue::int(self.filecount as i64));
        store.set_attr(INPUTFILES_ATTR, AttrValue::byte_strings(&self.inputfiles));
    }

    /// Record one more raw file.
    pub fn absorb_raw(&mut self, name: &str) {
        self.filecount += 1;
        self.inputfiles.push(name.to_string());
    }

    /// Record every file of an absorbed output.
    pub fn absorb_output(&mut self, other: &Provenance) {
        self.filecount += other.filecount;
        self.inputfiles.extend(other.inputfiles.iter().cloned());
    }
}

/// Check that outputs plus untouched raw units still account for every input.
pub fn check_conservation(total_inputs: u64, units: &[MergeUnit]) -> Result<(), MergeError> {
    let mut outputs = 0u64;
    let mut raw = 0u64;
    for unit in units {
        match &unit.kind {
            UnitKind::Raw => raw += 1,
            UnitKind::Output(provenance) => outputs += provenance.filecount,
        }
    }
    if outputs + raw != total_inputs {
        return Err(MergeError::ConservationViolated {
            outputs,
            raw,
            total: total_inputs,
        });
    }
    Ok(())
}
