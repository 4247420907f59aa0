//! Tree walker folding a source store into a destination store

use crate::cluster::provenance::RESERVED_ATTRS;
use crate::error::MergeError;
use crate::store::{path, Dataset, Group, Node, Store};
use crate::tree::{attributes, dataset, Weights};
use tracing::{debug, trace};

/// Counters describing what a fold touched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub groups_created: usize,
    pub datasets_created: usize,
    pub datasets_merged: usize,
}

/// Fold `source` into `dest` in pre-order.
///
/// `source_weight` and `dest_weight` are the raw-run record counts each side currently
/// represents; they only feed the weighted mean of summary datasets. Pass a
/// `dest_weight` of 0 for an empty destination.
pub fn merge(
    source: &Store,
    source_weight: u64,
    dest: &mut Store,
    dest_weight: u64,
) -> Result<MergeStats, MergeError> {
    let mut walker = Walker {
        weights: Weights {
            source: source_weight,
            dest: dest_weight,
        },
        stats: MergeStats::default(),
    };
    walker.fold_group(source.root(), dest.root_mut(), "/")?;
    debug!(
        source_weight,
        dest_weight,
        groups_created = walker.stats.groups_created,
        datasets_created = walker.stats.datasets_created,
        datasets_merged = walker.stats.datasets_merged,
        "Folded store"
    );
    Ok(walker.stats)
}

struct Walker {
    weights: Weights,
    stats: MergeStats,
}

impl Walker {
    fn fold_group(&mut self, src: &Group, dst: &mut Group, at: &str) -> Result<(), MergeError> {
        attributes::adopt_group_attrs(&src.attrs, &mut dst.attrs, RESERVED_ATTRS);

        for (name, node) in src.children() {
            let child_path = path::join(at, name);
            match node {
                Node::Group(child) => {
                    if dst.child(name).is_none() {
                        self.stats.groups_created += 1;
                    }
                    let target = dst.require_group(name).map_err(|_| {
                        MergeError::schema(&child_path, "destination holds a dataset here")
                    })?;
                    trace!(path = %child_path, "Group");
                    self.fold_group(child, target, &child_path)?;
                }
                Node::Dataset(data) => self.fold_dataset(data, dst, name, &child_path)?,
            }
        }
        Ok(())
    }

    fn fold_dataset(
        &mut self,
        src: &Dataset,
        parent: &mut Group,
        name: &str,
        at: &str,
    ) -> Result<(), MergeError> {
        match parent.child_mut(name) {
            Some(Node::Dataset(existing)) => {
                let kind = dataset::merge_existing(at, src, existing, self.weights)?;
                attributes::combine(at, kind, &src.attrs, &mut existing.attrs)?;
                self.stats.datasets_merged += 1;
                trace!(path = %at, ?kind, "Merged dataset");
            }
            Some(Node::Group(_)) => {
                return Err(MergeError::schema(at, "destination holds a group here"));
            }
            None => {
                let (mut created, kind) = dataset::create_from(at, src)?;
                attributes::combine(at, kind, &src.attrs, &mut created.attrs)?;
                parent.insert(name, Node::Dataset(created));
                self.stats.datasets_created += 1;
                trace!(path = %at, ?kind, "Created dataset");
            }
        }
        Ok(())
    }
}
