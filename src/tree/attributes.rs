//! Attribute combination rules for dataset attributes.

use crate::error::MergeError;
use crate::store::{Attributes, DatasetKind};
use tracing::trace;

/// Uncertainty attribute on summary datasets, combined in quadrature
pub const ERROR_ATTR: &str = "Error";

/// Combine the source dataset's attributes into the destination's.
///
/// | present in dest | kind | rule |
/// |---|---|---|
/// | no | any | copy |
/// | yes | summary, `Error` | `sqrt(dest² + src²)`, rooted on every merge |
/// | yes | summary, other | keep destination value |
/// | yes | vector / matrix | append |
pub fn combine(
    path: &str,
    kind: DatasetKind,
    src: &Attributes,
    dst: &mut Attributes,
) -> Result<(), MergeError> {
    for (name, value) in src {
        let Some(existing) = dst.get_mut(name) else {
            dst.insert(name.clone(), value.clone());
            continue;
        };
        match kind {
            DatasetKind::ScalarAggregate if name == ERROR_ATTR => {
                *existing = existing
                    .quadrature(value)
                    .map_err(|reason| MergeError::schema(attr_path(path, name), reason))?;
            }
            DatasetKind::ScalarAggregate => {
                trace!(path, attribute = %name, "Keeping invariant attribute");
            }
            DatasetKind::Vector | DatasetKind::Matrix => {
                *existing = existing
                    .appended(value)
                    .map_err(|reason| MergeError::schema(attr_path(path, name), reason))?;
            }
        }
    }
    Ok(())
}

/// Copy group attributes the destination lacks, skipping `reserved` names.
///
/// Group attributes are never combined.
pub fn adopt_group_attrs(src: &Attributes, dst: &mut Attributes, reserved: &[&str]) {
    for (name, value) in src {
        if reserved.contains(&name.as_str()) || dst.contains_key(name) {
            continue;
        }
        dst.insert(name.clone(), value.clone());
    }
}

fn attr_path(path: &str, name: &str) -> String {
    format!("{}@{}", path, name)
}
