//! Dataset merge rules
//!
//! Summary datasets are combined as a weighted mean; vectors and matrices grow along
//! axis 0 with the source rows appended after the existing ones.

use crate::error::MergeError;
use crate::store::{Dataset, DatasetKind};
use crate::tree::Weights;

/// Kind of `dataset`, or a schema mismatch for unsupported ranks.
pub fn kind_of(path: &str, dataset: &Dataset) -> Result<DatasetKind, MergeError> {
    dataset.kind().ok_or_else(|| {
        MergeError::schema(
            path,
            format!("rank {} datasets are not supported", dataset.rank()),
        )
    })
}

/// Fold `src` into an existing destination dataset.
///
/// The destination's kind governs the rule. Returns that kind so attributes can follow.
pub fn merge_existing(
    path: &str,
    src: &Dataset,
    dst: &mut Dataset,
    weights: Weights,
) -> Result<DatasetKind, MergeError> {
    let src_kind = kind_of(path, src)?;
    let dst_kind = kind_of(path, dst)?;
    if src.dtype() != dst.dtype() {
        return Err(MergeError::schema(
            path,
            format!("dtype {} cannot merge into {}", src.dtype(), dst.dtype()),
        ));
    }

    match dst_kind {
        DatasetKind::ScalarAggregate => {
            if src_kind != DatasetKind::ScalarAggregate {
                return Err(MergeError::schema(
                    path,
                    format!("shape {:?} cannot merge into a summary value", src.shape()),
                ));
            }
            let (dest_value, item_value) = match (dst.scalar_value(), src.scalar_value()) {
                (Some(d), Some(s)) => (d, s),
                _ => return Err(MergeError::schema(path, "empty summary value")),
            };
            dst.set_scalar(weighted_mean(dest_value, item_value, weights));
        }
        DatasetKind::Vector => {
            if src.rank() != 1 {
                return Err(MergeError::schema(
                    path,
                    format!("rank {} cannot append to a vector", src.rank()),
                ));
            }
            append_rows(path, src, dst)?;
        }
        DatasetKind::Matrix => {
            if src.rank() != 2 || src.row_width() != dst.row_width() {
                return Err(MergeError::schema(
                    path,
                    format!(
                        "shape {:?} cannot append to matrix {:?}",
                        src.shape(),
                        dst.shape()
                    ),
                ));
            }
            append_rows(path, src, dst)?;
        }
    }
    Ok(dst_kind)
}

/// Create the destination copy of a dataset absent from the destination.
///
/// Summary datasets stay fixed-length; vectors and matrices are created growable
/// along axis 0 and receive the source rows at offset 0.
pub fn create_from(path: &str, src: &Dataset) -> Result<(Dataset, DatasetKind), MergeError> {
    let kind = kind_of(path, src)?;
    let created = match kind {
        DatasetKind::ScalarAggregate => Dataset::new(src.shape().to_vec(), src.data().clone())?,
        DatasetKind::Vector | DatasetKind::Matrix => {
            let mut created = src.empty_growable_like();
            append_rows(path, src, &mut created)?;
            created
        }
    };
    Ok((created, kind))
}

/// `(dest·w_dest + item·w_item) / (w_dest + w_item)`, evaluated in exactly that order.
///
/// A destination weight of 0 is an empty destination: the item is copied as-is.
pub fn weighted_mean(dest_value: f64, item_value: f64, weights: Weights) -> f64 {
    if weights.dest == 0 {
        return item_value;
    }
    let dest_weight = weights.dest as f64;
    let item_weight = weights.source as f64;
    (dest_value * dest_weight + item_value * item_weight) / (dest_weight + item_weight)
}

fn append_rows(path: &str, src: &Dataset, dst: &mut Dataset) -> Result<(), MergeError> {
    let offset = dst.rows();
    dst.resize_rows(offset + src.rows())
        .map_err(|e| MergeError::schema(path, e.to_string()))?;
    dst.write_rows(offset, src.data())
        .map_err(|e| MergeError::schema(path, e.to_string()))
}
