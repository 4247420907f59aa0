//! Pairwise closeness test over the configured parameters.

use crate::config::{MergeConfig, ParameterSpec};
use crate::error::MergeError;
use crate::store::{Node, Store};

/// Per-unit values the clustering scan needs, computed once per store state.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitSummary {
    /// Axis-0 length of the weight dataset
    pub weight: u64,
    /// Mean of each configured parameter, in configuration order
    pub means: Vec<f64>,
}

impl UnitSummary {
    /// Summarize `store`; a missing weight dataset or parameter is fatal.
    pub fn from_store(store: &Store, unit: &str, config: &MergeConfig) -> Result<Self, MergeError> {
        let weight = unit_weight(store, unit, &config.weight_path)?;
        let means = config
            .parameters
            .iter()
            .map(|parameter| parameter_mean(store, unit, &parameter.name))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { weight, means })
    }
}

/// Number of raw-run records a store represents.
pub fn unit_weight(store: &Store, unit: &str, weight_path: &str) -> Result<u64, MergeError> {
    store
        .dataset(weight_path)
        .map(|dataset| dataset.rows() as u64)
        .ok_or_else(|| MergeError::MissingWeightPath {
            unit: unit.to_string(),
            path: weight_path.to_string(),
        })
}

/// Mean over every element of the parameter's dataset.
pub fn parameter_mean(store: &Store, unit: &str, name: &str) -> Result<f64, MergeError> {
    match store.get(name) {
        Some(Node::Dataset(dataset)) => Ok(dataset.data().mean()),
        _ => Err(MergeError::MissingParameter {
            unit: unit.to_string(),
            name: name.to_string(),
        }),
    }
}

/// `|a - b| < max(a·spread, b·spread)`: each side scales the tolerance independently and
/// the larger bound applies.
pub fn within_tolerance(mean_a: f64, mean_b: f64, spread: f64) -> bool {
    (mean_a - mean_b).abs() < (mean_a * spread).max(mean_b * spread)
}

/// Two units are close when every parameter is within its tolerance.
pub fn close(a: &UnitSummary, b: &UnitSummary, parameters: &[ParameterSpec]) -> bool {
    parameters
        .iter()
        .zip(a.means.iter().zip(&b.means))
        .all(|(parameter, (mean_a, mean_b))| within_tolerance(*mean_a, *mean_b, parameter.spread))
}
