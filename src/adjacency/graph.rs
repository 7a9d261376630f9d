//! Edge-list export of a transition matrix for graph renderers.

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use crate::error::{PathwayError, Result};
use crate::table::Key;

/// A directed, weighted transition between two units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionEdge {
    /// Unit taken first.
    pub source: Key,
    /// Unit taken in the following term.
    pub target: Key,
    /// Transition weight, usually a probability.
    pub weight: f64,
}

/// Turn a square weight matrix into edges labelled by `units`.
///
/// Self-loops are kept (a unit repeated in consecutive terms). Zero weights
/// are dropped, as are weights below `min_weight`.
///
/// # Errors
///
/// Returns [`PathwayError::ShapeMismatch`] if the matrix is not
/// `units.len()` × `units.len()`.
pub fn edges(
    matrix: ArrayView2<'_, f64>,
    units: &[Key],
    min_weight: f64,
) -> Result<Vec<TransitionEdge>> {
    let expected = vec![units.len(), units.len()];
    if matrix.shape() != expected.as_slice() {
        return Err(PathwayError::ShapeMismatch {
            expected,
            actual: matrix.shape().to_vec(),
        });
    }
    Ok(collect_edges(matrix, units, min_weight))
}

pub(super) fn collect_edges(
    matrix: ArrayView2<'_, f64>,
    units: &[Key],
    min_weight: f64,
) -> Vec<TransitionEdge> {
    matrix
        .indexed_iter()
        .filter(|&(_, &weight)| weight > 0.0 && weight >= min_weight)
        .map(|((i, j), &weight)| TransitionEdge {
            source: units[i].clone(),
            target: units[j].clone(),
            weight,
        })
        .collect()
}
