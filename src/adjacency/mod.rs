//! Unit-to-unit transition counting and normalization.
//!
//! A student contributes a transition `i → j` when their term for `j` is
//! exactly one more than their term for `i`, and `j` was not taken in their
//! first term:
//!
//! ```text
//! count[i, j] = #{ s : M[s, j] - M[s, i] == 1  and  M[s, j] != 1 }
//! ```
//!
//! Untaken cells are 0, so they can only pair with a first-term cell, which
//! the second condition excludes.
//!
//! For a [`SequenceTensor`] the same rule is summed over layer pairs: layer 0
//! against itself, then for each deeper layer k (while any student still has
//! unit `j` in layer k) the pairs `(k-1 → k)`, `(k → k-1)` and `(k → k)`.
//!
//! Counts are turned into probabilities by one of three [`Normalization`]s.
//! A zero denominator always yields 0.

mod graph;

pub use graph::{edges, TransitionEdge};

use std::time::Instant;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{PathwayError, Result};
use crate::sequence::{SequenceMatrix, SequenceTensor};
use crate::table::Key;

/// Denominator used when turning transition counts into probabilities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Normalization {
    /// Divide by the number of students who took the source unit `i`
    /// ("a student who took `i` next takes `j`").
    #[default]
    BySource,
    /// Divide by the number of students who took the destination unit `j`.
    ByDestination,
    /// Divide by the total number of students.
    Global,
}

/// Transition counts between every ordered pair of units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TransitionParts")]
pub struct TransitionMatrix {
    counts: Array2<u32>,
    takers: Array1<u32>,
    total_students: usize,
    units: Vec<Key>,
}

#[derive(Deserialize)]
struct TransitionParts {
    counts: Array2<u32>,
    takers: Array1<u32>,
    total_students: usize,
    units: Vec<Key>,
}

impl TryFrom<TransitionParts> for TransitionMatrix {
    type Error = PathwayError;

    fn try_from(parts: TransitionParts) -> Result<Self> {
        let n = parts.units.len();
        if parts.counts.dim() != (n, n) {
            return Err(PathwayError::ShapeMismatch {
                expected: vec![n, n],
                actual: parts.counts.shape().to_vec(),
            });
        }
        if parts.takers.len() != n {
            return Err(PathwayError::ShapeMismatch {
                expected: vec![n],
                actual: vec![parts.takers.len()],
            });
        }
        Ok(Self {
            counts: parts.counts,
            takers: parts.takers,
            total_students: parts.total_students,
            units: parts.units,
        })
    }
}

impl TransitionMatrix {
    /// Count transitions in a single-layer sequence matrix.
    #[must_use]
    pub fn from_sequence(sequence: &SequenceMatrix) -> Self {
        let mut transitions = Self::from_array(sequence.matrix().view());
        transitions.units = sequence.units().to_vec();
        transitions
    }

    /// Count transitions across all layers of a sequence tensor.
    #[must_use]
    pub fn from_tensor(tensor: &SequenceTensor) -> Self {
        let start = Instant::now();
        let layers = tensor.layers();
        let counts = tensor_counts(layers);
        let takers = takers(layers);

        info!(
            "Computed tensor transitions over {} layers, {} units in {:?}",
            layers.len(),
            tensor.units().len(),
            start.elapsed()
        );

        Self {
            counts,
            takers,
            total_students: tensor.students().len(),
            units: tensor.units().to_vec(),
        }
    }

    /// Count transitions in a bare students × units term array. Units are
    /// labelled by column position.
    #[must_use]
    pub fn from_array(matrix: ArrayView2<'_, u32>) -> Self {
        let start = Instant::now();
        let n = matrix.ncols();
        let counts = Array2::from_shape_fn((n, n), |(i, j)| {
            pair_count(matrix.column(i), matrix.column(j))
        });
        let takers = matrix.map_axis(Axis(0), nonzero);

        debug!("Computed {n}x{n} transitions in {:?}", start.elapsed());

        Self {
            counts,
            takers,
            total_students: matrix.nrows(),
            units: positional_units(n),
        }
    }

    /// Count transitions across raw tensor layers. Units are labelled by
    /// column position.
    ///
    /// # Errors
    ///
    /// Returns [`PathwayError::InvalidInputType`] if `layers` is empty, or
    /// [`PathwayError::ShapeMismatch`] if the layers disagree in shape.
    pub fn from_layers(layers: &[Array2<u32>]) -> Result<Self> {
        let first = layers.first().ok_or_else(|| {
            PathwayError::InvalidInputType("transition input needs at least one layer".to_string())
        })?;
        if let Some(bad) = layers.iter().find(|l| l.dim() != first.dim()) {
            return Err(PathwayError::ShapeMismatch {
                expected: first.shape().to_vec(),
                actual: bad.shape().to_vec(),
            });
        }

        Ok(Self {
            counts: tensor_counts(layers),
            takers: takers(layers),
            total_students: first.nrows(),
            units: positional_units(first.ncols()),
        })
    }

    /// Raw transition counts, `[source, destination]`.
    #[must_use]
    pub fn counts(&self) -> &Array2<u32> {
        &self.counts
    }

    /// Number of students who ever took each unit.
    #[must_use]
    pub fn takers(&self) -> &Array1<u32> {
        &self.takers
    }

    /// Number of students in the underlying sequence.
    #[must_use]
    pub fn total_students(&self) -> usize {
        self.total_students
    }

    /// Units in row/column order.
    #[must_use]
    pub fn units(&self) -> &[Key] {
        &self.units
    }

    /// Transition probabilities under the chosen normalization.
    #[allow(clippy::cast_precision_loss)]
    #[must_use]
    pub fn probabilities(&self, normalization: Normalization) -> Array2<f64> {
        let total = self.total_students as f64;
        Array2::from_shape_fn(self.counts.dim(), |(i, j)| {
            let count = self.counts[[i, j]];
            let denominator = match normalization {
                Normalization::BySource => f64::from(self.takers[i]),
                Normalization::ByDestination => f64::from(self.takers[j]),
                Normalization::Global => total,
            };
            if count == 0 || denominator == 0.0 {
                0.0
            } else {
                f64::from(count) / denominator
            }
        })
    }

    /// Weighted directed edges under the chosen normalization, keeping only
    /// weights of at least `min_weight` (zero weights are always dropped).
    #[must_use]
    pub fn edges(&self, normalization: Normalization, min_weight: f64) -> Vec<TransitionEdge> {
        graph::collect_edges(self.probabilities(normalization).view(), &self.units, min_weight)
    }
}

/// Students whose destination term is exactly one after their source term,
/// excluding first-term destinations.
#[allow(clippy::cast_possible_truncation)]
fn pair_count(source: ArrayView1<'_, u32>, destination: ArrayView1<'_, u32>) -> u32 {
    source
        .iter()
        .zip(destination.iter())
        .filter(|&(&s, &d)| d >= s && d - s == 1 && d != 1)
        .count() as u32
}

#[allow(clippy::cast_possible_truncation)]
fn nonzero(column: ArrayView1<'_, u32>) -> u32 {
    column.iter().filter(|&&t| t != 0).count() as u32
}

/// Students with a non-zero cell for each unit in any layer.
#[allow(clippy::cast_possible_truncation)]
fn takers(layers: &[Array2<u32>]) -> Array1<u32> {
    let Some(first) = layers.first() else {
        return Array1::zeros(0);
    };
    let (students, units) = first.dim();
    Array1::from_shape_fn(units, |unit| {
        (0..students)
            .filter(|&s| layers.iter().any(|layer| layer[[s, unit]] != 0))
            .count() as u32
    })
}

fn tensor_counts(layers: &[Array2<u32>]) -> Array2<u32> {
    let Some(top) = layers.first() else {
        return Array2::zeros((0, 0));
    };
    let n = top.ncols();

    // occupied[k][j]: some student has unit j in layer k.
    let occupied: Vec<Vec<bool>> = layers
        .iter()
        .map(|layer| {
            layer
                .axis_iter(Axis(1))
                .map(|column| column.iter().any(|&t| t != 0))
                .collect()
        })
        .collect();

    Array2::from_shape_fn((n, n), |(i, j)| {
        let mut total = pair_count(top.column(i), top.column(j));
        for k in 1..layers.len() {
            if !occupied[k][j] {
                break;
            }
            let (upper, layer) = (&layers[k - 1], &layers[k]);
            total += pair_count(upper.column(i), layer.column(j));
            total += pair_count(layer.column(i), upper.column(j));
            total += pair_count(layer.column(i), layer.column(j));
        }
        total
    })
}

fn positional_units(n: usize) -> Vec<Key> {
    (0..n)
        .map(|i| Key::Integer(i64::try_from(i).unwrap_or(i64::MAX)))
        .collect()
}
