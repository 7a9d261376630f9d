//! Layered sequence tensor for repeated enrollments.

use std::time::Instant;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{Enrollments, SequenceMatrix};
use crate::config::SequenceConfig;
use crate::error::{PathwayError, Result};
use crate::table::{EnrollmentTable, Key};

/// Stack of students × units term-index layers.
///
/// Layer 0 holds each student's first occurrence of each unit, layer 1 the
/// second, and so on. A term is written into the first layer whose cell is
/// still 0; when every layer is occupied a fresh zero layer is appended.
/// There is always at least one layer.
///
/// # Example
///
/// ```
/// use student_pathway_rs::{EnrollmentTable, SequenceConfig, SequenceTensor};
///
/// let mut table = EnrollmentTable::new(["student_id", "unit_code", "outcome_date"]);
/// table.push_row(vec![1.into(), "A".into(), "2019-06-30".into()])?;
/// table.push_row(vec![1.into(), "A".into(), "2019-11-30".into()])?;
/// table.parse_dates("outcome_date", "%Y-%m-%d")?;
///
/// let tensor = SequenceTensor::build(&table, None, &SequenceConfig::default())?;
/// assert_eq!(tensor.num_layers(), 2);
/// assert_eq!(tensor.layer(1).map(|l| l[[0, 0]]), Some(2));
/// # Ok::<(), student_pathway_rs::PathwayError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TensorParts")]
pub struct SequenceTensor {
    layers: Vec<Array2<u32>>,
    students: Vec<Key>,
    units: Vec<Key>,
}

/// Unchecked serialized form, validated through
/// [`SequenceTensor::from_layers`].
#[derive(Deserialize)]
struct TensorParts {
    layers: Vec<Array2<u32>>,
    students: Vec<Key>,
    units: Vec<Key>,
}

impl TryFrom<TensorParts> for SequenceTensor {
    type Error = PathwayError;

    fn try_from(parts: TensorParts) -> Result<Self> {
        Self::from_layers(parts.layers, parts.students, parts.units)
    }
}

impl SequenceTensor {
    /// Build the sequence tensor from enrollment records.
    ///
    /// `reference` is consulted only when the configuration asks for
    /// [`UnitSource::Reference`](crate::UnitSource::Reference); a missing or
    /// unusable reference table falls back to the units in `table`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, a configured column
    /// is missing, a cell has the wrong type, or a record names a unit that
    /// the reference vocabulary does not contain.
    pub fn build(
        table: &EnrollmentTable,
        reference: Option<&EnrollmentTable>,
        config: &SequenceConfig,
    ) -> Result<Self> {
        let start = Instant::now();
        let enrollments = Enrollments::collect(table, reference, config)?;
        let shape = enrollments.shape();

        let mut layers = vec![Array2::<u32>::zeros(shape)];
        enrollments.for_each_term(config.separator_month, |row, column, term| {
            let free = layers.iter_mut().find(|layer| layer[[row, column]] == 0);
            match free {
                Some(layer) => layer[[row, column]] = term,
                None => {
                    let mut layer = Array2::<u32>::zeros(shape);
                    layer[[row, column]] = term;
                    layers.push(layer);
                }
            }
        });

        let (students, units) = enrollments.into_index();
        let students: Vec<Key> = students.into_iter().collect();
        let units: Vec<Key> = units.into_iter().collect();
        info!(
            "Built sequence tensor: {} layers of {} students x {} units from {} records in {:?}",
            layers.len(),
            students.len(),
            units.len(),
            table.len(),
            start.elapsed()
        );

        Ok(Self {
            layers,
            students,
            units,
        })
    }

    /// Wrap existing term-index layers.
    ///
    /// # Errors
    ///
    /// Returns [`PathwayError::InvalidInputType`] if `layers` is empty, or
    /// [`PathwayError::ShapeMismatch`] if any layer disagrees with the
    /// student and unit lists.
    pub fn from_layers(
        layers: Vec<Array2<u32>>,
        students: Vec<Key>,
        units: Vec<Key>,
    ) -> Result<Self> {
        if layers.is_empty() {
            return Err(PathwayError::InvalidInputType(
                "sequence tensor needs at least one layer".to_string(),
            ));
        }
        let expected = vec![students.len(), units.len()];
        if let Some(bad) = layers.iter().find(|l| l.shape() != expected.as_slice()) {
            return Err(PathwayError::ShapeMismatch {
                expected,
                actual: bad.shape().to_vec(),
            });
        }
        debug!("Wrapped {} sequence tensor layers", layers.len());
        Ok(Self {
            layers,
            students,
            units,
        })
    }

    /// All layers, first occurrences first.
    #[must_use]
    pub fn layers(&self) -> &[Array2<u32>] {
        &self.layers
    }

    /// A single layer.
    #[must_use]
    pub fn layer(&self, index: usize) -> Option<&Array2<u32>> {
        self.layers.get(index)
    }

    /// Number of layers.
    #[must_use]
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    /// Students in row order.
    #[must_use]
    pub fn students(&self) -> &[Key] {
        &self.students
    }

    /// Units in column order.
    #[must_use]
    pub fn units(&self) -> &[Key] {
        &self.units
    }

    /// `(students, units)` of every layer.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.students.len(), self.units.len())
    }

    /// How many times each student took each unit: the number of layers with
    /// a non-zero cell.
    #[must_use]
    pub fn occurrences(&self) -> Array2<u32> {
        let mut counts = Array2::<u32>::zeros(self.shape());
        for layer in &self.layers {
            counts.zip_mut_with(layer, |count, &term| {
                if term != 0 {
                    *count += 1;
                }
            });
        }
        counts
    }

    /// Latest term per student across all layers (0 for a student with no
    /// records).
    #[must_use]
    pub fn latest_terms(&self) -> Vec<u32> {
        (0..self.students.len())
            .map(|row| {
                self.layers
                    .iter()
                    .flat_map(|layer| layer.row(row).to_vec())
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }
}

impl From<SequenceMatrix> for SequenceTensor {
    fn from(matrix: SequenceMatrix) -> Self {
        let (matrix, students, units) = matrix.into_parts();
        Self {
            layers: vec![matrix],
            students,
            units,
        }
    }
}
