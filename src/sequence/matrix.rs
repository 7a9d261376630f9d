//! Single-layer sequence matrix.

use std::time::Instant;

use indexmap::IndexSet;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::Enrollments;
use crate::config::{SequenceConfig, UnitSource};
use crate::error::{PathwayError, Result};
use crate::table::{EnrollmentTable, Key};

/// Students × units table of term indices.
///
/// Cell `[s, u]` holds the term in which student `s` took unit `u`, or 0 if
/// they never did. When a student repeats a unit only the latest term
/// survives; use [`SequenceTensor`](super::SequenceTensor) to keep every
/// occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MatrixParts")]
pub struct SequenceMatrix {
    matrix: Array2<u32>,
    students: Vec<Key>,
    units: Vec<Key>,
    #[serde(skip)]
    student_rows: IndexSet<Key>,
    #[serde(skip)]
    unit_columns: IndexSet<Key>,
}

/// Unchecked serialized form, validated through
/// [`SequenceMatrix::from_parts`].
#[derive(Deserialize)]
struct MatrixParts {
    matrix: Array2<u32>,
    students: Vec<Key>,
    units: Vec<Key>,
}

impl TryFrom<MatrixParts> for SequenceMatrix {
    type Error = PathwayError;

    fn try_from(parts: MatrixParts) -> Result<Self> {
        Self::from_parts(parts.matrix, parts.students, parts.units)
    }
}

impl SequenceMatrix {
    /// Build the sequence matrix from enrollment records.
    ///
    /// Units always come from the records; [`SequenceConfig::unit_source`]
    /// only applies to the tensor builder.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, a configured column
    /// is missing, an identifier cell is not an identifier, or a date cell is
    /// not a calendar date.
    ///
    /// # Example
    ///
    /// ```
    /// use student_pathway_rs::{EnrollmentTable, SequenceConfig, SequenceMatrix};
    ///
    /// let mut table = EnrollmentTable::new(["student_id", "unit_code", "outcome_date"]);
    /// table.push_row(vec![1.into(), "A".into(), "2019-06-30".into()])?;
    /// table.push_row(vec![1.into(), "B".into(), "2019-11-30".into()])?;
    /// table.parse_dates("outcome_date", "%Y-%m-%d")?;
    ///
    /// let seq = SequenceMatrix::build(&table, &SequenceConfig::default())?;
    /// assert_eq!(seq.matrix().row(0).to_vec(), vec![1, 2]);
    /// # Ok::<(), student_pathway_rs::PathwayError>(())
    /// ```
    pub fn build(table: &EnrollmentTable, config: &SequenceConfig) -> Result<Self> {
        let start = Instant::now();
        let config = SequenceConfig {
            unit_source: UnitSource::Records,
            ..config.clone()
        };
        let enrollments = Enrollments::collect(table, None, &config)?;

        let mut matrix = Array2::<u32>::zeros(enrollments.shape());
        enrollments.for_each_term(config.separator_month, |row, column, term| {
            matrix[[row, column]] = term;
        });

        let (student_rows, unit_columns) = enrollments.into_index();
        info!(
            "Built sequence matrix: {} students x {} units from {} records in {:?}",
            student_rows.len(),
            unit_columns.len(),
            table.len(),
            start.elapsed()
        );

        Ok(Self::indexed(matrix, student_rows, unit_columns))
    }

    /// Wrap an existing term-index array.
    ///
    /// # Errors
    ///
    /// Returns [`PathwayError::ShapeMismatch`] if the array shape does not
    /// match the student and unit lists, or
    /// [`PathwayError::InvalidInputType`] if either list repeats a key.
    pub fn from_parts(matrix: Array2<u32>, students: Vec<Key>, units: Vec<Key>) -> Result<Self> {
        let expected = vec![students.len(), units.len()];
        if matrix.shape() != expected.as_slice() {
            return Err(PathwayError::ShapeMismatch {
                expected,
                actual: matrix.shape().to_vec(),
            });
        }
        let student_rows: IndexSet<Key> = students.into_iter().collect();
        let unit_columns: IndexSet<Key> = units.into_iter().collect();
        if student_rows.len() != matrix.nrows() || unit_columns.len() != matrix.ncols() {
            return Err(PathwayError::InvalidInputType(
                "sequence matrix keys must be unique".to_string(),
            ));
        }
        debug!("Wrapped {:?} sequence matrix", matrix.dim());
        Ok(Self::indexed(matrix, student_rows, unit_columns))
    }

    fn indexed(
        matrix: Array2<u32>,
        student_rows: IndexSet<Key>,
        unit_columns: IndexSet<Key>,
    ) -> Self {
        Self {
            matrix,
            students: student_rows.iter().cloned().collect(),
            units: unit_columns.iter().cloned().collect(),
            student_rows,
            unit_columns,
        }
    }

    /// The term-index array.
    #[must_use]
    pub fn matrix(&self) -> &Array2<u32> {
        &self.matrix
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

    /// `(students, units)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        self.matrix.dim()
    }

    /// Term in which `student` took `unit`; `Some(0)` if never, `None` if
    /// either key is unknown.
    #[must_use]
    pub fn term(&self, student: &Key, unit: &Key) -> Option<u32> {
        let row = self.student_rows.get_index_of(student)?;
        let column = self.unit_columns.get_index_of(unit)?;
        Some(self.matrix[[row, column]])
    }

    /// Consume into `(matrix, students, units)`.
    #[must_use]
    pub fn into_parts(self) -> (Array2<u32>, Vec<Key>, Vec<Key>) {
        (self.matrix, self.students, self.units)
    }
}
