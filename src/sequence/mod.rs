//! Sequence construction: from dated enrollment records to term-index tables.
//!
//! Each student's outcomes are sorted by date and run through a
//! [`SemesterClock`], producing a term index per record. The indices are then
//! laid out in a students × units table:
//!
//! - [`SequenceMatrix`]: one cell per (student, unit); a repeated unit
//!   overwrites its earlier term.
//! - [`SequenceTensor`]: a stack of such tables; the k-th occurrence of a
//!   (student, unit) pair lands in layer k.
//!
//! Students and units are indexed in order of first appearance, through an
//! [`IndexSet`] so lookups stay O(1) on large record sets.

mod matrix;
mod semester;
mod tensor;

pub use matrix::SequenceMatrix;
pub use semester::{assign_terms, SemesterClock};
pub use tensor::SequenceTensor;

use chrono::NaiveDate;
use indexmap::IndexSet;
use tracing::warn;

use crate::config::{SequenceConfig, UnitSource};
use crate::error::{PathwayError, Result};
use crate::table::{EnrollmentTable, Key};

/// Enrollment records grouped per student and resolved to unit columns.
#[derive(Debug)]
struct Enrollments {
    students: IndexSet<Key>,
    units: IndexSet<Key>,
    /// Per student, in `students` order: (outcome date, unit column) sorted
    /// by date.
    histories: Vec<Vec<(NaiveDate, usize)>>,
}

impl Enrollments {
    fn collect(
        table: &EnrollmentTable,
        reference: Option<&EnrollmentTable>,
        config: &SequenceConfig,
    ) -> Result<Self> {
        config.validate()?;

        let ids = table.keys(&config.id_header)?;
        let unit_keys = table.keys(&config.unit_header)?;
        let dates = table.dates(&config.date_header)?;

        let units = resolve_units(&unit_keys, reference, config);

        let mut students = IndexSet::new();
        let mut histories: Vec<Vec<(NaiveDate, usize)>> = Vec::new();

        for ((id, unit), date) in ids.into_iter().zip(unit_keys).zip(dates) {
            let column = units
                .get_index_of(&unit)
                .ok_or_else(|| PathwayError::UnknownKey {
                    column: config.unit_header.clone(),
                    key: unit,
                })?;
            let (row, inserted) = students.insert_full(id);
            if inserted {
                histories.push(Vec::new());
            }
            histories[row].push((date, column));
        }

        for history in &mut histories {
            history.sort_by_key(|&(date, _)| date);
        }

        Ok(Self {
            students,
            units,
            histories,
        })
    }

    /// Walk every record as (student row, unit column, term index), student
    /// by student in date order.
    fn for_each_term(&self, separator_month: u32, mut visit: impl FnMut(usize, usize, u32)) {
        for (row, history) in self.histories.iter().enumerate() {
            let mut clock = SemesterClock::new(separator_month);
            for &(date, column) in history {
                visit(row, column, clock.advance(date));
            }
        }
    }

    fn shape(&self) -> (usize, usize) {
        (self.students.len(), self.units.len())
    }

    fn into_index(self) -> (IndexSet<Key>, IndexSet<Key>) {
        (self.students, self.units)
    }
}

/// Decide the unit vocabulary once, before any record is placed.
fn resolve_units(
    record_units: &[Key],
    reference: Option<&EnrollmentTable>,
    config: &SequenceConfig,
) -> IndexSet<Key> {
    if config.unit_source == UnitSource::Reference {
        match reference.map(|table| table.keys(&config.unit_header)) {
            Some(Ok(units)) => return units.into_iter().collect(),
            Some(Err(err)) => warn!(
                "Reference unit table unusable ({err}), deriving units from records"
            ),
            None => warn!("No reference unit table supplied, deriving units from records"),
        }
    }
    record_units.iter().cloned().collect()
}
