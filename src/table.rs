//! In-memory enrollment table.
//!
//! A deliberately small column/row container: loading, cleaning and cohort
//! filtering happen before records reach this crate. The table only has to
//! answer "which column is this", "give me these identifiers" and "give me
//! these dates", failing with a typed error when it cannot.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{PathwayError, Result};

/// A single table cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Field {
    /// Integer value, typically a student identifier.
    Integer(i64),
    /// Text value, typically a unit code or name.
    Text(String),
    /// Calendar date.
    Date(NaiveDate),
    /// Missing value.
    Empty,
}

impl From<i64> for Field {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Field {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<&str> for Field {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Field {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<NaiveDate> for Field {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

/// Opaque identifier for a student or a unit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    /// Numeric identifier.
    Integer(i64),
    /// Textual identifier.
    Text(String),
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Key {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

/// Named columns over rows of [`Field`]s.
///
/// # Example
///
/// ```
/// use student_pathway_rs::{EnrollmentTable, Field};
///
/// let mut table = EnrollmentTable::new(["student_id", "unit_code", "outcome_date"]);
/// table.push_row(vec![111.into(), "PHYS1001".into(), "2019-06-30".into()])?;
/// table.parse_dates("outcome_date", "%Y-%m-%d")?;
///
/// assert_eq!(table.len(), 1);
/// assert_eq!(table.dates("outcome_date")?.len(), 1);
/// # Ok::<(), student_pathway_rs::PathwayError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentTable {
    columns: Vec<String>,
    rows: Vec<Vec<Field>>,
}

impl EnrollmentTable {
    /// Create an empty table with the given column names.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row.
    ///
    /// # Errors
    ///
    /// Returns [`PathwayError::DimensionMismatch`] if the row width differs
    /// from the column count.
    pub fn push_row(&mut self, row: Vec<Field>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(PathwayError::DimensionMismatch {
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Builder form of [`push_row`](Self::push_row).
    ///
    /// # Errors
    ///
    /// Same as [`push_row`](Self::push_row).
    pub fn with_row(mut self, row: Vec<Field>) -> Result<Self> {
        self.push_row(row)?;
        Ok(self)
    }

    /// Column names in order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// All rows.
    #[must_use]
    pub fn rows(&self) -> &[Vec<Field>] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a named column.
    ///
    /// # Errors
    ///
    /// Returns [`PathwayError::MissingKey`] if the column does not exist.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| PathwayError::MissingKey(name.to_string()))
    }

    /// Whether a named column exists.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Read a column as identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`PathwayError::MissingKey`] if the column does not exist, or
    /// [`PathwayError::InvalidInputType`] if a cell is a date or empty.
    pub fn keys(&self, column: &str) -> Result<Vec<Key>> {
        let idx = self.column_index(column)?;
        self.rows
            .iter()
            .enumerate()
            .map(|(row, fields)| match &fields[idx] {
                Field::Integer(value) => Ok(Key::Integer(*value)),
                Field::Text(value) => Ok(Key::Text(value.clone())),
                Field::Date(_) | Field::Empty => Err(PathwayError::InvalidInputType(format!(
                    "column `{column}` row {row} does not hold an identifier"
                ))),
            })
            .collect()
    }

    /// Read a column as calendar dates.
    ///
    /// Text is never re-parsed here; use [`parse_dates`](Self::parse_dates)
    /// first.
    ///
    /// # Errors
    ///
    /// Returns [`PathwayError::MissingKey`] if the column does not exist, or
    /// [`PathwayError::InvalidDateType`] for any cell that is not a date.
    pub fn dates(&self, column: &str) -> Result<Vec<NaiveDate>> {
        let idx = self.column_index(column)?;
        self.rows
            .iter()
            .enumerate()
            .map(|(row, fields)| match &fields[idx] {
                Field::Date(date) => Ok(*date),
                _ => Err(PathwayError::InvalidDateType {
                    column: column.to_string(),
                    row,
                }),
            })
            .collect()
    }

    /// Convert the text cells of a column into dates using a chrono format
    /// string such as `"%Y-%m-%d"`. Cells that already hold dates are kept.
    ///
    /// The table is left untouched if any cell fails to parse.
    ///
    /// # Errors
    ///
    /// Returns [`PathwayError::MissingKey`] if the column does not exist, or
    /// [`PathwayError::InvalidDateType`] for a cell that cannot be parsed.
    pub fn parse_dates(&mut self, column: &str, format: &str) -> Result<()> {
        let idx = self.column_index(column)?;
        let parsed = self
            .rows
            .iter()
            .enumerate()
            .map(|(row, fields)| match &fields[idx] {
                Field::Date(date) => Ok(*date),
                Field::Text(text) => NaiveDate::parse_from_str(text.trim(), format).map_err(|_| {
                    PathwayError::InvalidDateType {
                        column: column.to_string(),
                        row,
                    }
                }),
                Field::Integer(_) | Field::Empty => Err(PathwayError::InvalidDateType {
                    column: column.to_string(),
                    row,
                }),
            })
            .collect::<Result<Vec<_>>>()?;

        for (fields, date) in self.rows.iter_mut().zip(parsed) {
            fields[idx] = Field::Date(date);
        }
        Ok(())
    }

    /// Rows whose date in `column` falls within `from..=to` (calendar years).
    ///
    /// # Errors
    ///
    /// Same as [`dates`](Self::dates).
    pub fn between_years(&self, column: &str, from: i32, to: i32) -> Result<Self> {
        let dates = self.dates(column)?;
        let rows = self
            .rows
            .iter()
            .zip(dates)
            .filter(|(_, date)| (from..=to).contains(&date.year()))
            .map(|(row, _)| row.clone())
            .collect();

        Ok(Self {
            columns: self.columns.clone(),
            rows,
        })
    }
}
