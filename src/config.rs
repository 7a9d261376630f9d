//! Configuration types for pathway analysis.
//!
//! - [`SequenceConfig`]: term assignment and column selection for the
//!   sequence matrix and tensor builders
//! - [`UnitSource`]: where the unit vocabulary comes from
//! - [`ProjectionConfig`]: seeding of the projection sampler

use serde::{Deserialize, Serialize};

use crate::error::{PathwayError, Result};

/// Where a builder takes its unit vocabulary from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitSource {
    /// Units in first-seen order of the enrollment records.
    #[default]
    Records,
    /// Units in first-seen order of an external reference table.
    ///
    /// Falls back to [`UnitSource::Records`] when no usable reference table
    /// is supplied.
    Reference,
}

/// Configuration for sequence matrix and tensor construction.
///
/// # Example
///
/// ```
/// use student_pathway_rs::{SequenceConfig, UnitSource};
///
/// let config = SequenceConfig::default()
///     .with_separator_month(9)
///     .with_unit_header("unit_name")
///     .with_unit_source(UnitSource::Reference);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceConfig {
    /// Month (1-12) after which an outcome belongs to the second semester.
    pub separator_month: u32,

    /// Column holding student identifiers.
    pub id_header: String,

    /// Column holding unit identifiers.
    pub unit_header: String,

    /// Column holding outcome dates.
    pub date_header: String,

    /// Source of the unit vocabulary.
    pub unit_source: UnitSource,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            separator_month: 8,
            id_header: "student_id".to_string(),
            unit_header: "unit_code".to_string(),
            date_header: "outcome_date".to_string(),
            unit_source: UnitSource::Records,
        }
    }
}

impl SequenceConfig {
    /// Default configuration keyed on the `unit_name` column.
    #[must_use]
    pub fn by_unit_name() -> Self {
        Self::default().with_unit_header("unit_name")
    }

    /// Set the semester separator month.
    #[must_use]
    pub const fn with_separator_month(mut self, month: u32) -> Self {
        self.separator_month = month;
        self
    }

    /// Set the student identifier column.
    #[must_use]
    pub fn with_id_header(mut self, header: impl Into<String>) -> Self {
        self.id_header = header.into();
        self
    }

    /// Set the unit identifier column.
    #[must_use]
    pub fn with_unit_header(mut self, header: impl Into<String>) -> Self {
        self.unit_header = header.into();
        self
    }

    /// Set the outcome date column.
    #[must_use]
    pub fn with_date_header(mut self, header: impl Into<String>) -> Self {
        self.date_header = header.into();
        self
    }

    /// Set the unit vocabulary source.
    #[must_use]
    pub const fn with_unit_source(mut self, source: UnitSource) -> Self {
        self.unit_source = source;
        self
    }

    /// Check that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`PathwayError::InvalidConfig`] if the separator month is not
    /// a calendar month.
    pub fn validate(&self) -> Result<()> {
        if !(1..=12).contains(&self.separator_month) {
            return Err(PathwayError::InvalidConfig(format!(
                "separator_month must be in 1..=12, got {}",
                self.separator_month
            )));
        }
        Ok(())
    }
}

/// Configuration for cohort projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionConfig {
    /// Seed for the student sampler.
    pub seed: u64,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self { seed: 42 }
    }
}

impl ProjectionConfig {
    /// Set the sampler seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
