//! Error types for enrollment pathway analysis.

use thiserror::Error;

use crate::table::Key;

/// Result type alias for pathway analysis operations.
pub type Result<T> = std::result::Result<T, PathwayError>;

/// Errors that can occur while building sequences, transitions or projections.
#[derive(Debug, Error)]
pub enum PathwayError {
    /// Input is not the tabular or array structure an operation expects.
    #[error("invalid input type: {0}")]
    InvalidInputType(String),

    /// A date column holds something other than a calendar date.
    #[error("invalid date in column `{column}` at row {row}")]
    InvalidDateType {
        /// Column that was read.
        column: String,
        /// Zero-based row index of the offending cell.
        row: usize,
    },

    /// A required column is absent from the table.
    #[error("missing column: {0}")]
    MissingKey(String),

    /// An identifier is not part of the resolved vocabulary.
    #[error("unknown key {key} in column `{column}`")]
    UnknownKey {
        /// Column the identifier was read from.
        column: String,
        /// The identifier that could not be indexed.
        key: Key,
    },

    /// Invalid configuration parameter.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Shape mismatch between arrays that must agree.
    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// Expected shape.
        expected: Vec<usize>,
        /// Actual shape.
        actual: Vec<usize>,
    },

    /// Dimension mismatch.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
    },
}
