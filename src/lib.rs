//! # student-pathway-rs
//!
//! Deterministic analysis of how students move between units over time.
//!
//! Enrollment records are turned into per-student term indices, laid out as
//! a students × units sequence matrix (or a layered tensor when units are
//! repeated), reduced to a unit × unit transition matrix, and finally used to
//! project which units the current cohort will occupy next term.
//!
//! ## Pipeline
//!
//! ```text
//! EnrollmentTable ─▶ SequenceTensor ─▶ TransitionMatrix ─▶ probabilities ─▶ project
//!                    (SemesterClock)    (pair counting)     (Normalization)   (Occupancy)
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use student_pathway_rs::{
//!     project, EnrollmentTable, Normalization, Occupancy, ProjectionConfig, SequenceConfig,
//!     SequenceTensor, TransitionMatrix,
//! };
//!
//! let mut table = EnrollmentTable::new(["student_id", "unit_code", "outcome_date"]);
//! for (id, unit, date) in [
//!     (1, "MATH1", "2019-06-30"),
//!     (1, "MATH2", "2019-11-30"),
//!     (2, "MATH1", "2019-06-30"),
//!     (2, "PHYS1", "2019-11-30"),
//! ] {
//!     table.push_row(vec![id.into(), unit.into(), date.into()])?;
//! }
//! table.parse_dates("outcome_date", "%Y-%m-%d")?;
//!
//! let tensor = SequenceTensor::build(&table, None, &SequenceConfig::default())?;
//! let transitions = TransitionMatrix::from_tensor(&tensor);
//! let p = transitions.probabilities(Normalization::BySource);
//! assert_eq!(p[[0, 1]], 0.5);
//!
//! let snapshot = Occupancy::from_tensor(&tensor);
//! let projection = project(&snapshot, p.view(), &ProjectionConfig::default())?;
//! assert_eq!(projection.total(), 2);
//! # Ok::<(), student_pathway_rs::PathwayError>(())
//! ```
//!
//! ## Modules
//!
//! - [`table`]: in-memory enrollment table and identifier types
//! - [`sequence`]: semester assignment, sequence matrix and tensor
//! - [`adjacency`]: transition counts, normalizations and edge export
//! - [`projection`]: occupancy snapshots and cohort projection
//! - [`config`]: configuration types
//! - [`error`]: error types and result alias

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod adjacency;
pub mod config;
pub mod error;
pub mod projection;
pub mod sequence;
pub mod table;

pub use adjacency::{Normalization, TransitionEdge, TransitionMatrix};
pub use config::{ProjectionConfig, SequenceConfig, UnitSource};
pub use error::{PathwayError, Result};
pub use projection::{project, project_with_rng, Occupancy, Projection};
pub use sequence::{assign_terms, SemesterClock, SequenceMatrix, SequenceTensor};
pub use table::{EnrollmentTable, Field, Key};
