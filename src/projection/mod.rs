//! Cohort projection through a transition matrix.
//!
//! Given which students currently sit in which unit and a row-normalized
//! transition matrix `P`, each unit `k` with students `S_k` sends
//! `round(|S_k| · P[k, j])` of them on to unit `j`. Who moves is decided by
//! sampling without replacement from `S_k`, skipping students already
//! projected into `j`, so a destination never counts the same student twice
//! and never draws more students than the pool holds.
//!
//! Rounding is half-to-even. Pools are sampled in sorted order from an
//! injectable RNG, so a fixed seed reproduces the same projection.

mod occupancy;

pub use occupancy::Occupancy;

use std::collections::BTreeSet;

use indexmap::IndexMap;
use ndarray::ArrayView2;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ProjectionConfig;
use crate::error::{PathwayError, Result};
use crate::table::Key;

/// Students expected in each unit next term.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    students: IndexMap<Key, BTreeSet<Key>>,
    counts: IndexMap<Key, usize>,
}

impl Projection {
    /// Projected students per unit, in occupancy order.
    #[must_use]
    pub fn students(&self) -> &IndexMap<Key, BTreeSet<Key>> {
        &self.students
    }

    /// Projected head count per unit, in occupancy order.
    #[must_use]
    pub fn counts(&self) -> &IndexMap<Key, usize> {
        &self.counts
    }

    /// Projected head count for one unit (0 for an unknown unit).
    #[must_use]
    pub fn count(&self, unit: &Key) -> usize {
        self.counts.get(unit).copied().unwrap_or(0)
    }

    /// Sum of projected head counts.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

/// Project an occupancy snapshot forward one term, sampling with a
/// `ChaCha8Rng` seeded from `config`.
///
/// # Errors
///
/// Same as [`project_with_rng`].
///
/// # Example
///
/// ```
/// use std::collections::BTreeSet;
///
/// use ndarray::array;
/// use student_pathway_rs::{project, Key, Occupancy, ProjectionConfig};
///
/// let cohort: BTreeSet<Key> = [1, 2, 3, 4].into_iter().map(Key::from).collect();
/// let occupancy = Occupancy::from_sets([
///     (Key::from("A"), cohort),
///     (Key::from("B"), BTreeSet::new()),
/// ]);
/// let p = array![[0.0, 0.5], [0.0, 0.0]];
///
/// let projection = project(&occupancy, p.view(), &ProjectionConfig::default())?;
/// assert_eq!(projection.count(&Key::from("B")), 2);
/// # Ok::<(), student_pathway_rs::PathwayError>(())
/// ```
pub fn project(
    occupancy: &Occupancy,
    probabilities: ArrayView2<'_, f64>,
    config: &ProjectionConfig,
) -> Result<Projection> {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    project_with_rng(occupancy, probabilities, &mut rng)
}

/// Project an occupancy snapshot forward one term using the given RNG.
///
/// Row and column `k` of `probabilities` belong to the `k`-th unit of
/// `occupancy`.
///
/// # Errors
///
/// Returns [`PathwayError::DimensionMismatch`] if `probabilities` is not
/// `n × n` for the `n` units of `occupancy`.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]
pub fn project_with_rng<R: Rng + ?Sized>(
    occupancy: &Occupancy,
    probabilities: ArrayView2<'_, f64>,
    rng: &mut R,
) -> Result<Projection> {
    let n = occupancy.len();
    let (rows, cols) = probabilities.dim();
    if rows != n || cols != n {
        return Err(PathwayError::DimensionMismatch {
            expected: n,
            actual: if rows == n { cols } else { rows },
        });
    }

    let mut projected: IndexMap<Key, BTreeSet<Key>> = occupancy
        .units()
        .map(|unit| (unit.clone(), BTreeSet::new()))
        .collect();

    for (k, (unit, pool)) in occupancy.iter().enumerate() {
        if pool.is_empty() {
            continue;
        }
        let size = pool.len() as f64;

        for (j, &probability) in probabilities.row(k).iter().enumerate() {
            let expected = (size * probability).round_ties_even();
            if expected.is_nan() || expected <= 0.0 {
                continue;
            }
            let wanted = expected as usize;

            let target = &mut projected[j];
            let candidates: Vec<&Key> = pool.iter().filter(|s| !target.contains(*s)).collect();
            if candidates.len() > wanted {
                target.extend(candidates.choose_multiple(rng, wanted).map(|&s| s.clone()));
            } else {
                target.extend(candidates.into_iter().cloned());
            }
        }
        debug!("Projected {} students out of unit {unit}", pool.len());
    }

    let counts: IndexMap<Key, usize> = projected
        .iter()
        .map(|(unit, students)| (unit.clone(), students.len()))
        .collect();

    info!(
        "Projected {} placements across {} units from {} current",
        counts.values().sum::<usize>(),
        n,
        occupancy.total()
    );

    Ok(Projection {
        students: projected,
        counts,
    })
}
