//! Snapshots of which students sit in which unit.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::sequence::SequenceTensor;
use crate::table::Key;

/// Ordered mapping from unit to the students currently in it.
///
/// Unit order matters: the `k`-th unit lines up with row and column `k` of
/// the transition matrix it is projected through.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupancy {
    units: IndexMap<Key, BTreeSet<Key>>,
}

impl Occupancy {
    /// Build from explicit `(unit, students)` pairs. A repeated unit merges
    /// its students into the first entry.
    pub fn from_sets<I>(sets: I) -> Self
    where
        I: IntoIterator<Item = (Key, BTreeSet<Key>)>,
    {
        let mut units: IndexMap<Key, BTreeSet<Key>> = IndexMap::new();
        for (unit, students) in sets {
            units.entry(unit).or_default().extend(students);
        }
        Self { units }
    }

    /// Every student who took each unit in any layer of `tensor`, in the
    /// tensor's unit order.
    #[must_use]
    pub fn from_tensor(tensor: &SequenceTensor) -> Self {
        Self::collect(tensor, |_, term| term != 0)
    }

    /// Students placed in each unit at their own most recent term.
    #[must_use]
    pub fn latest_from_tensor(tensor: &SequenceTensor) -> Self {
        let latest = tensor.latest_terms();
        Self::collect(tensor, |row, term| term != 0 && term == latest[row])
    }

    fn collect(tensor: &SequenceTensor, keep: impl Fn(usize, u32) -> bool) -> Self {
        let students = tensor.students();
        let units = tensor
            .units()
            .iter()
            .enumerate()
            .map(|(column, unit)| {
                let members: BTreeSet<Key> = tensor
                    .layers()
                    .iter()
                    .flat_map(|layer| {
                        layer
                            .column(column)
                            .indexed_iter()
                            .filter(|&(row, &term)| keep(row, term))
                            .map(|(row, _)| students[row].clone())
                            .collect::<Vec<_>>()
                    })
                    .collect();
                (unit.clone(), members)
            })
            .collect();
        Self { units }
    }

    /// Number of units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether there are no units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Units in order.
    pub fn units(&self) -> impl Iterator<Item = &Key> {
        self.units.keys()
    }

    /// `(unit, students)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&Key, &BTreeSet<Key>)> {
        self.units.iter()
    }

    /// Students in one unit.
    #[must_use]
    pub fn get(&self, unit: &Key) -> Option<&BTreeSet<Key>> {
        self.units.get(unit)
    }

    /// Head count per unit, in order.
    #[must_use]
    pub fn counts(&self) -> IndexMap<Key, usize> {
        self.units
            .iter()
            .map(|(unit, students)| (unit.clone(), students.len()))
            .collect()
    }

    /// Sum of head counts over all units.
    #[must_use]
    pub fn total(&self) -> usize {
        self.units.values().map(BTreeSet::len).sum()
    }
}
