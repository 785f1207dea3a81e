use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use super::coordinate::{CellRect, Coordinate};

static EMPTY: LazyLock<NaiveCellState> = LazyLock::new(|| NaiveCellState {
    alive: Arc::new(HashSet::new()),
});

/// Flat cell state: the set of alive coordinates.
/// The set is shared behind an `Arc`; every edit produces a new value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NaiveCellState {
    alive: Arc<HashSet<Coordinate>>,
}

impl NaiveCellState {
    pub fn new(alive: HashSet<Coordinate>) -> Self {
        Self {
            alive: Arc::new(alive),
        }
    }

    /// The shared empty state
    pub fn empty() -> Self {
        EMPTY.clone()
    }

    pub fn alive_cells(&self) -> &HashSet<Coordinate> {
        &self.alive
    }

    pub fn contains(&self, cell: Coordinate) -> bool {
        self.alive.contains(&cell)
    }

    pub fn population(&self) -> u64 {
        self.alive.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.alive.is_empty()
    }

    pub fn with_cell(&self, cell: Coordinate, alive: bool) -> Self {
        if self.contains(cell) == alive {
            return self.clone();
        }
        let mut next = HashSet::clone(&self.alive);
        if alive {
            next.insert(cell);
        } else {
            next.remove(&cell);
        }
        Self::new(next)
    }

    /// Translate every cell, `None` if one would leave the `i32` plane
    pub fn offset_by(&self, delta: Coordinate) -> Option<Self> {
        if delta == Coordinate::ORIGIN {
            return Some(self.clone());
        }
        self.alive
            .iter()
            .map(|c| c.checked_add(delta))
            .collect::<Option<HashSet<_>>>()
            .map(Self::new)
    }

    pub fn union(&self, other: &NaiveCellState) -> Self {
        if other.is_empty() {
            return self.clone();
        }
        Self::new(self.alive.union(&other.alive).copied().collect())
    }

    pub fn bounding_box(&self) -> Option<CellRect> {
        CellRect::enclosing(self.alive.iter())
    }
}

impl Default for NaiveCellState {
    fn default() -> Self {
        Self::empty()
    }
}

impl FromIterator<Coordinate> for NaiveCellState {
    fn from_iter<T: IntoIterator<Item = Coordinate>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
