//! Encoding-agnostic cell state.
//!
//! `CellState` is the value the rest of the crate passes around: the set of
//! alive cells on an infinite grid, stored either as a flat set or as a
//! HashLife quadtree. Both encodings are immutable, cheap to clone, and
//! compare equal whenever they hold the same alive cells.

use std::borrow::Cow;
use std::collections::HashSet;

use rand::Rng;

use super::coordinate::{CellRect, Coordinate};
use super::hashlife::HashLifeCellState;
use super::naive::NaiveCellState;

#[derive(Clone, Debug)]
pub enum CellState {
    Naive(NaiveCellState),
    HashLife(HashLifeCellState),
}

impl CellState {
    /// The canonical empty state
    pub fn empty() -> Self {
        CellState::Naive(NaiveCellState::empty())
    }

    /// Fill `region` with alive cells at the given density (0.0 - 1.0)
    pub fn random(region: CellRect, density: f64, rng: &mut impl Rng) -> Self {
        let density = density.clamp(0.0, 1.0);
        let mut alive = HashSet::new();
        for y in region.min.y..=region.max.y {
            for x in region.min.x..=region.max.x {
                if rng.random_bool(density) {
                    alive.insert(Coordinate::new(x, y));
                }
            }
        }
        CellState::Naive(NaiveCellState::new(alive))
    }

    pub fn alive_cells(&self) -> Cow<'_, HashSet<Coordinate>> {
        match self {
            CellState::Naive(naive) => Cow::Borrowed(naive.alive_cells()),
            CellState::HashLife(hashlife) => Cow::Owned(hashlife.alive_cells()),
        }
    }

    /// Visit every alive cell without materializing a set
    pub fn for_each_alive(&self, mut visit: impl FnMut(Coordinate)) {
        match self {
            CellState::Naive(naive) => naive.alive_cells().iter().copied().for_each(visit),
            CellState::HashLife(hashlife) => hashlife.for_each_alive(&mut visit),
        }
    }

    pub fn contains(&self, cell: Coordinate) -> bool {
        match self {
            CellState::Naive(naive) => naive.contains(cell),
            CellState::HashLife(hashlife) => hashlife.contains(cell),
        }
    }

    pub fn population(&self) -> u64 {
        match self {
            CellState::Naive(naive) => naive.population(),
            CellState::HashLife(hashlife) => hashlife.population(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.population() == 0
    }

    pub fn with_cell(&self, cell: Coordinate, alive: bool) -> Self {
        match self {
            CellState::Naive(naive) => CellState::Naive(naive.with_cell(cell, alive)),
            CellState::HashLife(hashlife) => CellState::HashLife(hashlife.with_cell(cell, alive)),
        }
    }

    /// Translate every alive cell by `delta`.
    /// `None` if any of them would leave the `i32` plane, in either encoding.
    pub fn offset_by(&self, delta: Coordinate) -> Option<Self> {
        match self {
            CellState::Naive(naive) => naive.offset_by(delta).map(CellState::Naive),
            CellState::HashLife(hashlife) => hashlife.offset_by(delta).map(CellState::HashLife),
        }
    }

    /// Union of both states, kept in this state's encoding
    pub fn union(&self, other: &CellState) -> Self {
        match (self, other) {
            (CellState::Naive(a), CellState::Naive(b)) => CellState::Naive(a.union(b)),
            (CellState::HashLife(a), CellState::HashLife(b)) => CellState::HashLife(a.union(b)),
            (CellState::Naive(a), other) => CellState::Naive(a.union(&other.to_naive())),
            (CellState::HashLife(a), other) => {
                CellState::HashLife(a.union(&other.to_hash_life()))
            }
        }
    }

    pub fn bounding_box(&self) -> Option<CellRect> {
        match self {
            CellState::Naive(naive) => naive.bounding_box(),
            CellState::HashLife(hashlife) => hashlife.bounding_box(),
        }
    }

    pub fn to_naive(&self) -> NaiveCellState {
        match self {
            CellState::Naive(naive) => naive.clone(),
            CellState::HashLife(hashlife) => NaiveCellState::new(hashlife.alive_cells()),
        }
    }

    pub fn to_hash_life(&self) -> HashLifeCellState {
        match self {
            CellState::Naive(naive) => naive.alive_cells().iter().copied().collect(),
            CellState::HashLife(hashlife) => hashlife.clone(),
        }
    }

    /// Same shape, ignoring absolute position
    pub fn equals_modulo_offset(&self, other: &CellState) -> bool {
        match (self.bounding_box(), other.bounding_box()) {
            (None, None) => true,
            (Some(a), Some(b)) => {
                a.width() == b.width()
                    && a.height() == b.height()
                    && self.population() == other.population()
                    && self.shape_from(a.min) == other.shape_from(b.min)
            }
            _ => false,
        }
    }

    /// Alive cells relative to `anchor`, widened so any pair on the plane fits
    fn shape_from(&self, anchor: Coordinate) -> HashSet<(i64, i64)> {
        let mut shape = HashSet::with_capacity(self.population() as usize);
        self.for_each_alive(|c| {
            shape.insert((
                i64::from(c.x) - i64::from(anchor.x),
                i64::from(c.y) - i64::from(anchor.y),
            ));
        });
        shape
    }
}

impl Default for CellState {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for CellState {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CellState::Naive(a), CellState::Naive(b)) => a == b,
            (CellState::HashLife(a), CellState::HashLife(b)) => a == b,
            _ => {
                self.population() == other.population()
                    && self.alive_cells() == other.alive_cells()
            }
        }
    }
}

impl Eq for CellState {}

impl FromIterator<Coordinate> for CellState {
    fn from_iter<T: IntoIterator<Item = Coordinate>>(iter: T) -> Self {
        CellState::Naive(iter.into_iter().collect())
    }
}

impl From<NaiveCellState> for CellState {
    fn from(state: NaiveCellState) -> Self {
        CellState::Naive(state)
    }
}

impl From<HashLifeCellState> for CellState {
    fn from(state: HashLifeCellState) -> Self {
        CellState::HashLife(state)
    }
}
