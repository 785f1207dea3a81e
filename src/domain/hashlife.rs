use std::collections::HashSet;
use std::sync::Arc;

use super::coordinate::{CellRect, Coordinate};
use super::macro_cell::{MacroCell, empty_macro_cell};

/// Quadtree-backed cell state.
///
/// `root` covers `[origin, origin + 2^level)` on both axes. The origin is kept
/// in `i64` so the tree may grow past the `i32` plane while it is being
/// stepped; alive cells always stay inside `i32`.
#[derive(Clone, Debug)]
pub struct HashLifeCellState {
    origin: (i64, i64),
    root: Arc<MacroCell>,
}

impl HashLifeCellState {
    pub fn empty() -> Self {
        Self {
            origin: (0, 0),
            root: MacroCell::dead_cell(),
        }
    }

    /// Wrap an existing tree whose top-left corner sits at `origin`
    pub fn from_root(origin: (i64, i64), root: Arc<MacroCell>) -> Self {
        Self { origin, root }
    }

    pub fn root(&self) -> &Arc<MacroCell> {
        &self.root
    }

    pub fn origin(&self) -> (i64, i64) {
        self.origin
    }

    pub fn population(&self) -> u64 {
        self.root.size()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    fn local(&self, cell: Coordinate) -> Option<(u64, u64)> {
        let dx = i64::from(cell.x) - self.origin.0;
        let dy = i64::from(cell.y) - self.origin.1;
        let side = self.root.side() as i64;
        ((0..side).contains(&dx) && (0..side).contains(&dy)).then_some((dx as u64, dy as u64))
    }

    pub fn contains(&self, cell: Coordinate) -> bool {
        if self.root.is_empty() {
            return false;
        }
        self.local(cell)
            .is_some_and(|(x, y)| self.root.contains(x, y))
    }

    /// Double the covered square towards `cell`: the old root becomes one
    /// quadrant and the other three are canonical empty trees of its level
    fn grown_towards(&self, cell: Coordinate) -> Self {
        let level = self.root.level();
        let side = self.root.side() as i64;
        let empty = empty_macro_cell(level);
        let old = Arc::clone(&self.root);
        let grow_west = i64::from(cell.x) < self.origin.0;
        let grow_north = i64::from(cell.y) < self.origin.1;

        let root = match (grow_west, grow_north) {
            (false, false) => MacroCell::node(old, empty.clone(), empty.clone(), empty),
            (true, false) => MacroCell::node(empty.clone(), old, empty.clone(), empty),
            (false, true) => MacroCell::node(empty.clone(), empty.clone(), old, empty),
            (true, true) => MacroCell::node(empty.clone(), empty.clone(), empty, old),
        };
        let origin = (
            if grow_west { self.origin.0 - side } else { self.origin.0 },
            if grow_north { self.origin.1 - side } else { self.origin.1 },
        );
        Self { origin, root }
    }

    /// Set one cell, copying only the root-to-leaf path
    pub fn with_cell(&self, cell: Coordinate, alive: bool) -> Self {
        if self.root.is_empty() {
            if !alive {
                return self.clone();
            }
            // Nothing to share: re-anchor a fresh leaf on the cell itself
            return Self {
                origin: (i64::from(cell.x), i64::from(cell.y)),
                root: MacroCell::alive_cell(),
            };
        }

        let mut grown = self.clone();
        loop {
            if let Some((x, y)) = grown.local(cell) {
                return Self {
                    origin: grown.origin,
                    root: grown.root.with_cell(x, y, alive),
                };
            }
            if !alive {
                // Dead outside the tree already
                return self.clone();
            }
            grown = grown.grown_towards(cell);
        }
    }

    /// Translation only moves the origin; the tree is shared as-is.
    /// `None` if an alive cell would leave the `i32` plane.
    pub fn offset_by(&self, delta: Coordinate) -> Option<Self> {
        let moved = Self {
            origin: (
                self.origin.0 + i64::from(delta.x),
                self.origin.1 + i64::from(delta.y),
            ),
            root: Arc::clone(&self.root),
        };
        match moved.extent() {
            Some((x0, y0, x1, y1)) if !on_plane(x0, y0) || !on_plane(x1, y1) => None,
            _ => Some(moved),
        }
    }

    pub fn for_each_alive(&self, mut visit: impl FnMut(Coordinate)) {
        self.root.for_each_alive(self.origin, &mut |x, y| {
            if let Some(cell) = to_coordinate(x, y) {
                visit(cell);
            }
        });
    }

    pub fn alive_cells(&self) -> HashSet<Coordinate> {
        let mut cells = HashSet::with_capacity(self.population() as usize);
        self.for_each_alive(|c| {
            cells.insert(c);
        });
        cells
    }

    /// Alive-cell bounds in absolute `i64` coordinates
    pub(crate) fn extent(&self) -> Option<(i64, i64, i64, i64)> {
        self.root.extent().map(|(x0, y0, x1, y1)| {
            (
                self.origin.0 + x0 as i64,
                self.origin.1 + y0 as i64,
                self.origin.0 + x1 as i64,
                self.origin.1 + y1 as i64,
            )
        })
    }

    pub fn bounding_box(&self) -> Option<CellRect> {
        let (x0, y0, x1, y1) = self.extent()?;
        Some(CellRect::new(to_coordinate(x0, y0)?, to_coordinate(x1, y1)?))
    }

    pub fn union(&self, other: &HashLifeCellState) -> Self {
        let mut result = self.clone();
        other.for_each_alive(|c| result = result.with_cell(c, true));
        result
    }
}

fn to_coordinate(x: i64, y: i64) -> Option<Coordinate> {
    Some(Coordinate::new(i32::try_from(x).ok()?, i32::try_from(y).ok()?))
}

fn on_plane(x: i64, y: i64) -> bool {
    to_coordinate(x, y).is_some()
}

impl Default for HashLifeCellState {
    fn default() -> Self {
        Self::empty()
    }
}

impl PartialEq for HashLifeCellState {
    fn eq(&self, other: &Self) -> bool {
        if self.origin == other.origin && Arc::ptr_eq(&self.root, &other.root) {
            return true;
        }
        self.population() == other.population() && self.alive_cells() == other.alive_cells()
    }
}

impl Eq for HashLifeCellState {}

impl FromIterator<Coordinate> for HashLifeCellState {
    fn from_iter<T: IntoIterator<Item = Coordinate>>(iter: T) -> Self {
        iter.into_iter()
            .fold(Self::empty(), |state, cell| state.with_cell(cell, true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(coords: &[(i32, i32)]) -> HashLifeCellState {
        coords.iter().map(|&c| Coordinate::from(c)).collect()
    }

    #[test]
    fn test_growth_in_all_directions() {
        let coords = [(0, 0), (-9, 3), (17, -40), (-100, -100), (63, 64)];
        let state = cells(&coords);

        assert_eq!(state.population(), coords.len() as u64);
        for &(x, y) in &coords {
            assert!(state.contains(Coordinate::new(x, y)), "missing ({x}, {y})");
        }
        assert!(!state.contains(Coordinate::new(1, 1)));
        assert!(!state.contains(Coordinate::new(i32::MAX, i32::MIN)));
        assert_eq!(
            state.alive_cells(),
            coords.iter().map(|&c| Coordinate::from(c)).collect::<HashSet<_>>()
        );
    }

    #[test]
    fn test_growth_reuses_old_root_and_empty_trees() {
        let small = cells(&[(0, 0), (1, 1)]);
        let grown = small.with_cell(Coordinate::new(-1, 0), true);
        let node = grown.root().as_node().unwrap();

        // Growing west: the old tree becomes the north-east quadrant
        assert!(Arc::ptr_eq(node.ne(), small.root()));
        let empty = empty_macro_cell(small.root().level());
        assert!(Arc::ptr_eq(node.sw(), &empty));
        assert!(Arc::ptr_eq(node.se(), &empty));
    }

    #[test]
    fn test_clearing_outside_bounds_is_noop() {
        let state = cells(&[(2, 2)]);
        let same = state.with_cell(Coordinate::new(1000, 1000), false);
        assert!(Arc::ptr_eq(state.root(), same.root()));
    }

    #[test]
    fn test_offset_shares_tree() {
        let state = cells(&[(0, 0), (3, 1)]);
        let moved = state.offset_by(Coordinate::new(-5, 8)).unwrap();
        assert!(Arc::ptr_eq(state.root(), moved.root()));
        assert!(moved.contains(Coordinate::new(-2, 9)));
        assert_eq!(moved.offset_by(Coordinate::new(5, -8)), Some(state));
    }

    #[test]
    fn test_offset_off_the_plane_is_rejected() {
        let state = cells(&[(i32::MAX, 0), (0, i32::MIN)]);
        assert_eq!(state.offset_by(Coordinate::new(1, 0)), None);
        assert_eq!(state.offset_by(Coordinate::new(0, -1)), None);

        let inward = state.offset_by(Coordinate::new(-1, 1)).unwrap();
        assert_eq!(
            inward.alive_cells(),
            HashSet::from([
                Coordinate::new(i32::MAX - 1, 1),
                Coordinate::new(-1, i32::MIN + 1)
            ])
        );
    }

    #[test]
    fn test_with_cell_at_plane_corners() {
        let corners = [
            (i32::MIN, i32::MIN),
            (i32::MAX, i32::MIN),
            (i32::MIN, i32::MAX),
            (i32::MAX, i32::MAX),
        ];
        let state = cells(&corners);
        assert_eq!(state.population(), 4);
        for &(x, y) in &corners {
            assert!(state.contains(Coordinate::new(x, y)));
        }
        let rect = state.bounding_box().unwrap();
        assert_eq!(rect.min, Coordinate::new(i32::MIN, i32::MIN));
        assert_eq!(rect.max, Coordinate::new(i32::MAX, i32::MAX));

        let cleared = state.with_cell(Coordinate::new(i32::MAX, i32::MAX), false);
        assert_eq!(cleared.population(), 3);
        assert!(!cleared.contains(Coordinate::new(i32::MAX, i32::MAX)));
    }

    #[test]
    fn test_bounding_box() {
        let state = cells(&[(-3, 4), (6, -2)]);
        let rect = state.bounding_box().unwrap();
        assert_eq!(rect.min, Coordinate::new(-3, -2));
        assert_eq!(rect.max, Coordinate::new(6, 4));
        assert!(HashLifeCellState::empty().bounding_box().is_none());
    }
}
