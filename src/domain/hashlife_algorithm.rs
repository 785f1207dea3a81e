//! Hash-consed, memoizing quadtree evaluation.
//!
//! Nodes are interned in a canonical table keyed by the identity of their four
//! children, so two equal subtrees are the same allocation. The one-generation
//! centred successor of every canonical node of level 2 or more is memoized by
//! node identity; repeated regions of space and time are therefore computed
//! once. Both tables sit behind one `Mutex` and are flushed together when they
//! grow past the configured bound.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use log::debug;

use super::algorithm::{GameOfLifeAlgorithm, StepError};
use super::cell_state::CellState;
use super::hashlife::HashLifeCellState;
use super::macro_cell::{MacroCell, empty_macro_cell};
use super::rule::next_state;

type ChildKey = [usize; 4];

fn child_key(children: &[Arc<MacroCell>; 4]) -> ChildKey {
    [
        Arc::as_ptr(&children[0]) as usize,
        Arc::as_ptr(&children[1]) as usize,
        Arc::as_ptr(&children[2]) as usize,
        Arc::as_ptr(&children[3]) as usize,
    ]
}

fn quadrants(cell: &MacroCell) -> &[Arc<MacroCell>; 4] {
    match cell {
        MacroCell::Node(node) => node.children(),
        MacroCell::Cell(_) => unreachable!("leaves have no quadrants"),
    }
}

#[derive(Default)]
struct Universe {
    /// Interned nodes. Each value owns its children, which keeps the keys valid.
    canonical: HashMap<ChildKey, Arc<MacroCell>>,
    /// Canonical node address -> its centred successor one generation later
    successors: HashMap<usize, Arc<MacroCell>>,
}

impl Universe {
    fn len(&self) -> usize {
        self.canonical.len() + self.successors.len()
    }

    fn clear(&mut self) {
        self.successors.clear();
        self.canonical.clear();
    }

    /// Canonical node with the given (canonical) children
    fn join(
        &mut self,
        nw: Arc<MacroCell>,
        ne: Arc<MacroCell>,
        sw: Arc<MacroCell>,
        se: Arc<MacroCell>,
    ) -> Arc<MacroCell> {
        let children = [nw, ne, sw, se];
        let key = child_key(&children);
        if let Some(existing) = self.canonical.get(&key) {
            return Arc::clone(existing);
        }

        let level = children[0].level() + 1;
        let empty_below = empty_macro_cell(level - 1);
        let node = if children.iter().all(|c| Arc::ptr_eq(c, &empty_below)) {
            empty_macro_cell(level)
        } else {
            let [nw, ne, sw, se] = children;
            MacroCell::node(nw, ne, sw, se)
        };
        self.canonical.insert(key, Arc::clone(&node));
        node
    }

    fn is_canonical(&self, cell: &Arc<MacroCell>) -> bool {
        match &**cell {
            MacroCell::Cell(_) => true,
            MacroCell::Node(node) => {
                Arc::ptr_eq(cell, &empty_macro_cell(node.level()))
                    || self
                        .canonical
                        .get(&child_key(node.children()))
                        .is_some_and(|c| Arc::ptr_eq(c, cell))
            }
        }
    }

    /// Rebuild a tree out of canonical nodes
    fn canonicalize(&mut self, root: &Arc<MacroCell>) -> Arc<MacroCell> {
        let mut seen = HashMap::new();
        self.canonicalize_with(root, &mut seen)
    }

    fn canonicalize_with(
        &mut self,
        cell: &Arc<MacroCell>,
        seen: &mut HashMap<usize, Arc<MacroCell>>,
    ) -> Arc<MacroCell> {
        if self.is_canonical(cell) {
            return Arc::clone(cell);
        }
        let address = Arc::as_ptr(cell) as usize;
        if let Some(done) = seen.get(&address) {
            return Arc::clone(done);
        }
        let [nw, ne, sw, se] = quadrants(cell);
        let nw = self.canonicalize_with(nw, seen);
        let ne = self.canonicalize_with(ne, seen);
        let sw = self.canonicalize_with(sw, seen);
        let se = self.canonicalize_with(se, seen);
        let result = self.join(nw, ne, sw, se);
        seen.insert(address, Arc::clone(&result));
        result
    }

    /// Level `L - 1` square at the centre of a level `L` node
    fn centered_subnode(&mut self, cell: &MacroCell) -> Arc<MacroCell> {
        let [nw, ne, sw, se] = quadrants(cell);
        self.join(
            Arc::clone(&quadrants(nw)[3]),
            Arc::clone(&quadrants(ne)[2]),
            Arc::clone(&quadrants(sw)[1]),
            Arc::clone(&quadrants(se)[0]),
        )
    }

    /// Level `L - 1` square straddling the border of two side-by-side level `L` nodes
    fn centered_horizontal(&mut self, west: &MacroCell, east: &MacroCell) -> Arc<MacroCell> {
        let [_, w_ne, _, w_se] = quadrants(west);
        let [e_nw, _, e_sw, _] = quadrants(east);
        self.join(
            Arc::clone(&quadrants(w_ne)[3]),
            Arc::clone(&quadrants(e_nw)[2]),
            Arc::clone(&quadrants(w_se)[1]),
            Arc::clone(&quadrants(e_sw)[0]),
        )
    }

    /// Level `L - 1` square straddling the border of two stacked level `L` nodes
    fn centered_vertical(&mut self, north: &MacroCell, south: &MacroCell) -> Arc<MacroCell> {
        let [_, _, n_sw, n_se] = quadrants(north);
        let [s_nw, s_ne, _, _] = quadrants(south);
        self.join(
            Arc::clone(&quadrants(n_sw)[3]),
            Arc::clone(&quadrants(n_se)[2]),
            Arc::clone(&quadrants(s_nw)[1]),
            Arc::clone(&quadrants(s_ne)[0]),
        )
    }

    /// Level `L - 2` square at the centre of a level `L` node
    fn centered_sub_subnode(&mut self, cell: &MacroCell) -> Arc<MacroCell> {
        let [nw, ne, sw, se] = quadrants(cell);
        let inner = |c: &Arc<MacroCell>, q: usize, r: usize| {
            Arc::clone(&quadrants(&quadrants(c)[q])[r])
        };
        self.join(
            inner(nw, 3, 3),
            inner(ne, 2, 2),
            inner(sw, 1, 1),
            inner(se, 0, 0),
        )
    }

    /// Centre 2x2 of a 4x4 node after one generation, computed directly
    fn level_two_successor(&mut self, cell: &MacroCell) -> Arc<MacroCell> {
        let mut grid = [[false; 4]; 4];
        for (q, child) in quadrants(cell).iter().enumerate() {
            let (ox, oy) = ((q % 2) * 2, (q / 2) * 2);
            for (k, leaf) in quadrants(child).iter().enumerate() {
                grid[oy + k / 2][ox + k % 2] = leaf.size() == 1;
            }
        }
        let next = |x: usize, y: usize| {
            let mut neighbors = 0u8;
            for ny in y - 1..=y + 1 {
                for nx in x - 1..=x + 1 {
                    if (nx, ny) != (x, y) && grid[ny][nx] {
                        neighbors += 1;
                    }
                }
            }
            MacroCell::leaf(next_state(grid[y][x], neighbors))
        };
        self.join(next(1, 1), next(2, 1), next(1, 2), next(2, 2))
    }

    /// Centred level `L - 1` square one generation later, for a canonical level `L >= 2` node
    fn successor(&mut self, cell: &Arc<MacroCell>) -> Arc<MacroCell> {
        if cell.is_empty() {
            return empty_macro_cell(cell.level() - 1);
        }
        let address = Arc::as_ptr(cell) as usize;
        if let Some(next) = self.successors.get(&address) {
            return Arc::clone(next);
        }

        let result = if cell.level() == 2 {
            self.level_two_successor(cell)
        } else {
            let [nw, ne, sw, se] = quadrants(cell);
            let n00 = self.centered_subnode(nw);
            let n01 = self.centered_horizontal(nw, ne);
            let n02 = self.centered_subnode(ne);
            let n10 = self.centered_vertical(nw, sw);
            let n11 = self.centered_sub_subnode(cell);
            let n12 = self.centered_vertical(ne, se);
            let n20 = self.centered_subnode(sw);
            let n21 = self.centered_horizontal(sw, se);
            let n22 = self.centered_subnode(se);

            let a = self.join(n00, n01.clone(), n10.clone(), n11.clone());
            let b = self.join(n01, n02, n11.clone(), n12.clone());
            let c = self.join(n10, n11.clone(), n20, n21.clone());
            let d = self.join(n11, n12, n21, n22);

            let a = self.successor(&a);
            let b = self.successor(&b);
            let c = self.successor(&c);
            let d = self.successor(&d);
            self.join(a, b, c, d)
        };
        self.successors.insert(address, Arc::clone(&result));
        result
    }

    /// Surround `root` with empty space: same centre, one level higher
    fn expand(&mut self, root: &Arc<MacroCell>) -> Arc<MacroCell> {
        let empty = empty_macro_cell(root.level() - 1);
        let [nw, ne, sw, se] = quadrants(root).clone();
        let e = || Arc::clone(&empty);
        let nw = self.join(e(), e(), e(), nw);
        let ne = self.join(e(), e(), ne, e());
        let sw = self.join(e(), sw, e(), e());
        let se = self.join(se, e(), e(), e());
        self.join(nw, ne, sw, se)
    }

    /// Advance a universe by one generation
    fn step(
        &mut self,
        origin: (i64, i64),
        root: Arc<MacroCell>,
    ) -> (i64, i64, Arc<MacroCell>) {
        let (mut x, mut y) = origin;
        let mut root = root;
        if root.level() == 0 {
            let dead = MacroCell::dead_cell();
            root = self.join(root, dead.clone(), dead.clone(), dead);
        }
        // The whole pattern must sit in the centre quarter so nothing escapes
        // the successor square within one generation
        loop {
            let centre_population = if root.level() >= 3 {
                self.centered_sub_subnode(&root).size()
            } else {
                u64::MAX
            };
            if centre_population == root.size() {
                break;
            }
            let half = 1i64 << (root.level() - 1);
            root = self.expand(&root);
            x -= half;
            y -= half;
        }
        let quarter = 1i64 << (root.level() - 2);
        let next = self.successor(&root);
        (x + quarter, y + quarter, next)
    }
}

/// HashLife step algorithm; the cache is shared by every caller
pub struct HashLifeAlgorithm {
    universe: Mutex<Universe>,
    max_cache_entries: usize,
}

impl HashLifeAlgorithm {
    pub fn new(max_cache_entries: usize) -> Self {
        Self {
            universe: Mutex::new(Universe::default()),
            max_cache_entries,
        }
    }

    /// Number of interned nodes plus memoized successors
    pub fn cache_entries(&self) -> usize {
        self.universe
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn clear_cache(&self) {
        self.universe
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Default for HashLifeAlgorithm {
    fn default() -> Self {
        Self::new(1_000_000)
    }
}

impl GameOfLifeAlgorithm for HashLifeAlgorithm {
    fn name(&self) -> &'static str {
        "HashLife"
    }

    fn advance(&self, state: &CellState, generations: u32) -> Result<CellState, StepError> {
        if generations == 0 {
            return Ok(state.clone());
        }
        let start = state.to_hash_life();
        let mut origin = start.origin();
        let mut root = Arc::clone(start.root());

        let mut universe = self.universe.lock().unwrap_or_else(PoisonError::into_inner);
        for generation in 0..generations {
            if root.is_empty() {
                return Ok(CellState::HashLife(HashLifeCellState::empty()));
            }
            if universe.len() > self.max_cache_entries {
                debug!(
                    "flushing hashlife cache ({} entries, limit {})",
                    universe.len(),
                    self.max_cache_entries
                );
                universe.clear();
            }
            root = universe.canonicalize(&root);
            let (x, y, next) = universe.step(origin, root);
            origin = (x, y);
            root = next;

            let stepped = HashLifeCellState::from_root(origin, Arc::clone(&root));
            if let Some((x0, y0, x1, y1)) = stepped.extent() {
                let range = i64::from(i32::MIN)..=i64::from(i32::MAX);
                if ![x0, y0, x1, y1].iter().all(|v| range.contains(v)) {
                    return Err(StepError::CoordinateOverflow { generation });
                }
            }
        }
        Ok(CellState::HashLife(HashLifeCellState::from_root(origin, root)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::coordinate::Coordinate;
    use crate::domain::naive_algorithm::NaiveAlgorithm;

    fn cells(coords: &[(i32, i32)]) -> CellState {
        coords.iter().map(|&c| Coordinate::from(c)).collect()
    }

    #[test]
    fn test_single_cell_dies() {
        let next = HashLifeAlgorithm::default()
            .advance(&cells(&[(9, 9)]), 1)
            .unwrap();
        assert!(next.is_empty());
    }

    #[test]
    fn test_blinker_oscillates_at_negative_coordinates() {
        let horizontal = cells(&[(-101, -50), (-100, -50), (-99, -50)]);
        let vertical = cells(&[(-100, -51), (-100, -50), (-100, -49)]);
        let hashlife = HashLifeAlgorithm::default();
        assert_eq!(hashlife.advance(&horizontal, 1).unwrap(), vertical);
        assert_eq!(hashlife.advance(&horizontal, 2).unwrap(), horizontal);
        assert_eq!(hashlife.advance(&horizontal, 101).unwrap(), vertical);
    }

    #[test]
    fn test_agrees_with_naive() {
        let acorn = cells(&[(1, 0), (3, 1), (0, 2), (1, 2), (4, 2), (5, 2), (6, 2)]);
        let hashlife = HashLifeAlgorithm::default();
        let mut expected = acorn.clone();
        let mut actual = acorn;
        for _ in 0..30 {
            expected = NaiveAlgorithm.advance(&expected, 7).unwrap();
            actual = hashlife.advance(&actual, 7).unwrap();
            assert_eq!(actual, expected);
        }
    }

    #[test]
    fn test_cache_is_flushed_when_over_limit() {
        let hashlife = HashLifeAlgorithm::new(64);
        let r_pentomino = cells(&[(1, 0), (2, 0), (0, 1), (1, 1), (1, 2)]);
        let result = hashlife.advance(&r_pentomino, 50).unwrap();
        assert_eq!(result, NaiveAlgorithm.advance(&r_pentomino, 50).unwrap());
        assert!(hashlife.cache_entries() > 0);

        hashlife.clear_cache();
        assert_eq!(hashlife.cache_entries(), 0);
    }

    #[test]
    fn test_interned_nodes_are_shared() {
        let mut universe = Universe::default();
        let alive = MacroCell::alive_cell();
        let dead = MacroCell::dead_cell();
        let a = universe.join(alive.clone(), dead.clone(), dead.clone(), alive.clone());
        let b = universe.join(alive.clone(), dead.clone(), dead.clone(), alive);
        assert!(Arc::ptr_eq(&a, &b));

        let empty = universe.join(dead.clone(), dead.clone(), dead.clone(), dead);
        assert!(Arc::ptr_eq(&empty, &empty_macro_cell(1)));
    }

    #[test]
    fn test_overflow_is_reported() {
        let edge = cells(&[(0, i32::MIN), (1, i32::MIN), (2, i32::MIN)]);
        assert_eq!(
            HashLifeAlgorithm::default().advance(&edge, 1),
            Err(StepError::CoordinateOverflow { generation: 0 })
        );
    }
}
