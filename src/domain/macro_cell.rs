//! Quadtree nodes for the HashLife cell-state encoding.
//!
//! A `MacroCell` of level `L` covers a `2^L × 2^L` square whose local origin is
//! its top-left corner. Nodes are immutable and shared through `Arc`, so
//! editing a tree reallocates only the path from the root to the edited leaf.
//! Every other subtree, including the canonical empty subtrees handed out by
//! [`create_empty_macro_cell`], is shared by reference.

use std::fmt;
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use thiserror::Error;

/// Deepest tree that may be built. Large enough to cover the whole `i32`
/// coordinate plane with room for HashLife's border expansion.
pub const MAX_LEVEL: u32 = 48;

static ALIVE_CELL: LazyLock<Arc<MacroCell>> = LazyLock::new(|| Arc::new(MacroCell::Cell(true)));
static DEAD_CELL: LazyLock<Arc<MacroCell>> = LazyLock::new(|| Arc::new(MacroCell::Cell(false)));

/// Canonical all-dead trees indexed by level, grown lazily
static EMPTY_NODES: LazyLock<Mutex<Vec<Arc<MacroCell>>>> =
    LazyLock::new(|| Mutex::new(vec![DEAD_CELL.clone()]));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MacroCellError {
    #[error("macro cell level must be non-negative, got {0}")]
    NegativeLevel(i32),

    #[error("macro cell level {0} exceeds the maximum of {max}", max = MAX_LEVEL)]
    LevelTooLarge(i32),
}

/// Quadrant order used for `Node::children`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quadrant {
    NorthWest = 0,
    NorthEast = 1,
    SouthWest = 2,
    SouthEast = 3,
}

impl Quadrant {
    /// Quadrant of a node at `level` containing local cell `(x, y)`
    const fn containing(level: u32, x: u64, y: u64) -> (Quadrant, u64, u64) {
        let half = 1u64 << (level - 1);
        match (x >= half, y >= half) {
            (false, false) => (Quadrant::NorthWest, x, y),
            (true, false) => (Quadrant::NorthEast, x - half, y),
            (false, true) => (Quadrant::SouthWest, x, y - half),
            (true, true) => (Quadrant::SouthEast, x - half, y - half),
        }
    }

    /// Local offset of this quadrant inside a node at `level`
    const fn offset(self, level: u32) -> (u64, u64) {
        let half = 1u64 << (level - 1);
        match self {
            Quadrant::NorthWest => (0, 0),
            Quadrant::NorthEast => (half, 0),
            Quadrant::SouthWest => (0, half),
            Quadrant::SouthEast => (half, half),
        }
    }

    const ALL: [Quadrant; 4] = [
        Quadrant::NorthWest,
        Quadrant::NorthEast,
        Quadrant::SouthWest,
        Quadrant::SouthEast,
    ];
}

/// Inner quadtree node. `size` is the number of alive cells below it.
pub struct Node {
    level: u32,
    size: u64,
    children: [Arc<MacroCell>; 4],
}

impl Node {
    fn from_children(children: [Arc<MacroCell>; 4]) -> Self {
        let level = children[0].level() + 1;
        debug_assert!(
            children.iter().all(|c| c.level() + 1 == level),
            "children of a node must share a level"
        );
        let size = children.iter().map(|c| c.size()).sum();
        Self {
            level,
            size,
            children,
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn child(&self, quadrant: Quadrant) -> &Arc<MacroCell> {
        &self.children[quadrant as usize]
    }

    pub fn nw(&self) -> &Arc<MacroCell> {
        self.child(Quadrant::NorthWest)
    }

    pub fn ne(&self) -> &Arc<MacroCell> {
        self.child(Quadrant::NorthEast)
    }

    pub fn sw(&self) -> &Arc<MacroCell> {
        self.child(Quadrant::SouthWest)
    }

    pub fn se(&self) -> &Arc<MacroCell> {
        self.child(Quadrant::SouthEast)
    }

    pub fn children(&self) -> &[Arc<MacroCell>; 4] {
        &self.children
    }
}

/// A HashLife quadtree: either a single cell or a node with four equal-level children
pub enum MacroCell {
    Cell(bool),
    Node(Node),
}

impl MacroCell {
    /// The shared alive leaf
    pub fn alive_cell() -> Arc<MacroCell> {
        ALIVE_CELL.clone()
    }

    /// The shared dead leaf
    pub fn dead_cell() -> Arc<MacroCell> {
        DEAD_CELL.clone()
    }

    pub fn leaf(alive: bool) -> Arc<MacroCell> {
        if alive {
            Self::alive_cell()
        } else {
            Self::dead_cell()
        }
    }

    /// Build a node from four children of equal level (nw, ne, sw, se)
    pub fn node(
        nw: Arc<MacroCell>,
        ne: Arc<MacroCell>,
        sw: Arc<MacroCell>,
        se: Arc<MacroCell>,
    ) -> Arc<MacroCell> {
        Arc::new(MacroCell::Node(Node::from_children([nw, ne, sw, se])))
    }

    pub fn level(&self) -> u32 {
        match self {
            MacroCell::Cell(_) => 0,
            MacroCell::Node(node) => node.level,
        }
    }

    /// Number of alive cells covered
    pub fn size(&self) -> u64 {
        match self {
            MacroCell::Cell(alive) => u64::from(*alive),
            MacroCell::Node(node) => node.size,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Side length of the covered square
    pub fn side(&self) -> u64 {
        1u64 << self.level()
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            MacroCell::Cell(_) => None,
            MacroCell::Node(node) => Some(node),
        }
    }

    /// Whether local cell `(x, y)` is alive
    pub fn contains(&self, x: u64, y: u64) -> bool {
        if x >= self.side() || y >= self.side() {
            return false;
        }
        let (mut x, mut y) = (x, y);
        let mut current = self;
        loop {
            match current {
                MacroCell::Cell(alive) => return *alive,
                MacroCell::Node(node) => {
                    if node.size == 0 {
                        return false;
                    }
                    let (quadrant, qx, qy) = Quadrant::containing(node.level, x, y);
                    x = qx;
                    y = qy;
                    current = node.child(quadrant);
                }
            }
        }
    }

    /// Copy-on-path update of local cell `(x, y)`.
    /// Returns `self` unchanged (same allocation) when the cell already has that state.
    pub fn with_cell(self: &Arc<Self>, x: u64, y: u64, alive: bool) -> Arc<MacroCell> {
        debug_assert!(x < self.side() && y < self.side(), "cell outside macro cell");
        match &**self {
            MacroCell::Cell(current) if *current == alive => Arc::clone(self),
            MacroCell::Cell(_) => Self::leaf(alive),
            MacroCell::Node(node) => {
                let (quadrant, qx, qy) = Quadrant::containing(node.level, x, y);
                let old_child = node.child(quadrant);
                let new_child = old_child.with_cell(qx, qy, alive);
                if Arc::ptr_eq(old_child, &new_child) {
                    return Arc::clone(self);
                }
                let mut children = node.children.clone();
                children[quadrant as usize] = new_child;
                Arc::new(MacroCell::Node(Node::from_children(children)))
            }
        }
    }

    /// Visit every alive cell as local `(x, y)` offset from `origin`,
    /// skipping empty subtrees
    pub fn for_each_alive(&self, origin: (i64, i64), visit: &mut impl FnMut(i64, i64)) {
        match self {
            MacroCell::Cell(true) => visit(origin.0, origin.1),
            MacroCell::Cell(false) => {}
            MacroCell::Node(node) => {
                if node.size == 0 {
                    return;
                }
                for quadrant in Quadrant::ALL {
                    let (dx, dy) = quadrant.offset(node.level);
                    node.child(quadrant)
                        .for_each_alive((origin.0 + dx as i64, origin.1 + dy as i64), visit);
                }
            }
        }
    }

    /// Local bounds of alive cells as `(min_x, min_y, max_x, max_y)`, inclusive
    pub fn extent(&self) -> Option<(u64, u64, u64, u64)> {
        match self {
            MacroCell::Cell(true) => Some((0, 0, 0, 0)),
            MacroCell::Cell(false) => None,
            MacroCell::Node(node) => {
                if node.size == 0 {
                    return None;
                }
                Quadrant::ALL
                    .into_iter()
                    .filter_map(|quadrant| {
                        let (dx, dy) = quadrant.offset(node.level);
                        node.child(quadrant)
                            .extent()
                            .map(|(x0, y0, x1, y1)| (x0 + dx, y0 + dy, x1 + dx, y1 + dy))
                    })
                    .reduce(|a, b| (a.0.min(b.0), a.1.min(b.1), a.2.max(b.2), a.3.max(b.3)))
            }
        }
    }
}

impl fmt::Debug for MacroCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MacroCell::Cell(alive) => f.debug_tuple("Cell").field(alive).finish(),
            MacroCell::Node(node) => f
                .debug_struct("Node")
                .field("level", &node.level)
                .field("size", &node.size)
                .finish_non_exhaustive(),
        }
    }
}

/// All-dead tree of `level`, shared with every other caller asking for the same level
pub(crate) fn empty_macro_cell(level: u32) -> Arc<MacroCell> {
    let mut table = EMPTY_NODES.lock().unwrap_or_else(PoisonError::into_inner);
    while table.len() <= level as usize {
        let below = Arc::clone(&table[table.len() - 1]);
        let next = MacroCell::node(Arc::clone(&below), Arc::clone(&below), Arc::clone(&below), below);
        table.push(next);
    }
    Arc::clone(&table[level as usize])
}

/// Balanced all-dead quadtree of the given level.
/// Level 0 is the shared dead leaf; higher levels are memoized per level.
pub fn create_empty_macro_cell(level: i32) -> Result<Arc<MacroCell>, MacroCellError> {
    if level < 0 {
        return Err(MacroCellError::NegativeLevel(level));
    }
    if level as u32 > MAX_LEVEL {
        return Err(MacroCellError::LevelTooLarge(level));
    }
    Ok(empty_macro_cell(level as u32))
}
