/// Position of a single cell on the infinite grid.
/// `y` grows downwards, matching screen space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coordinate {
    pub x: i32,
    pub y: i32,
}

impl Coordinate {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Add without panicking on overflow
    pub fn checked_add(self, other: Self) -> Option<Self> {
        Some(Self {
            x: self.x.checked_add(other.x)?,
            y: self.y.checked_add(other.y)?,
        })
    }

    /// The 8 Moore neighbours, or `None` if any of them falls outside `i32`
    pub fn neighbors(self) -> Option<[Coordinate; 8]> {
        let mut out = [Coordinate::ORIGIN; 8];
        let mut i = 0;
        for dy in -1..=1 {
            for dx in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                out[i] = self.checked_add(Coordinate::new(dx, dy))?;
                i += 1;
            }
        }
        Some(out)
    }
}

impl From<(i32, i32)> for Coordinate {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Inclusive axis-aligned rectangle of cells
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRect {
    pub min: Coordinate,
    pub max: Coordinate,
}

impl CellRect {
    pub const fn new(min: Coordinate, max: Coordinate) -> Self {
        Self { min, max }
    }

    /// Smallest rectangle containing every coordinate, `None` if empty
    pub fn enclosing<'a>(cells: impl IntoIterator<Item = &'a Coordinate>) -> Option<Self> {
        cells.into_iter().fold(None, |rect, &c| {
            Some(match rect {
                None => Self::new(c, c),
                Some(r) => r.including(c),
            })
        })
    }

    pub fn including(self, c: Coordinate) -> Self {
        Self {
            min: Coordinate::new(self.min.x.min(c.x), self.min.y.min(c.y)),
            max: Coordinate::new(self.max.x.max(c.x), self.max.y.max(c.y)),
        }
    }

    pub fn width(&self) -> u64 {
        (i64::from(self.max.x) - i64::from(self.min.x) + 1) as u64
    }

    pub fn height(&self) -> u64 {
        (i64::from(self.max.y) - i64::from(self.min.y) + 1) as u64
    }

    pub fn contains(&self, c: Coordinate) -> bool {
        (self.min.x..=self.max.x).contains(&c.x) && (self.min.y..=self.max.y).contains(&c.y)
    }
}
