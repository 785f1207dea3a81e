use super::cell_state::CellState;
use super::coordinate::Coordinate;

/// A named arrangement of alive cells, anchored at the origin
#[derive(Clone, Debug)]
pub struct Pattern {
    pub name: &'static str,
    pub description: &'static str,
    pub cells: Vec<Coordinate>,
}

impl Pattern {
    pub fn new(name: &'static str, description: &'static str, cells: &[(i32, i32)]) -> Self {
        Self {
            name,
            description,
            cells: cells.iter().map(|&c| Coordinate::from(c)).collect(),
        }
    }

    pub fn cell_state(&self) -> CellState {
        self.cells.iter().copied().collect()
    }

    /// The pattern with its top-left anchor moved to `origin`,
    /// `None` if part of it would fall off the `i32` plane
    pub fn placed_at(&self, origin: Coordinate) -> Option<CellState> {
        self.cell_state().offset_by(origin)
    }
}

/// Classic Game of Life patterns
pub mod presets {
    use super::*;

    /// Glider - simplest spaceship, moves diagonally
    pub fn glider() -> Pattern {
        Pattern::new(
            "Glider",
            "Moves diagonally (period 4)",
            &[(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)],
        )
    }

    pub fn blinker() -> Pattern {
        Pattern::new("Blinker", "Oscillator (period 2)", &[(0, 1), (1, 1), (2, 1)])
    }

    pub fn toad() -> Pattern {
        Pattern::new(
            "Toad",
            "Oscillator (period 2)",
            &[(1, 0), (2, 0), (3, 0), (0, 1), (1, 1), (2, 1)],
        )
    }

    pub fn beacon() -> Pattern {
        Pattern::new(
            "Beacon",
            "Oscillator (period 2)",
            &[(0, 0), (1, 0), (0, 1), (3, 2), (2, 3), (3, 3)],
        )
    }

    /// Pulsar - period 3, four-fold symmetric
    pub fn pulsar() -> Pattern {
        let mut cells = Vec::with_capacity(48);
        for &a in &[0, 5, 7, 12] {
            for &b in &[2, 3, 4, 8, 9, 10] {
                cells.push((b, a));
                cells.push((a, b));
            }
        }
        let mut pattern = Pattern::new("Pulsar", "Oscillator (period 3)", &cells);
        pattern.cells.sort();
        pattern.cells.dedup();
        pattern
    }

    /// Lightweight spaceship, travelling west
    pub fn lwss() -> Pattern {
        Pattern::new(
            "LWSS",
            "Lightweight Spaceship (period 4)",
            &[
                (1, 0), (4, 0),
                (0, 1),
                (0, 2), (4, 2),
                (0, 3), (1, 3), (2, 3), (3, 3),
            ],
        )
    }

    /// Gosper glider gun - emits a glider every 30 generations
    pub fn glider_gun() -> Pattern {
        Pattern::new(
            "Gosper Glider Gun",
            "Produces gliders (period 30)",
            &[
                (0, 4), (0, 5), (1, 4), (1, 5),
                (10, 4), (10, 5), (10, 6), (11, 3), (11, 7), (12, 2), (12, 8), (13, 2), (13, 8),
                (14, 5), (15, 3), (15, 7), (16, 4), (16, 5), (16, 6), (17, 5),
                (20, 2), (20, 3), (20, 4), (21, 2), (21, 3), (21, 4), (22, 1), (22, 5),
                (24, 0), (24, 1), (24, 5), (24, 6),
                (34, 2), (34, 3), (35, 2), (35, 3),
            ],
        )
    }

    /// R-pentomino - methuselah, stabilizes after 1103 generations
    pub fn r_pentomino() -> Pattern {
        Pattern::new(
            "R-pentomino",
            "Methuselah - stabilizes at gen 1103",
            &[(1, 0), (2, 0), (0, 1), (1, 1), (1, 2)],
        )
    }

    /// Acorn - methuselah, stabilizes after 5206 generations
    pub fn acorn() -> Pattern {
        Pattern::new(
            "Acorn",
            "Methuselah - stabilizes at gen 5206",
            &[(1, 0), (3, 1), (0, 2), (1, 2), (4, 2), (5, 2), (6, 2)],
        )
    }

    pub fn block() -> Pattern {
        Pattern::new("Block", "Still life", &[(0, 0), (1, 0), (0, 1), (1, 1)])
    }

    /// Six cells in a row; blooms into a pair of blinker-like rings
    pub fn six_long_line() -> Pattern {
        Pattern::new(
            "Six-long line",
            "Row of six cells",
            &[(0, 0), (1, 0), (2, 0), (3, 0), (4, 0), (5, 0)],
        )
    }

    pub fn all_patterns() -> Vec<Pattern> {
        vec![
            glider(),
            blinker(),
            toad(),
            beacon(),
            pulsar(),
            lwss(),
            glider_gun(),
            r_pentomino(),
            acorn(),
            block(),
            six_long_line(),
        ]
    }

    /// Look a preset up by name, ignoring case, spaces and dashes
    pub fn by_name(name: &str) -> Option<Pattern> {
        let key = |s: &str| -> String {
            s.chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase()
        };
        let wanted = key(name);
        all_patterns().into_iter().find(|p| key(p.name) == wanted)
    }
}

#[cfg(test)]
mod tests {
    use super::presets::*;
    use super::*;
    use crate::domain::algorithm::Algorithm;

    #[test]
    fn test_six_long_line_sequence() {
        let expected_gen1: CellState = (1..=4)
            .flat_map(|x| (-1..=1).map(move |y| Coordinate::new(x, y)))
            .collect();
        let expected_gen2: CellState = [
            (1, -1), (4, -1), (1, 1), (4, 1), (0, 0), (5, 0),
            (2, -2), (3, -2), (2, 2), (3, 2),
        ]
        .into_iter()
        .map(Coordinate::from)
        .collect();

        let start = six_long_line().cell_state();
        for algorithm in Algorithm::all() {
            let algorithm = algorithm.build(10_000);
            let gen1 = algorithm.advance(&start, 1).unwrap();
            let gen2 = algorithm.advance(&gen1, 1).unwrap();
            assert_eq!(gen1, expected_gen1, "{}", algorithm.name());
            assert_eq!(gen2, expected_gen2, "{}", algorithm.name());
            assert_eq!(algorithm.advance(&start, 2).unwrap(), expected_gen2);
        }
    }

    #[test]
    fn test_glider_moves_diagonally() {
        let glider = glider().cell_state();
        for algorithm in Algorithm::all() {
            let moved = algorithm.build(10_000).advance(&glider, 4).unwrap();
            assert_eq!(Some(moved), glider.offset_by(Coordinate::new(1, 1)));
        }
    }

    #[test]
    fn test_oscillator_periods() {
        let cases = [(blinker(), 2), (toad(), 2), (beacon(), 2), (pulsar(), 3)];
        for algorithm in Algorithm::all() {
            let algorithm = algorithm.build(10_000);
            for (pattern, period) in &cases {
                let state = pattern.cell_state();
                assert_ne!(algorithm.advance(&state, 1).unwrap(), state, "{}", pattern.name);
                assert_eq!(algorithm.advance(&state, *period).unwrap(), state, "{}", pattern.name);
            }
        }
    }

    #[test]
    fn test_lwss_travels() {
        let lwss = lwss().cell_state();
        let moved = Algorithm::Naive.build(0).advance(&lwss, 4).unwrap();
        assert_ne!(moved, lwss);
        assert!(moved.equals_modulo_offset(&lwss));
    }

    #[test]
    fn test_pulsar_has_48_cells() {
        assert_eq!(pulsar().cells.len(), 48);
    }

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(by_name("r pentomino").map(|p| p.name), Some("R-pentomino"));
        assert_eq!(by_name("GOSPER-glider-gun").map(|p| p.name), Some("Gosper Glider Gun"));
        assert!(by_name("nothing").is_none());
    }

    #[test]
    fn test_placed_at_offsets_anchor() {
        let block = block().placed_at(Coordinate::new(-10, 3)).unwrap();
        assert!(block.contains(Coordinate::new(-10, 3)));
        assert!(block.contains(Coordinate::new(-9, 4)));
        assert_eq!(block.population(), 4);
    }

    #[test]
    fn test_placed_at_plane_edge() {
        assert!(block().placed_at(Coordinate::new(i32::MAX, 0)).is_none());
        let corner = block().placed_at(Coordinate::new(i32::MAX - 1, i32::MAX - 1)).unwrap();
        assert!(corner.contains(Coordinate::new(i32::MAX, i32::MAX)));
    }
}
