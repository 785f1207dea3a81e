mod algorithm;
mod cell_state;
mod coordinate;
mod hashlife;
mod hashlife_algorithm;
mod macro_cell;
mod naive;
mod naive_algorithm;
mod patterns;
mod rule;

pub use algorithm::{Algorithm, GameOfLifeAlgorithm, StepError, UnknownAlgorithm};
pub use cell_state::CellState;
pub use coordinate::{CellRect, Coordinate};
pub use hashlife::HashLifeCellState;
pub use hashlife_algorithm::HashLifeAlgorithm;
pub use macro_cell::{MAX_LEVEL, MacroCell, MacroCellError, Node, Quadrant, create_empty_macro_cell};
pub use naive::NaiveCellState;
pub use naive_algorithm::{NaiveAlgorithm, ParallelNaiveAlgorithm};
pub use patterns::{Pattern, presets};
pub use rule::{is_conway_rule, next_state};
