// Domain layer - cell states and step algorithms
pub mod domain;

// Application layer - temporal evolution and viewport
pub mod application;

// Pattern file formats
pub mod serialization;

pub mod config;

// Viewer - UI, rendering, input
pub mod ui;
pub mod rendering;
pub mod input;

// Re-exports for convenience
pub use application::{
    Camera, EvolutionDriver, EvolutionError, EvolutionHandle, EvolutionStatus, TemporalGameOfLifeState,
};
pub use config::Config;
pub use domain::{Algorithm, CellState, Coordinate, GameOfLifeAlgorithm, Pattern, StepError, presets};
pub use serialization::{CellStateFormat, DeserializationResult, ParseMessage};
