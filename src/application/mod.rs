mod camera;
mod clock;
mod driver;
mod pacer;
mod temporal_state;

pub use camera::Camera;
pub use clock::{Clock, TokioClock};
pub use driver::{DEFAULT_RATE_WINDOW, EvolutionDriver, EvolutionError, EvolutionHandle};
pub use pacer::{RateAverager, StepPacer};
pub use temporal_state::{
    DEFAULT_GENERATIONS_PER_STEP, DEFAULT_TARGET_STEPS_PER_SECOND, EvolutionStatus, StateError,
    TemporalGameOfLifeState, TemporalSnapshot,
};
