//! Observable holder for a running simulation session.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;

use crate::domain::{CellState, GameOfLifeAlgorithm, StepError};

pub const DEFAULT_GENERATIONS_PER_STEP: u32 = 1;
pub const DEFAULT_TARGET_STEPS_PER_SECOND: f64 = 60.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StateError {
    #[error("generations per step must be at least 1")]
    ZeroGenerationsPerStep,

    #[error("target steps per second must be a positive finite number, got {0}")]
    InvalidTargetRate(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EvolutionStatus {
    Paused,
    Running { average_generations_per_second: f64 },
}

impl EvolutionStatus {
    pub fn average_generations_per_second(&self) -> Option<f64> {
        match self {
            EvolutionStatus::Paused => None,
            EvolutionStatus::Running {
                average_generations_per_second,
            } => Some(*average_generations_per_second),
        }
    }
}

/// Everything a consumer sees at one instant. Replaced as a whole on every
/// update, so the cell state and status always belong together.
#[derive(Debug, Clone)]
pub struct TemporalSnapshot {
    pub cell_state: CellState,
    pub is_running: bool,
    pub generations_per_step: u32,
    pub target_steps_per_second: f64,
    pub status: EvolutionStatus,
    /// Generations advanced since the last restart
    pub generation: u64,
    /// Bumped by every external cell-state write
    pub(crate) cell_state_version: u64,
    /// Bumped by every pause and every resume
    pub(crate) run_epoch: u64,
}

impl TemporalSnapshot {
    fn new(cell_state: CellState) -> Self {
        Self {
            cell_state,
            is_running: false,
            generations_per_step: DEFAULT_GENERATIONS_PER_STEP,
            target_steps_per_second: DEFAULT_TARGET_STEPS_PER_SECOND,
            status: EvolutionStatus::Paused,
            generation: 0,
            cell_state_version: 0,
            run_epoch: 0,
        }
    }
}

fn validate_rate(target_steps_per_second: f64) -> Result<f64, StateError> {
    if target_steps_per_second.is_finite() && target_steps_per_second > 0.0 {
        Ok(target_steps_per_second)
    } else {
        Err(StateError::InvalidTargetRate(target_steps_per_second))
    }
}

/// Shared handle to a simulation session.
///
/// Clones refer to the same session. Every write goes through one
/// `watch` channel lock, and subscribers are woken after each one.
#[derive(Clone, Debug)]
pub struct TemporalGameOfLifeState {
    sender: Arc<watch::Sender<TemporalSnapshot>>,
}

impl TemporalGameOfLifeState {
    pub fn new(cell_state: CellState) -> Self {
        let (sender, _) = watch::channel(TemporalSnapshot::new(cell_state));
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn with_settings(
        cell_state: CellState,
        generations_per_step: u32,
        target_steps_per_second: f64,
    ) -> Result<Self, StateError> {
        let state = Self::new(cell_state);
        state.set_generations_per_step(generations_per_step)?;
        state.set_target_steps_per_second(target_steps_per_second)?;
        Ok(state)
    }

    pub fn snapshot(&self) -> TemporalSnapshot {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TemporalSnapshot> {
        self.sender.subscribe()
    }

    pub fn cell_state(&self) -> CellState {
        self.sender.borrow().cell_state.clone()
    }

    pub fn is_running(&self) -> bool {
        self.sender.borrow().is_running
    }

    pub fn generations_per_step(&self) -> u32 {
        self.sender.borrow().generations_per_step
    }

    pub fn target_steps_per_second(&self) -> f64 {
        self.sender.borrow().target_steps_per_second
    }

    pub fn status(&self) -> EvolutionStatus {
        self.sender.borrow().status
    }

    pub fn generation(&self) -> u64 {
        self.sender.borrow().generation
    }

    /// Replace the cell state. A driver tick computed from the old state is discarded.
    pub fn set_cell_state(&self, cell_state: CellState) {
        self.sender.send_modify(|snapshot| {
            snapshot.cell_state = cell_state;
            snapshot.cell_state_version += 1;
        });
    }

    /// Edit the cell state atomically with respect to driver publishes
    pub fn update_cell_state(&self, edit: impl FnOnce(&CellState) -> CellState) {
        self.sender.send_modify(|snapshot| {
            snapshot.cell_state = edit(&snapshot.cell_state);
            snapshot.cell_state_version += 1;
        });
    }

    /// Load a new pattern and reset the generation counter
    pub fn restart(&self, cell_state: CellState) {
        self.sender.send_modify(|snapshot| {
            snapshot.cell_state = cell_state;
            snapshot.generation = 0;
            snapshot.cell_state_version += 1;
        });
    }

    pub fn set_is_running(&self, is_running: bool) {
        self.sender.send_if_modified(|snapshot| {
            if snapshot.is_running == is_running {
                return false;
            }
            snapshot.is_running = is_running;
            snapshot.run_epoch += 1;
            snapshot.status = if is_running {
                EvolutionStatus::Running {
                    average_generations_per_second: 0.0,
                }
            } else {
                EvolutionStatus::Paused
            };
            true
        });
    }

    pub fn toggle_running(&self) {
        self.set_is_running(!self.is_running());
    }

    pub fn set_generations_per_step(&self, generations_per_step: u32) -> Result<(), StateError> {
        if generations_per_step == 0 {
            return Err(StateError::ZeroGenerationsPerStep);
        }
        self.sender
            .send_modify(|snapshot| snapshot.generations_per_step = generations_per_step);
        Ok(())
    }

    pub fn set_target_steps_per_second(&self, target_steps_per_second: f64) -> Result<(), StateError> {
        let target = validate_rate(target_steps_per_second)?;
        self.sender
            .send_modify(|snapshot| snapshot.target_steps_per_second = target);
        Ok(())
    }

    /// Advance one step synchronously with `algorithm`, outside any driver
    pub fn step_with(&self, algorithm: &dyn GameOfLifeAlgorithm) -> Result<u64, StepError> {
        let (input, generations) = {
            let snapshot = self.sender.borrow();
            (snapshot.cell_state.clone(), snapshot.generations_per_step)
        };
        let next = algorithm.advance(&input, generations)?;
        self.sender.send_modify(|snapshot| {
            snapshot.cell_state = next;
            snapshot.generation += u64::from(generations);
            snapshot.cell_state_version += 1;
        });
        Ok(u64::from(generations))
    }

    /// Publish a driver tick unless `accept` rejects the current snapshot
    pub(crate) fn publish_if(
        &self,
        accept: impl FnOnce(&TemporalSnapshot) -> bool,
        publish: impl FnOnce(&mut TemporalSnapshot),
    ) -> bool {
        self.sender.send_if_modified(|snapshot| {
            if !accept(snapshot) {
                return false;
            }
            publish(snapshot);
            true
        })
    }

    /// Take and release the state lock once
    pub(crate) fn synchronize(&self) {
        self.sender.send_if_modified(|_| false);
    }
}

impl Default for TemporalGameOfLifeState {
    fn default() -> Self {
        Self::new(CellState::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Algorithm, presets};

    #[test]
    fn test_defaults() {
        let state = TemporalGameOfLifeState::default();
        assert!(!state.is_running());
        assert_eq!(state.generations_per_step(), 1);
        assert_eq!(state.target_steps_per_second(), 60.0);
        assert_eq!(state.status(), EvolutionStatus::Paused);
        assert!(state.cell_state().is_empty());
    }

    #[test]
    fn test_running_flag_drives_status() {
        let state = TemporalGameOfLifeState::default();
        state.set_is_running(true);
        assert_eq!(
            state.status(),
            EvolutionStatus::Running {
                average_generations_per_second: 0.0
            }
        );
        state.toggle_running();
        assert_eq!(state.status(), EvolutionStatus::Paused);
        assert_eq!(state.status().average_generations_per_second(), None);
    }

    #[test]
    fn test_setters_reject_invalid_values() {
        let state = TemporalGameOfLifeState::default();
        assert_eq!(
            state.set_generations_per_step(0),
            Err(StateError::ZeroGenerationsPerStep)
        );
        assert!(state.set_target_steps_per_second(0.0).is_err());
        assert!(state.set_target_steps_per_second(-3.0).is_err());
        assert!(state.set_target_steps_per_second(f64::NAN).is_err());
        assert!(state.set_target_steps_per_second(f64::INFINITY).is_err());
        assert_eq!(state.generations_per_step(), 1);
        assert_eq!(state.target_steps_per_second(), 60.0);

        state.set_generations_per_step(4).unwrap();
        state.set_target_steps_per_second(0.5).unwrap();
        assert_eq!(state.generations_per_step(), 4);
        assert_eq!(state.target_steps_per_second(), 0.5);
    }

    #[test]
    fn test_clones_share_the_session() {
        let state = TemporalGameOfLifeState::default();
        let other = state.clone();
        other.set_cell_state(presets::block().cell_state());
        assert_eq!(state.cell_state(), presets::block().cell_state());
    }

    #[test]
    fn test_external_writes_bump_version() {
        let state = TemporalGameOfLifeState::default();
        let before = state.snapshot().cell_state_version;
        state.update_cell_state(|cells| cells.with_cell(crate::domain::Coordinate::new(1, 1), true));
        state.restart(CellState::empty());
        assert_eq!(state.snapshot().cell_state_version, before + 2);

        // Settings changes leave the version alone
        state.set_generations_per_step(2).unwrap();
        state.set_is_running(true);
        assert_eq!(state.snapshot().cell_state_version, before + 2);
    }

    #[test]
    fn test_run_epoch_counts_real_transitions() {
        let state = TemporalGameOfLifeState::default();
        let start = state.snapshot().run_epoch;
        state.set_is_running(false);
        assert_eq!(state.snapshot().run_epoch, start);

        state.set_is_running(true);
        state.set_is_running(true);
        state.set_is_running(false);
        state.set_is_running(true);
        assert_eq!(state.snapshot().run_epoch, start + 3);
        assert!(state.is_running());
    }

    #[test]
    fn test_step_with_advances_counter() {
        let state = TemporalGameOfLifeState::new(presets::blinker().cell_state());
        state.set_generations_per_step(3).unwrap();
        let algorithm = Algorithm::Naive.build(0);
        assert_eq!(state.step_with(algorithm.as_ref()), Ok(3));
        assert_eq!(state.generation(), 3);
        assert_ne!(state.cell_state(), presets::blinker().cell_state());

        state.restart(presets::blinker().cell_state());
        assert_eq!(state.generation(), 0);
    }

    #[tokio::test]
    async fn test_subscribers_see_whole_snapshots() {
        let state = TemporalGameOfLifeState::default();
        let mut rx = state.subscribe();
        state.set_cell_state(presets::glider().cell_state());
        rx.changed().await.unwrap();
        let seen = rx.borrow_and_update().clone();
        assert_eq!(seen.cell_state, presets::glider().cell_state());
        assert!(!seen.is_running);
    }
}
