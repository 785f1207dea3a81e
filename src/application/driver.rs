//! The temporal evolution driver.
//!
//! One driver task per session turns wall-clock time into steps: it sleeps
//! until the next step is due, advances the published cell state with the
//! configured algorithm, and publishes the result together with a rolling
//! throughput estimate. Settings changes wake it immediately.

use std::panic;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{error, info, trace};
use thiserror::Error;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::task::JoinHandle;

use super::clock::{Clock, TokioClock};
use super::pacer::{RateAverager, StepPacer};
use super::temporal_state::{EvolutionStatus, TemporalGameOfLifeState};
use crate::domain::{GameOfLifeAlgorithm, StepError};

pub const DEFAULT_RATE_WINDOW: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvolutionError {
    #[error("step algorithm failed: {0}")]
    Step(#[from] StepError),
}

pub struct EvolutionDriver<C: Clock = TokioClock> {
    clock: C,
    algorithm: Arc<dyn GameOfLifeAlgorithm>,
    rate_window: usize,
}

impl EvolutionDriver<TokioClock> {
    pub fn new(algorithm: Arc<dyn GameOfLifeAlgorithm>) -> Self {
        Self::with_clock(TokioClock, algorithm)
    }
}

impl<C: Clock> EvolutionDriver<C> {
    pub fn with_clock(clock: C, algorithm: Arc<dyn GameOfLifeAlgorithm>) -> Self {
        Self {
            clock,
            algorithm,
            rate_window: DEFAULT_RATE_WINDOW,
        }
    }

    /// Number of ticks averaged for the reported rate
    pub fn rate_window(mut self, rate_window: usize) -> Self {
        self.rate_window = rate_window;
        self
    }

    /// Run against `state` on the current tokio runtime
    pub fn spawn(self, state: TemporalGameOfLifeState) -> EvolutionHandle {
        let stop = Arc::new(AtomicBool::new(false));
        let task = tokio::spawn(self.run(state.clone(), Arc::clone(&stop)));
        EvolutionHandle {
            task: Some(task),
            stop,
            state,
        }
    }

    /// The driver loop. Returns when `stop` is set or the first step fails.
    pub async fn run(
        self,
        state: TemporalGameOfLifeState,
        stop: Arc<AtomicBool>,
    ) -> Result<(), EvolutionError> {
        let mut changes = state.subscribe();
        // Pacing belongs to the run epoch it was started under
        let mut pacer: Option<(u64, StepPacer)> = None;
        let mut rate = RateAverager::new(self.rate_window);
        info!("evolution driver started with {}", self.algorithm.name());

        while !stop.load(Ordering::Acquire) {
            let (is_running, run_epoch, steps_per_second) = {
                let snapshot = changes.borrow_and_update();
                (snapshot.is_running, snapshot.run_epoch, snapshot.target_steps_per_second)
            };

            // Leftover time is dropped on every pause, including one we only
            // learn about from the epoch, so resuming never bursts
            if pacer.as_ref().is_some_and(|(epoch, _)| !is_running || *epoch != run_epoch) {
                pacer = None;
                rate.clear();
                info!("evolution paused");
            }
            if !is_running {
                if changes.changed().await.is_err() {
                    break;
                }
                continue;
            }

            let (epoch, active) = pacer.get_or_insert_with(|| {
                let now = self.clock.now();
                info!("evolution running at {steps_per_second} steps/s");
                rate.restart(now);
                (run_epoch, StepPacer::new(now))
            });
            let epoch = *epoch;
            let deadline = active.next_deadline(steps_per_second);

            tokio::select! {
                biased;
                changed = changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                () = self.clock.sleep_until(deadline) => {
                    self.tick(&state, epoch, active, &mut rate, &stop)?;
                }
            }
        }

        info!("evolution driver stopped");
        Ok(())
    }

    fn tick(
        &self,
        state: &TemporalGameOfLifeState,
        run_epoch: u64,
        pacer: &mut StepPacer,
        rate: &mut RateAverager,
        stop: &AtomicBool,
    ) -> Result<(), EvolutionError> {
        let now = self.clock.now();
        let snapshot = state.snapshot();
        let steps = pacer.tick(now, snapshot.target_steps_per_second);
        if steps == 0 {
            return Ok(());
        }

        let generations = steps.saturating_mul(u64::from(snapshot.generations_per_step));
        let batch = u32::try_from(generations).unwrap_or(u32::MAX);
        trace!("tick: {steps} step(s), {batch} generation(s)");

        let step = || self.algorithm.advance(&snapshot.cell_state, batch);
        // Keep other tasks on this worker moving during a long batch
        let next = match Handle::try_current().map(|handle| handle.runtime_flavor()) {
            Ok(RuntimeFlavor::MultiThread) => tokio::task::block_in_place(step),
            _ => step(),
        }
        .map_err(|err| {
            error!("evolution stopped at generation {}: {err}", snapshot.generation);
            EvolutionError::from(err)
        })?;
        let average = rate.record(now, u64::from(batch));

        let published = state.publish_if(
            |current| {
                !stop.load(Ordering::Acquire)
                    && current.is_running
                    && current.run_epoch == run_epoch
                    && current.cell_state_version == snapshot.cell_state_version
            },
            |current| {
                current.cell_state = next;
                current.generation += u64::from(batch);
                current.status = EvolutionStatus::Running {
                    average_generations_per_second: average,
                };
            },
        );
        if !published {
            trace!("tick discarded: state changed while stepping");
        }
        Ok(())
    }
}

/// Owner of a spawned driver. Dropping it cancels the driver.
pub struct EvolutionHandle {
    task: Option<JoinHandle<Result<(), EvolutionError>>>,
    stop: Arc<AtomicBool>,
    state: TemporalGameOfLifeState,
}

impl EvolutionHandle {
    /// Stop the driver. Once this returns no further tick is published.
    pub fn cancel(&self) {
        self.stop.store(true, Ordering::Release);
        if let Some(task) = &self.task {
            task.abort();
        }
        // A publish already holding the lock finishes before we get it
        self.state.synchronize();
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Wait for the driver to end. Step failures are returned; panics are resumed.
    pub async fn join(mut self) -> Result<(), EvolutionError> {
        let Some(task) = self.task.take() else {
            return Ok(());
        };
        match task.await {
            Ok(result) => result,
            Err(err) if err.is_panic() => panic::resume_unwind(err.into_panic()),
            Err(_) => Ok(()),
        }
    }
}

impl Drop for EvolutionHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Algorithm, CellState, Coordinate, NaiveAlgorithm, presets};
    use std::time::Duration;

    /// Let the driver task observe timer and channel wake-ups
    async fn settle() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    async fn advance_ms(ms: u64) {
        tokio::time::advance(Duration::from_millis(ms)).await;
        settle().await;
    }

    fn naive() -> Arc<dyn GameOfLifeAlgorithm> {
        Arc::new(NaiveAlgorithm)
    }

    /// Fails on the first step
    struct Exploding;

    impl GameOfLifeAlgorithm for Exploding {
        fn name(&self) -> &'static str {
            "Exploding"
        }

        fn advance(&self, _: &CellState, _: u32) -> Result<CellState, StepError> {
            Err(StepError::CoordinateOverflow { generation: 0 })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_step_per_period_at_8ms_ticks() {
        let state = TemporalGameOfLifeState::new(presets::blinker().cell_state());
        let handle = EvolutionDriver::new(naive()).spawn(state.clone());
        settle().await;
        state.set_is_running(true);
        settle().await;

        advance_ms(8).await;
        assert_eq!(state.generation(), 0);
        advance_ms(8).await;
        assert_eq!(state.generation(), 0);
        advance_ms(8).await;
        assert_eq!(state.generation(), 1);
        advance_ms(8).await;
        assert_eq!(state.generation(), 1);
        advance_ms(8).await;
        assert_eq!(state.generation(), 2);

        assert!(state.status().average_generations_per_second().is_some());
        handle.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_generations_per_step_batches() {
        let state = TemporalGameOfLifeState::new(presets::glider().cell_state());
        state.set_generations_per_step(4).unwrap();
        state.set_target_steps_per_second(10.0).unwrap();
        let _handle = EvolutionDriver::new(naive()).spawn(state.clone());
        state.set_is_running(true);
        settle().await;

        advance_ms(100).await;
        assert_eq!(state.generation(), 4);
        assert_eq!(
            state.cell_state(),
            presets::glider().cell_state().offset_by(Coordinate::new(1, 1)).unwrap()
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_discards_time_and_resume_does_not_burst() {
        let state = TemporalGameOfLifeState::new(presets::blinker().cell_state());
        let _handle = EvolutionDriver::new(naive()).spawn(state.clone());
        state.set_is_running(true);
        settle().await;

        advance_ms(24).await;
        assert_eq!(state.generation(), 1);

        // 7ms of leftover time is dropped here
        state.set_is_running(false);
        settle().await;
        assert_eq!(state.status(), EvolutionStatus::Paused);

        advance_ms(1000).await;
        assert_eq!(state.generation(), 1);

        state.set_is_running(true);
        settle().await;
        assert_eq!(state.generation(), 1);

        advance_ms(10).await;
        assert_eq!(state.generation(), 1);
        advance_ms(8).await;
        assert_eq!(state.generation(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unobserved_pause_still_discards_leftover_time() {
        let state = TemporalGameOfLifeState::new(presets::blinker().cell_state());
        let _handle = EvolutionDriver::new(naive()).spawn(state.clone());
        state.set_is_running(true);
        settle().await;

        advance_ms(24).await;
        assert_eq!(state.generation(), 1);

        // Both land before the driver wakes, so it never sees a paused
        // snapshot; the 7ms carry must still go
        state.set_is_running(false);
        state.set_is_running(true);
        settle().await;

        advance_ms(10).await;
        assert_eq!(state.generation(), 1);
        advance_ms(8).await;
        assert_eq!(state.generation(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_change_mid_period_counts_elapsed_time() {
        let state = TemporalGameOfLifeState::new(presets::blinker().cell_state());
        state.set_target_steps_per_second(10.0).unwrap();
        let _handle = EvolutionDriver::new(naive()).spawn(state.clone());
        state.set_is_running(true);
        settle().await;

        advance_ms(60).await;
        assert_eq!(state.generation(), 0);

        // 60ms already covers one 50ms period at the new rate
        state.set_target_steps_per_second(20.0).unwrap();
        settle().await;
        assert_eq!(state.generation(), 1);

        advance_ms(30).await;
        assert_eq!(state.generation(), 1);
        advance_ms(10).await;
        assert_eq!(state.generation(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_runs_on_multi_thread_runtime() {
        let state = TemporalGameOfLifeState::new(presets::glider().cell_state());
        state.set_target_steps_per_second(200.0).unwrap();
        let handle = EvolutionDriver::new(Algorithm::HashLife.build(1024)).spawn(state.clone());
        state.set_is_running(true);

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(state.generation() > 0);
        assert!(!handle.is_finished());
        handle.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_tick_after_cancel() {
        let state = TemporalGameOfLifeState::new(presets::blinker().cell_state());
        let handle = EvolutionDriver::new(naive()).spawn(state.clone());
        state.set_is_running(true);
        settle().await;
        advance_ms(20).await;
        assert_eq!(state.generation(), 1);

        handle.cancel();
        advance_ms(1000).await;
        assert_eq!(state.generation(), 1);
        assert!(handle.join().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequential_drivers_hand_off() {
        let state = TemporalGameOfLifeState::new(presets::blinker().cell_state());
        state.set_is_running(true);

        let first = EvolutionDriver::new(naive()).spawn(state.clone());
        settle().await;
        advance_ms(20).await;
        drop(first);

        let second = EvolutionDriver::new(Algorithm::HashLife.build(1024)).spawn(state.clone());
        settle().await;
        advance_ms(20).await;
        assert_eq!(state.generation(), 2);
        assert_eq!(state.cell_state(), presets::blinker().cell_state());
        second.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_external_write_becomes_new_baseline() {
        let state = TemporalGameOfLifeState::new(presets::blinker().cell_state());
        let _handle = EvolutionDriver::new(naive()).spawn(state.clone());
        state.set_is_running(true);
        settle().await;
        advance_ms(20).await;

        let block = presets::block().placed_at(Coordinate::new(50, 50)).unwrap();
        state.set_cell_state(block.clone());
        advance_ms(20).await;
        assert_eq!(state.cell_state(), block);
        assert_eq!(state.generation(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_step_failure_ends_the_run() {
        let state = TemporalGameOfLifeState::new(presets::blinker().cell_state());
        let handle = EvolutionDriver::new(Arc::new(Exploding)).spawn(state.clone());
        state.set_is_running(true);
        settle().await;
        advance_ms(20).await;

        assert!(handle.is_finished());
        assert_eq!(
            handle.join().await,
            Err(EvolutionError::Step(StepError::CoordinateOverflow { generation: 0 }))
        );
        assert_eq!(state.generation(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_reports_running_average() {
        let state = TemporalGameOfLifeState::new(presets::blinker().cell_state());
        state.set_target_steps_per_second(10.0).unwrap();
        state.set_generations_per_step(2).unwrap();
        let _handle = EvolutionDriver::new(naive()).spawn(state.clone());
        state.set_is_running(true);
        settle().await;

        for _ in 0..5 {
            advance_ms(100).await;
        }
        let average = state.status().average_generations_per_second().unwrap();
        assert!((average - 20.0).abs() < 0.5, "{average}");
    }
}
