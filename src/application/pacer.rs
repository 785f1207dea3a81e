//! Wall-clock to step arithmetic for the evolution driver.
//!
//! Both types are plain values with no timers of their own, so the driver's
//! timing rules can be tested without a runtime.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

/// Absorbs float error so a tick landing exactly on a step boundary counts it
const STEP_EPSILON: f64 = 1e-4;

/// Turns elapsed time into whole steps.
///
/// Leftover time below one step period is carried to the next tick as a
/// duration, so changing the rate between ticks never turns it into a burst.
#[derive(Clone, Copy, Debug)]
pub struct StepPacer {
    last_tick: Instant,
    carry: Duration,
}

impl StepPacer {
    /// Start pacing from `now` with nothing carried over
    pub fn new(now: Instant) -> Self {
        Self {
            last_tick: now,
            carry: Duration::ZERO,
        }
    }

    pub fn step_period(steps_per_second: f64) -> Duration {
        Duration::from_secs_f64(1.0 / steps_per_second)
    }

    pub fn carry(&self) -> Duration {
        self.carry
    }

    /// Earliest instant at which one whole step will be due
    pub fn next_deadline(&self, steps_per_second: f64) -> Instant {
        self.last_tick + Self::step_period(steps_per_second).saturating_sub(self.carry)
    }

    /// Consume the time since the previous tick and return the whole steps due
    pub fn tick(&mut self, now: Instant, steps_per_second: f64) -> u64 {
        let elapsed = now.saturating_duration_since(self.last_tick) + self.carry;
        self.last_tick = now;

        let steps = (elapsed.as_secs_f64() * steps_per_second + STEP_EPSILON).floor();
        let consumed = Duration::from_secs_f64(steps / steps_per_second);
        self.carry = elapsed.saturating_sub(consumed);
        steps as u64
    }
}

/// Rolling generations-per-second estimate over the last `window` ticks
#[derive(Clone, Debug)]
pub struct RateAverager {
    window: usize,
    samples: VecDeque<(Duration, u64)>,
    last: Option<Instant>,
}

impl RateAverager {
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            samples: VecDeque::new(),
            last: None,
        }
    }

    /// Forget every sample and measure from `now`
    pub fn restart(&mut self, now: Instant) {
        self.samples.clear();
        self.last = Some(now);
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.last = None;
    }

    /// Record `generations` advanced at `now` and return the updated average
    pub fn record(&mut self, now: Instant, generations: u64) -> f64 {
        let since = self.last.map_or(Duration::ZERO, |last| now.saturating_duration_since(last));
        self.last = Some(now);
        self.samples.push_back((since, generations));
        while self.samples.len() > self.window {
            self.samples.pop_front();
        }
        self.average()
    }

    pub fn average(&self) -> f64 {
        let (time, generations) = self
            .samples
            .iter()
            .fold((Duration::ZERO, 0u64), |(t, g), (dt, dg)| (t + *dt, g + dg));
        if time.is_zero() {
            0.0
        } else {
            generations as f64 / time.as_secs_f64()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_no_step_before_one_period() {
        let start = Instant::now();
        let mut pacer = StepPacer::new(start);
        assert_eq!(pacer.tick(start + ms(8), 60.0), 0);
        assert_eq!(pacer.tick(start + ms(16), 60.0), 0);
        assert_eq!(pacer.tick(start + ms(24), 60.0), 1);
        assert_eq!(pacer.tick(start + ms(32), 60.0), 0);
        assert_eq!(pacer.tick(start + ms(40), 60.0), 1);
    }

    #[test]
    fn test_carry_is_kept_between_ticks() {
        let start = Instant::now();
        let mut pacer = StepPacer::new(start);
        // 0.1s at 25 steps per second is 2.5 steps
        assert_eq!(pacer.tick(start + ms(100), 25.0), 2);
        assert!((pacer.carry().as_secs_f64() - 0.02).abs() < 1e-6);
        assert_eq!(pacer.tick(start + ms(120), 25.0), 1);
        assert!(pacer.carry() < ms(1));
    }

    #[test]
    fn test_sustained_rate_converges() {
        let start = Instant::now();
        let mut pacer = StepPacer::new(start);
        let mut total = 0;
        // Irregular ticks over ten seconds
        let mut t = 0;
        for i in 0..1000u64 {
            t += 3 + (i * 7) % 15;
            total += pacer.tick(start + ms(t), 60.0);
        }
        let expected = t as f64 / 1000.0 * 60.0;
        assert!((total as f64 - expected).abs() <= 1.0, "{total} vs {expected}");
    }

    #[test]
    fn test_next_deadline_accounts_for_carry() {
        let start = Instant::now();
        let mut pacer = StepPacer::new(start);
        assert_eq!(pacer.next_deadline(10.0), start + ms(100));
        pacer.tick(start + ms(130), 10.0);
        let deadline = pacer.next_deadline(10.0);
        let expected = start + ms(200);
        let diff = if deadline > expected { deadline - expected } else { expected - deadline };
        assert!(diff < Duration::from_micros(1));
    }

    #[test]
    fn test_rate_change_does_not_burst() {
        let start = Instant::now();
        let mut pacer = StepPacer::new(start);
        assert_eq!(pacer.tick(start + ms(15), 60.0), 0);
        // Carry is 15ms; at 1000 steps per second that is 15 steps, which is correct
        // for the elapsed time rather than a burst of stale steps
        assert_eq!(pacer.tick(start + ms(15), 1000.0), 15);
        assert_eq!(pacer.tick(start + ms(15), 1.0), 0);
    }

    #[test]
    fn test_rate_averager_window() {
        let start = Instant::now();
        let mut rate = RateAverager::new(2);
        rate.restart(start);
        let close = |a: f64, b: f64| (a - b).abs() < 1e-9;
        assert!(close(rate.record(start + ms(100), 10), 100.0));
        assert!(close(rate.record(start + ms(200), 30), 200.0));
        // Oldest sample falls out of the window
        assert!(close(rate.record(start + ms(300), 30), 300.0));

        rate.clear();
        assert_eq!(rate.average(), 0.0);
        assert_eq!(rate.record(start + ms(400), 5), 0.0);
    }
}
