use std::future::Future;

use tokio::time::Instant;

/// Monotonic time source with a suspend-until primitive.
///
/// The evolution driver never reads the system clock directly; tests run it
/// against tokio's paused virtual time.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;

    fn sleep_until(&self, deadline: Instant) -> impl Future<Output = ()> + Send;
}

/// Clock backed by the tokio timer (virtual when the runtime's time is paused)
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep_until(&self, deadline: Instant) -> impl Future<Output = ()> + Send {
        tokio::time::sleep_until(deadline)
    }
}
