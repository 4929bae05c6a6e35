//! Time source and suspension points for the playback loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Millisecond clock with the loop's only suspension and yield points.
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin.
    fn now_ms(&self) -> u64;

    /// Block the calling task for `ms` milliseconds.
    fn sleep_ms(&self, ms: u64);

    /// Let other work on the same core run.
    fn yield_now(&self);
}

/// Wall clock backed by `std::time`.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn sleep_ms(&self, ms: u64) {
        thread::sleep(Duration::from_millis(ms));
    }

    fn yield_now(&self) {
        thread::yield_now();
    }
}

#[derive(Debug, Default)]
struct ManualState {
    now_ms: AtomicU64,
    slept_ms: AtomicU64,
    sleeps: AtomicUsize,
    yields: AtomicUsize,
}

/// Virtual clock that only moves when told to.
///
/// Sleeping advances the clock by the requested amount. Clones share the
/// same time, so a test can hand one copy to the controller and keep another
/// to advance time from inside a collaborator.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    state: Arc<ManualState>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward without counting it as a sleep.
    pub fn advance(&self, ms: u64) {
        self.state.now_ms.fetch_add(ms, Ordering::SeqCst);
    }

    /// Total time spent in `sleep_ms`.
    pub fn slept_ms(&self) -> u64 {
        self.state.slept_ms.load(Ordering::SeqCst)
    }

    /// Number of `sleep_ms` calls.
    pub fn sleeps(&self) -> usize {
        self.state.sleeps.load(Ordering::SeqCst)
    }

    /// Number of `yield_now` calls.
    pub fn yields(&self) -> usize {
        self.state.yields.load(Ordering::SeqCst)
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.state.now_ms.load(Ordering::SeqCst)
    }

    fn sleep_ms(&self, ms: u64) {
        self.state.sleeps.fetch_add(1, Ordering::SeqCst);
        self.state.slept_ms.fetch_add(ms, Ordering::SeqCst);
        self.advance(ms);
    }

    fn yield_now(&self) {
        self.state.yields.fetch_add(1, Ordering::SeqCst);
    }
}
