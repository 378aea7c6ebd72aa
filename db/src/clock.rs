//! Time source for record timestamps.

use std::sync::atomic::{AtomicI64, Ordering};

/// Seconds since the Unix epoch, as written to `LastModifiedOn` and friends.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

/// Wall clock in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Deterministic clock that advances by `step` after every reading.
///
/// Two consecutive writes through a `Db` built on this clock always carry
/// strictly increasing timestamps.
#[derive(Debug)]
pub struct ManualClock {
    next: AtomicI64,
    step: i64,
}

impl ManualClock {
    #[must_use]
    pub fn new(start: i64) -> Self {
        Self::with_step(start, 1)
    }

    #[must_use]
    pub fn with_step(start: i64, step: i64) -> Self {
        Self {
            next: AtomicI64::new(start),
            step,
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.next.fetch_add(self.step, Ordering::SeqCst)
    }
}
