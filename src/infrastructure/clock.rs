//! Clock adapters.
//!
//! [`SystemClock`] is the default time source for [`BoundedCache`] expiry.
//! Tests swap in `MockClock` (from `crate::infrastructure::mocks`, available
//! with the `test-helpers` feature) through [`BoundedCache::with_clock`].
//!
//! [`BoundedCache`]: crate::application::cache::BoundedCache
//! [`BoundedCache::with_clock`]: crate::application::cache::BoundedCache::with_clock

use crate::application::ports::Clock;
use std::time::Instant;

/// Monotonic system time via `Instant::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Create a new system clock.
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
