//! Manually advanced clock.

use crate::application::ports::Clock;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Clock whose time only moves when a test moves it.
///
/// Clones share the same time value, so one handle can be given to a cache
/// while the test keeps another to advance.
///
/// # Examples
///
/// ```
/// use resource_guard::infrastructure::mocks::MockClock;
/// use resource_guard::BoundedCache;
/// use std::sync::Arc;
/// use std::time::{Duration, Instant};
///
/// let clock = MockClock::new(Instant::now());
/// let cache = BoundedCache::new(8, Some(Duration::from_secs(30)))
///     .with_clock(Arc::new(clock.clone()));
///
/// cache.set("user:42", "alice");
/// clock.advance(Duration::from_secs(29));
/// assert_eq!(cache.get("user:42"), Some("alice"));
///
/// clock.advance(Duration::from_secs(1));
/// assert_eq!(cache.get("user:42"), None);
/// ```
#[derive(Debug, Clone)]
pub struct MockClock {
    current: Arc<Mutex<Instant>>,
}

impl MockClock {
    /// Create a mock clock reading `start`.
    pub fn new(start: Instant) -> Self {
        Self {
            current: Arc::new(Mutex::new(start)),
        }
    }

    /// Move time forward by `duration`.
    pub fn advance(&self, duration: Duration) {
        *self.time() += duration;
    }

    /// Jump to a specific instant.
    pub fn set(&self, instant: Instant) {
        *self.time() = instant;
    }

    fn time(&self) -> MutexGuard<'_, Instant> {
        self.current
            .lock()
            .expect("MockClock mutex poisoned - a test thread panicked while holding the lock")
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        *self.time()
    }
}
