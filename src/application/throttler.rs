//! Minimum-interval throttling.
//!
//! Callers pass one at a time through an async FIFO lock that guards the last
//! start time. Whoever holds it waits out the rest of the interval, stamps the
//! actual start time, and releases the lock before running its work. The next
//! caller then measures its wait from that stamp.

use crate::domain::config::ThrottleConfig;
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tracing::trace;

/// Enforces a minimum gap between the start times of consecutive executions.
///
/// # Example
///
/// ```
/// use resource_guard::Throttler;
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let refresh = Throttler::new(Duration::from_millis(10));
/// let start = tokio::time::Instant::now();
///
/// refresh.run(async {}).await;
/// refresh.run(async {}).await;
/// assert!(start.elapsed() >= Duration::from_millis(10));
/// # }
/// ```
#[derive(Debug)]
pub struct Throttler {
    min_interval: Duration,
    last_start: Mutex<Option<Instant>>,
}

impl Throttler {
    /// Create a throttler spacing executions at least `min_interval` apart.
    pub fn new(min_interval: Duration) -> Self {
        Self::with_config(ThrottleConfig::new(min_interval))
    }

    /// Create a throttler from a configuration.
    pub fn with_config(config: ThrottleConfig) -> Self {
        Self {
            min_interval: config.min_interval,
            last_start: Mutex::new(None),
        }
    }

    /// Run `work`, first waiting out whatever remains of the interval since the
    /// previous execution started.
    ///
    /// Dropping the returned future while it waits leaves the last start time
    /// untouched.
    pub async fn run<F>(&self, work: F) -> F::Output
    where
        F: Future,
    {
        {
            let mut last_start = self.last_start.lock().await;
            if let Some(previous) = *last_start {
                let next = previous + self.min_interval;
                let now = Instant::now();
                if next > now {
                    trace!(wait = ?(next - now), "throttling execution");
                    sleep_until(next).await;
                }
            }
            *last_start = Some(Instant::now());
        }

        work.await
    }

    /// Start time of the most recent execution, if any.
    pub async fn last_execution(&self) -> Option<Instant> {
        *self.last_start.lock().await
    }

    /// The minimum gap between execution starts.
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}
