//! Debouncing of bursty submissions.
//!
//! Each submission replaces the previous one and restarts the quiet-period
//! countdown. Only a submission that survives a full `delay` without being
//! replaced fires; superseded work is dropped without ever being polled.

use crate::domain::config::DebounceConfig;
use crate::domain::error::GuardError;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// A scheduled execution whose delay has not yet elapsed.
struct Pending {
    generation: u64,
    task: JoinHandle<()>,
}

struct State<T> {
    generation: u64,
    pending: Option<Pending>,
    /// Result slot of the most recently scheduled execution
    latest: Option<watch::Receiver<Option<T>>>,
}

/// Collapses bursts of submissions into a single delayed execution.
///
/// Requires a tokio runtime: every submission schedules a task.
///
/// # Example
///
/// ```
/// use resource_guard::Debouncer;
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let search = Debouncer::new(Duration::from_millis(20));
///
/// search.submit(async { "re" });
/// search.submit(async { "res" });
/// search.submit(async { "result" });
///
/// assert_eq!(search.value().await, Ok("result"));
/// # }
/// ```
pub struct Debouncer<T> {
    delay: Duration,
    state: Arc<Mutex<State<T>>>,
}

impl<T> Debouncer<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a debouncer firing `delay` after the last submission.
    pub fn new(delay: Duration) -> Self {
        Self::with_config(DebounceConfig::new(delay))
    }

    /// Create a debouncer from a configuration.
    pub fn with_config(config: DebounceConfig) -> Self {
        Self {
            delay: config.delay,
            state: Arc::new(Mutex::new(State {
                generation: 0,
                pending: None,
                latest: None,
            })),
        }
    }

    /// Schedule `work` to run once `delay` passes with no further submission.
    ///
    /// A previously scheduled execution that has not fired yet is cancelled. One
    /// that already fired keeps running to completion.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub fn submit<F>(&self, work: F)
    where
        F: Future<Output = T> + Send + 'static,
    {
        let mut state = lock(&self.state);
        state.generation += 1;
        let generation = state.generation;

        if let Some(previous) = state.pending.take() {
            previous.task.abort();
            debug!(
                superseded = previous.generation,
                by = generation,
                "debounced execution superseded"
            );
        }

        let (sender, result) = watch::channel(None);
        let shared = Arc::clone(&self.state);
        let delay = self.delay;
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !claim(&shared, generation) {
                return;
            }
            debug!(generation, "debounced execution fired");
            sender.send_replace(Some(work.await));
        });

        state.pending = Some(Pending { generation, task });
        state.latest = Some(result);
    }

    /// Output of the most recently scheduled execution, waiting for it if needed.
    ///
    /// # Errors
    /// - `GuardError::NotSubmitted` if nothing was ever submitted.
    /// - `GuardError::Cancelled` if the awaited execution is superseded or
    ///   cancelled before it produces a value.
    pub async fn value(&self) -> Result<T, GuardError> {
        let mut result = lock(&self.state)
            .latest
            .clone()
            .ok_or(GuardError::NotSubmitted)?;

        let value = result
            .wait_for(Option::is_some)
            .await
            .map_err(|_| GuardError::Cancelled)?;
        value.clone().ok_or(GuardError::Cancelled)
    }

    /// Cancel the scheduled execution if it has not fired yet.
    ///
    /// Returns `true` if an execution was cancelled.
    pub fn cancel(&self) -> bool {
        match lock(&self.state).pending.take() {
            Some(pending) => {
                pending.task.abort();
                debug!(generation = pending.generation, "debounced execution cancelled");
                true
            }
            None => false,
        }
    }

    /// Check if an execution is waiting out its delay.
    pub fn is_pending(&self) -> bool {
        lock(&self.state).pending.is_some()
    }

    /// The quiet period.
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(pending) = lock(&self.state).pending.take() {
            pending.task.abort();
        }
    }
}

impl<T> fmt::Debug for Debouncer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("Debouncer")
            .field("delay", &self.delay)
            .field("generation", &state.generation)
            .field("pending", &state.pending.is_some())
            .finish()
    }
}

fn lock<T>(state: &Mutex<State<T>>) -> MutexGuard<'_, State<T>> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mark `generation` as fired if it is still the pending execution.
fn claim<T>(state: &Mutex<State<T>>, generation: u64) -> bool {
    let mut state = lock(state);
    match &state.pending {
        Some(pending) if pending.generation == generation => {
            state.pending = None;
            true
        }
        _ => false,
    }
}
