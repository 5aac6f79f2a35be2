//! Bounded-concurrency executor.
//!
//! Runs caller-supplied work only while holding a permit from an internal
//! [`CountingSemaphore`]. There is no queue of its own: backpressure is the
//! submitting caller waiting in `acquire`.

use crate::application::metrics::ExecutorMetrics;
use crate::application::semaphore::CountingSemaphore;
use crate::domain::config::ExecutorConfig;
use crate::domain::error::GuardError;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

/// Runs work with a fixed concurrency ceiling.
///
/// # Example
///
/// ```
/// use resource_guard::{BoundedExecutor, GuardError};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let executor = BoundedExecutor::new(4);
///
/// let size = executor.submit(async { 42 }).await;
/// assert_eq!(size, Ok(42));
///
/// executor.shutdown();
/// assert_eq!(executor.submit(async { 1 }).await, Err(GuardError::Cancelled));
/// # }
/// ```
#[derive(Debug)]
pub struct BoundedExecutor {
    semaphore: Arc<CountingSemaphore>,
    max_concurrency: usize,
    shutdown: AtomicBool,
    /// Held for the whole of a drain so concurrent drains cannot split the permits
    draining: Mutex<()>,
    metrics: ExecutorMetrics,
}

impl BoundedExecutor {
    /// Create an executor running at most `max_concurrency` work items at once.
    ///
    /// # Panics
    /// Panics if `max_concurrency` is zero.
    pub fn new(max_concurrency: usize) -> Self {
        Self::with_config(ExecutorConfig { max_concurrency })
    }

    /// Create an executor from a configuration.
    ///
    /// # Panics
    /// Panics if the configuration does not validate.
    pub fn with_config(config: ExecutorConfig) -> Self {
        if let Err(e) = config.validate() {
            panic!("{e}");
        }
        Self {
            semaphore: Arc::new(CountingSemaphore::new(config.max_concurrency)),
            max_concurrency: config.max_concurrency,
            shutdown: AtomicBool::new(false),
            draining: Mutex::new(()),
            metrics: ExecutorMetrics::new(),
        }
    }

    /// Run `work` once a permit is free and return its output.
    ///
    /// The permit is released on every exit path: completion, panic, or the
    /// returned future being dropped mid-run. Dropping the future while it still
    /// waits for a permit consumes nothing.
    ///
    /// # Errors
    /// Returns `GuardError::Cancelled` without acquiring a permit if the executor
    /// has been shut down, or if shutdown happened while this call was queued.
    pub async fn submit<F>(&self, work: F) -> Result<F::Output, GuardError>
    where
        F: Future,
    {
        self.ensure_accepting()?;
        let permit = self.semaphore.acquire().await;
        self.ensure_accepting()?;

        let _admission = Admission::new(permit, self.metrics.clone());
        Ok(work.await)
    }

    /// Run `work` on a new tokio task once a permit is free.
    ///
    /// The caller waits for admission; the task then owns the permit until `work`
    /// finishes or the task is aborted.
    ///
    /// # Errors
    /// Same as [`submit`](Self::submit).
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub async fn spawn<F>(&self, work: F) -> Result<JoinHandle<F::Output>, GuardError>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.ensure_accepting()?;
        let permit = Arc::clone(&self.semaphore).acquire_owned().await;
        self.ensure_accepting()?;

        let admission = Admission::new(permit, self.metrics.clone());
        Ok(tokio::spawn(async move {
            let _admission = admission;
            work.await
        }))
    }

    /// Stop accepting submissions. Work already admitted keeps running.
    ///
    /// Idempotent.
    pub fn shutdown(&self) {
        if !self.shutdown.swap(true, Ordering::AcqRel) {
            debug!(
                in_flight = self.metrics.snapshot().in_flight(),
                "executor shut down"
            );
        }
    }

    /// Wait until every admitted work item has released its permit.
    ///
    /// Intended for use after [`shutdown`](Self::shutdown); on a live executor new
    /// submissions queue behind the drain. Concurrent drains run one after another.
    pub async fn drain(&self) {
        let _draining = self.draining.lock().await;
        let mut held = Vec::with_capacity(self.max_concurrency);
        for _ in 0..self.max_concurrency {
            held.push(self.semaphore.acquire().await);
        }
    }

    /// Check if `shutdown` has been called.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// The concurrency ceiling fixed at construction.
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Number of permits not held by running work.
    pub fn available_slots(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Get admission metrics.
    pub fn metrics(&self) -> &ExecutorMetrics {
        &self.metrics
    }

    fn ensure_accepting(&self) -> Result<(), GuardError> {
        if self.is_shutdown() {
            self.metrics.record_rejected();
            debug!("submission rejected: executor is shut down");
            return Err(GuardError::Cancelled);
        }
        Ok(())
    }
}

/// A running work item: counts the completion, then releases the permit.
struct Admission<P> {
    metrics: ExecutorMetrics,
    _permit: P,
}

impl<P> Admission<P> {
    fn new(permit: P, metrics: ExecutorMetrics) -> Self {
        metrics.record_admitted();
        Self {
            metrics,
            _permit: permit,
        }
    }
}

impl<P> Drop for Admission<P> {
    fn drop(&mut self) {
        self.metrics.record_completed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::time::{sleep, timeout, Instant};

    #[tokio::test]
    async fn test_submit_returns_work_output() {
        let executor = BoundedExecutor::new(2);
        let result: Result<Result<u8, String>, GuardError> =
            executor.submit(async { Err("disk full".to_string()) }).await;

        assert_eq!(result, Ok(Err("disk full".to_string())));
        assert_eq!(executor.available_slots(), 2);
        assert_eq!(executor.metrics().snapshot().completed, 1);
    }

    #[test]
    #[should_panic(expected = "executor concurrency limit must be greater than 0")]
    fn test_zero_concurrency_panics() {
        let _ = BoundedExecutor::new(0);
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let executor = BoundedExecutor::new(1);

        executor.shutdown();
        executor.shutdown();
        assert!(executor.is_shutdown());

        for _ in 0..3 {
            assert_eq!(
                executor.submit(async { 1 }).await,
                Err(GuardError::Cancelled)
            );
        }
        assert_eq!(executor.available_slots(), 1);
        assert_eq!(executor.metrics().rejected(), 3);
        assert_eq!(executor.metrics().admitted(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_while_queued_consumes_no_permit() {
        let executor = Arc::new(BoundedExecutor::new(1));

        let busy = Arc::clone(&executor);
        let long = tokio::spawn(async move {
            busy.submit(sleep(Duration::from_millis(100))).await
        });
        tokio::task::yield_now().await;
        assert_eq!(executor.available_slots(), 0);

        let queued = timeout(Duration::from_millis(10), executor.submit(async { 7 })).await;
        assert!(queued.is_err());

        long.await.unwrap().unwrap();
        assert_eq!(executor.available_slots(), 1);
        assert_eq!(executor.metrics().admitted(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_while_running_releases_permit() {
        let executor = BoundedExecutor::new(1);

        let result = timeout(
            Duration::from_millis(10),
            executor.submit(sleep(Duration::from_secs(60))),
        )
        .await;
        assert!(result.is_err());

        assert_eq!(executor.available_slots(), 1);
        let snapshot = executor.metrics().snapshot();
        assert_eq!(snapshot.admitted, 1);
        assert_eq!(snapshot.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_panicking_work_releases_permit() {
        let executor = Arc::new(BoundedExecutor::new(1));

        let exec = Arc::clone(&executor);
        let outcome = tokio::spawn(async move {
            exec.submit(async {
                panic!("scan failed");
            })
            .await
        })
        .await;
        assert!(outcome.is_err());

        assert_eq!(executor.available_slots(), 1);
        assert_eq!(executor.submit(async { 3 }).await, Ok(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_queued_submission_rejected_by_shutdown() {
        let executor = Arc::new(BoundedExecutor::new(1));

        let busy = Arc::clone(&executor);
        let running = tokio::spawn(async move {
            busy.submit(sleep(Duration::from_millis(50))).await
        });
        tokio::task::yield_now().await;

        let late = Arc::clone(&executor);
        let queued = tokio::spawn(async move { late.submit(async { "ran" }).await });
        tokio::task::yield_now().await;

        executor.shutdown();

        assert_eq!(running.await.unwrap(), Ok(()));
        assert_eq!(queued.await.unwrap(), Err(GuardError::Cancelled));
        assert_eq!(executor.available_slots(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawn_holds_permit_until_task_finishes() {
        let executor = BoundedExecutor::new(1);
        let start = Instant::now();

        let first = executor
            .spawn(async {
                sleep(Duration::from_millis(100)).await;
                1
            })
            .await
            .unwrap();
        assert_eq!(executor.available_slots(), 0);

        // Admission waits for the first task's permit
        let second = executor.spawn(async { 2 }).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(100));

        assert_eq!(first.await.unwrap(), 1);
        assert_eq!(second.await.unwrap(), 2);
        assert_eq!(executor.available_slots(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_aborted_spawn_releases_permit() {
        let executor = BoundedExecutor::new(1);

        let handle = executor
            .spawn(sleep(Duration::from_secs(60)))
            .await
            .unwrap();
        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());

        assert_eq!(executor.available_slots(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drain_waits_for_admitted_work() {
        let executor = Arc::new(BoundedExecutor::new(2));
        let finished = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let finished = Arc::clone(&finished);
            executor
                .spawn(async move {
                    sleep(Duration::from_millis(80)).await;
                    finished.fetch_add(1, Ordering::SeqCst);
                })
                .await
                .unwrap();
        }

        executor.shutdown();
        executor.drain().await;
        assert_eq!(finished.load(Ordering::SeqCst), 2);
        assert_eq!(executor.available_slots(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_drains_both_complete() {
        let executor = Arc::new(BoundedExecutor::new(2));

        for hold in [10, 20] {
            executor
                .spawn(sleep(Duration::from_millis(hold)))
                .await
                .unwrap();
        }
        executor.shutdown();

        let drains: Vec<_> = (0..2)
            .map(|_| {
                let executor = Arc::clone(&executor);
                tokio::spawn(async move { executor.drain().await })
            })
            .collect();

        let both = timeout(Duration::from_secs(5), async {
            for drain in drains {
                drain.await.unwrap();
            }
        })
        .await;
        assert!(both.is_ok());
        assert_eq!(executor.available_slots(), 2);
    }

    #[test]
    #[should_panic(expected = "executor concurrency limit must be greater than 0")]
    fn test_with_config_rejects_zero_concurrency() {
        let _ = BoundedExecutor::with_config(ExecutorConfig { max_concurrency: 0 });
    }
}
