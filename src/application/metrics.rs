//! Observability metrics for the primitives.
//!
//! Counters are atomics behind an `Arc`, so a metrics handle can be cloned out of a
//! component and read from anywhere without touching the component's own lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Metrics tracking cache behavior.
#[derive(Debug, Clone, Default)]
pub struct CacheMetrics {
    inner: Arc<CacheMetricsInner>,
}

#[derive(Debug, Default)]
struct CacheMetricsInner {
    /// Reads that returned a value
    hits: AtomicU64,
    /// Reads that found nothing (expired reads included)
    misses: AtomicU64,
    /// Stale entries purged lazily by a read
    expirations: AtomicU64,
    /// Entries pushed out by capacity pressure
    evictions: AtomicU64,
}

impl CacheMetrics {
    /// Create a new metrics tracker.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_hit(&self) {
        self.inner.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.inner.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_expiration(&self) {
        self.inner.expirations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_eviction(&self) {
        self.inner.evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the number of reads that returned a value.
    pub fn hits(&self) -> u64 {
        self.inner.hits.load(Ordering::Relaxed)
    }

    /// Get the number of reads that returned nothing.
    pub fn misses(&self) -> u64 {
        self.inner.misses.load(Ordering::Relaxed)
    }

    /// Get the number of stale entries purged on read.
    pub fn expirations(&self) -> u64 {
        self.inner.expirations.load(Ordering::Relaxed)
    }

    /// Get the number of capacity evictions.
    pub fn evictions(&self) -> u64 {
        self.inner.evictions.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> CacheMetricsSnapshot {
        CacheMetricsSnapshot {
            hits: self.hits(),
            misses: self.misses(),
            expirations: self.expirations(),
            evictions: self.evictions(),
        }
    }

    /// Reset all metrics to zero.
    pub fn reset(&self) {
        self.inner.hits.store(0, Ordering::Relaxed);
        self.inner.misses.store(0, Ordering::Relaxed);
        self.inner.expirations.store(0, Ordering::Relaxed);
        self.inner.evictions.store(0, Ordering::Relaxed);
    }
}

/// A point-in-time snapshot of cache metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheMetricsSnapshot {
    /// Reads that returned a value
    pub hits: u64,
    /// Reads that found nothing
    pub misses: u64,
    /// Stale entries purged on read
    pub expirations: u64,
    /// Capacity evictions
    pub evictions: u64,
}

impl CacheMetricsSnapshot {
    /// Calculate the hit rate (0.0 to 1.0).
    ///
    /// Returns 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_reads();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Get the total number of reads (hits + misses).
    pub fn total_reads(&self) -> u64 {
        self.hits.saturating_add(self.misses)
    }
}

/// Metrics tracking executor admission.
#[derive(Debug, Clone, Default)]
pub struct ExecutorMetrics {
    inner: Arc<ExecutorMetricsInner>,
}

#[derive(Debug, Default)]
struct ExecutorMetricsInner {
    admitted: AtomicU64,
    completed: AtomicU64,
    rejected: AtomicU64,
}

impl ExecutorMetrics {
    /// Create a new metrics tracker.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_admitted(&self) {
        self.inner.admitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_completed(&self) {
        self.inner.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        self.inner.rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Work items that acquired a permit and started.
    pub fn admitted(&self) -> u64 {
        self.inner.admitted.load(Ordering::Relaxed)
    }

    /// Work items that released their permit, on any exit path.
    pub fn completed(&self) -> u64 {
        self.inner.completed.load(Ordering::Relaxed)
    }

    /// Submissions turned away because the executor was shut down.
    pub fn rejected(&self) -> u64 {
        self.inner.rejected.load(Ordering::Relaxed)
    }

    /// Get a snapshot of all metrics.
    pub fn snapshot(&self) -> ExecutorMetricsSnapshot {
        ExecutorMetricsSnapshot {
            admitted: self.admitted(),
            completed: self.completed(),
            rejected: self.rejected(),
        }
    }
}

/// A point-in-time snapshot of executor metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecutorMetricsSnapshot {
    /// Work items that acquired a permit and started
    pub admitted: u64,
    /// Work items that released their permit
    pub completed: u64,
    /// Submissions rejected after shutdown
    pub rejected: u64,
}

impl ExecutorMetricsSnapshot {
    /// Work items admitted but not yet finished at snapshot time.
    pub fn in_flight(&self) -> u64 {
        self.admitted.saturating_sub(self.completed)
    }
}
