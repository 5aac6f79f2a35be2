//! # resource-guard
//!
//! Concurrency and resource-bounding primitives for async Rust.
//!
//! Every component wraps caller-supplied work (a future) and bounds it in one
//! dimension: how many run at once, how many identical requests run at once,
//! how often work starts, or how much cached data is kept. Work errors are
//! never wrapped: a fallible future's `Result` comes back to the caller
//! unchanged inside the component's own output.
//!
//! ## Quick Start
//!
//! ```rust
//! use resource_guard::{BoundedCache, BoundedExecutor, SingleFlight};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() {
//! // At most 8 directory scans at once
//! let executor = Arc::new(BoundedExecutor::new(8));
//! // Concurrent scans of the same path share one execution
//! let scans: Arc<SingleFlight<String, u64>> = Arc::new(SingleFlight::new());
//! // Results stay fresh for a minute
//! let sizes = BoundedCache::new(1024, Some(Duration::from_secs(60)));
//!
//! let path = "/var/log".to_string();
//! let size = match sizes.get(&path) {
//!     Some(size) => size,
//!     None => {
//!         let size = scans
//!             .run(path.clone(), async { executor.submit(async { 4096 }).await.unwrap_or(0) })
//!             .await
//!             .unwrap_or(0);
//!         sizes.set(path, size);
//!         size
//!     }
//! };
//! assert_eq!(size, 4096);
//! # }
//! ```
//!
//! ## Components
//!
//! ### Concurrency limits
//! - [`CountingSemaphore`]: FIFO-fair permits. A released permit goes straight
//!   to the longest waiter, so a late arrival can never overtake the queue.
//! - [`BoundedExecutor`]: runs work only while holding a semaphore permit.
//!   `shutdown` rejects new and still-queued submissions with
//!   [`GuardError::Cancelled`]; admitted work finishes.
//!
//! ### Request shaping
//! - [`SingleFlight`]: one execution per key; concurrent callers share its output.
//! - [`Debouncer`]: a burst of submissions runs only the last one, once the
//!   burst has been quiet for the configured delay.
//! - [`Throttler`]: consecutive executions start at least a minimum interval apart.
//!
//! ### Memory bounds
//! - [`BoundedCache`]: LRU eviction at capacity plus optional per-entry TTL,
//!   checked lazily on read.
//! - [`BufferPool`]: recycles fixed-size byte buffers with a bounded freelist.
//!
//! ## Cancellation
//!
//! Cancelling an operation means dropping its future. Each component leaves
//! its bookkeeping consistent when that happens:
//!
//! | Dropped while... | Effect |
//! |------------------|--------|
//! | queued in `CountingSemaphore::acquire` | leaves the queue; a permit granted in the meantime is passed on |
//! | running inside `BoundedExecutor::submit` | permit released |
//! | leading a `SingleFlight` execution | key deregistered; followers get `Cancelled` |
//! | waiting in `Throttler::run` | last start time untouched |
//!
//! A `Debouncer` cancels its pending execution on `cancel`, on a newer
//! `submit`, and when the debouncer itself is dropped.
//!
//! ## Observability
//!
//! Components emit `tracing` events at `trace` and `debug` level with
//! structured fields (waiter ids, flight ids, debounce generations). No
//! subscriber is installed by this crate.
//!
//! [`BoundedCache`] and [`BoundedExecutor`] also keep lock-free counters:
//!
//! ```rust
//! use resource_guard::BoundedCache;
//!
//! let cache = BoundedCache::new(2, None);
//! cache.set("a", 1);
//! cache.get("a");
//! cache.get("b");
//!
//! let snapshot = cache.metrics().snapshot();
//! assert_eq!(snapshot.hits, 1);
//! assert_eq!(snapshot.misses, 1);
//! assert_eq!(snapshot.hit_rate(), 0.5);
//! ```
//!
//! ## Configuration
//!
//! Constructors taking plain numbers panic on a zero limit. The `with_config`
//! constructors take config structs whose `new` validates and returns
//! [`ConfigError`] instead:
//!
//! ```rust
//! use resource_guard::{BoundedExecutor, ConfigError, ExecutorConfig};
//!
//! assert_eq!(ExecutorConfig::new(0), Err(ConfigError::ZeroConcurrency));
//!
//! let executor = BoundedExecutor::with_config(ExecutorConfig::new(16).unwrap());
//! assert_eq!(executor.max_concurrency(), 16);
//! ```
//!
//! With the `serde` feature the config structs derive `Serialize` and
//! `Deserialize`.

// Domain layer - pure data structures and policy
pub mod domain;

// Application layer - the guard components
pub mod application;

// Infrastructure layer - clock adapters and test doubles
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use domain::{
    config::{
        BufferPoolConfig, CacheConfig, DebounceConfig, ExecutorConfig, SemaphoreConfig,
        ThrottleConfig,
    },
    error::{ConfigError, GuardError},
    recency::{Lookup, RecencyList},
};

pub use application::{
    buffer_pool::{BufferPool, PooledBuffer},
    cache::BoundedCache,
    debouncer::Debouncer,
    executor::BoundedExecutor,
    metrics::{CacheMetrics, CacheMetricsSnapshot, ExecutorMetrics, ExecutorMetricsSnapshot},
    ports::Clock,
    semaphore::{CountingSemaphore, OwnedSemaphorePermit, SemaphorePermit},
    single_flight::SingleFlight,
    throttler::Throttler,
};

pub use infrastructure::clock::SystemClock;
