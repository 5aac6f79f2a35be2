//! Application layer - the guard components.
//!
//! Each component wraps caller-supplied work and bounds it in one dimension:
//! - [`semaphore`]: how many holders at once (FIFO permits)
//! - [`executor`]: how many executions at once, with shutdown
//! - [`single_flight`]: one execution per key
//! - [`debouncer`]: one execution per burst
//! - [`throttler`]: one execution start per interval
//! - [`cache`]: how many entries and for how long
//! - [`buffer_pool`]: how many idle byte buffers are kept around
//!
//! ## Ports
//!
//! Time-dependent components read time through the [`ports::Clock`] trait so
//! tests can drive expiry deterministically.

pub mod buffer_pool;
pub mod cache;
pub mod debouncer;
pub mod executor;
pub mod metrics;
pub mod ports;
pub mod semaphore;
pub mod single_flight;
pub mod throttler;
