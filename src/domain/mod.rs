//! Domain layer - pure logic with no runtime dependencies.
//!
//! This layer contains the concepts and invariants shared by the primitives:
//! - Error taxonomy (`GuardError`, `ConfigError`)
//! - Validated configuration for each primitive
//! - The arena-backed recency list behind the LRU+TTL cache
//!
//! Nothing here reads a clock or suspends; time is passed in by the caller.

pub mod config;
pub mod error;
pub mod recency;
