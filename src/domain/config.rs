//! Validated construction parameters for each primitive.
//!
//! Every config has a fallible `new` that rejects values violating a precondition,
//! a `Default`, and `with_*` setters for optional knobs. Components accept a config
//! through their `with_config` constructor.

use crate::domain::error::ConfigError;
use std::time::Duration;

/// Configuration for a `CountingSemaphore`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SemaphoreConfig {
    /// Number of permits available at construction
    pub permits: usize,
}

impl SemaphoreConfig {
    /// Create a semaphore config.
    ///
    /// # Errors
    /// Returns `ConfigError::ZeroPermits` if `permits` is zero.
    pub fn new(permits: usize) -> Result<Self, ConfigError> {
        if permits == 0 {
            return Err(ConfigError::ZeroPermits);
        }
        Ok(Self { permits })
    }

    /// Re-check the precondition, e.g. after deserialization.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::new(self.permits).map(|_| ())
    }
}

impl Default for SemaphoreConfig {
    fn default() -> Self {
        Self { permits: 1 }
    }
}

/// Configuration for a `BoundedExecutor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExecutorConfig {
    /// Maximum number of work items running at once
    pub max_concurrency: usize,
}

impl ExecutorConfig {
    /// Create an executor config.
    ///
    /// # Errors
    /// Returns `ConfigError::ZeroConcurrency` if `max_concurrency` is zero.
    pub fn new(max_concurrency: usize) -> Result<Self, ConfigError> {
        if max_concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(Self { max_concurrency })
    }

    /// Re-check the precondition, e.g. after deserialization.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::new(self.max_concurrency).map(|_| ())
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self { max_concurrency: 4 }
    }
}

/// Configuration for a `BoundedCache`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CacheConfig {
    /// Maximum number of slots; expired-but-untouched entries still occupy one
    pub capacity: usize,
    /// TTL applied by `set` when the caller gives none; `None` means entries never expire
    pub default_ttl: Option<Duration>,
}

impl CacheConfig {
    /// Create a cache config with no default TTL.
    ///
    /// # Errors
    /// Returns `ConfigError::ZeroCapacity` if `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(Self {
            capacity,
            default_ttl: None,
        })
    }

    /// Set the default TTL for entries written without an explicit one.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// Re-check the precondition, e.g. after deserialization.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::new(self.capacity).map(|_| ())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 256,
            default_ttl: None,
        }
    }
}

/// Configuration for a `Throttler`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThrottleConfig {
    /// Minimum gap between the start times of two consecutive executions
    pub min_interval: Duration,
}

impl ThrottleConfig {
    /// Create a throttle config. A zero interval disables throttling.
    pub fn new(min_interval: Duration) -> Self {
        Self { min_interval }
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_millis(100),
        }
    }
}

/// Configuration for a `Debouncer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DebounceConfig {
    /// Quiet period that must elapse after the last submission before it fires
    pub delay: Duration,
}

impl DebounceConfig {
    /// Create a debounce config.
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(300),
        }
    }
}

/// Configuration for a `BufferPool`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BufferPoolConfig {
    /// Capacity in bytes of every buffer handed out
    pub buffer_size: usize,
    /// Maximum number of idle buffers kept for reuse
    pub max_pooled: usize,
}

impl BufferPoolConfig {
    /// Create a buffer pool config retaining up to 16 idle buffers.
    ///
    /// # Errors
    /// Returns `ConfigError::ZeroBufferSize` if `buffer_size` is zero.
    pub fn new(buffer_size: usize) -> Result<Self, ConfigError> {
        if buffer_size == 0 {
            return Err(ConfigError::ZeroBufferSize);
        }
        Ok(Self {
            buffer_size,
            max_pooled: 16,
        })
    }

    /// Set how many idle buffers the pool retains.
    pub fn with_max_pooled(mut self, max_pooled: usize) -> Self {
        self.max_pooled = max_pooled;
        self
    }

    /// Re-check the precondition, e.g. after deserialization.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::new(self.buffer_size).map(|_| ())
    }
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self {
            buffer_size: 64 * 1024,
            max_pooled: 16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semaphore_config_zero_permits() {
        assert_eq!(SemaphoreConfig::new(0), Err(ConfigError::ZeroPermits));
        assert_eq!(SemaphoreConfig::new(3).unwrap().permits, 3);
    }

    #[test]
    fn test_executor_config_zero_concurrency() {
        assert_eq!(ExecutorConfig::new(0), Err(ConfigError::ZeroConcurrency));
    }

    #[test]
    fn test_cache_config_with_default_ttl() {
        let config = CacheConfig::new(8)
            .unwrap()
            .with_default_ttl(Duration::from_secs(5));
        assert_eq!(config.capacity, 8);
        assert_eq!(config.default_ttl, Some(Duration::from_secs(5)));
        assert_eq!(CacheConfig::new(0), Err(ConfigError::ZeroCapacity));
    }

    #[test]
    fn test_validate_catches_hand_built_config() {
        let config = CacheConfig {
            capacity: 0,
            default_ttl: None,
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroCapacity));
        assert!(SemaphoreConfig::default().validate().is_ok());
        assert!(ExecutorConfig::default().validate().is_ok());
        assert!(BufferPoolConfig::default().validate().is_ok());
    }

    #[test]
    fn test_buffer_pool_config() {
        assert_eq!(BufferPoolConfig::new(0), Err(ConfigError::ZeroBufferSize));
        let config = BufferPoolConfig::new(512).unwrap().with_max_pooled(2);
        assert_eq!(config.buffer_size, 512);
        assert_eq!(config.max_pooled, 2);
    }
}
