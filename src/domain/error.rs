//! Error taxonomy shared by all primitives.

/// Runtime condition reported by a primitive instead of the work's own output.
///
/// Errors produced by caller-supplied work are never represented here; they travel
/// inside the work's output type untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GuardError {
    /// The operation was aborted before producing a value: the executor was shut down,
    /// a single-flight leader was dropped, or a debounced execution was superseded.
    #[error("operation cancelled")]
    Cancelled,
    /// `Debouncer::value` was called before anything was submitted.
    #[error("nothing has been submitted")]
    NotSubmitted,
}

impl GuardError {
    /// Check if this error is `Cancelled`.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, GuardError::Cancelled)
    }
}

/// Error returned when configuration validation fails.
///
/// These are precondition violations: a primitive cannot be built from an invalid
/// configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Semaphore permit count must be greater than zero
    #[error("semaphore permits must be greater than 0")]
    ZeroPermits,
    /// Executor concurrency limit must be greater than zero
    #[error("executor concurrency limit must be greater than 0")]
    ZeroConcurrency,
    /// Cache capacity must be greater than zero
    #[error("cache capacity must be greater than 0")]
    ZeroCapacity,
    /// Pooled buffer size must be greater than zero
    #[error("buffer size must be greater than 0")]
    ZeroBufferSize,
}
