//! Infrastructure layer - adapters for the application ports.
//!
//! - [`clock::SystemClock`]: wall-clock time for the cache
//! - [`mocks`]: controllable clock and log capture for tests

pub mod clock;

/// Mock implementations for testing.
///
/// Only available with the `test-helpers` feature or in test builds. To use
/// these mocks in integration tests, add to your `Cargo.toml`:
/// ```toml
/// [dev-dependencies]
/// resource-guard = { version = "*", features = ["test-helpers"] }
/// ```
#[cfg(any(test, feature = "test-helpers"))]
pub mod mocks;
