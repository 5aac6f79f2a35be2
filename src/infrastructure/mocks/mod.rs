//! Test doubles for the infrastructure adapters.
//!
//! [`MockClock`] drives cache expiry by hand; [`MockCaptureLayer`] records the
//! tracing events the components emit.

pub mod clock;
pub mod layer;

pub use clock::MockClock;
pub use layer::{CapturedEvent, MockCaptureLayer};
