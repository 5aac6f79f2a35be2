//! In-flight request coalescing ("single-flight").
//!
//! At most one execution per key runs at a time. Callers arriving while a key is
//! in flight attach to that execution and receive a clone of its output instead
//! of running their own work.

use crate::domain::error::GuardError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::trace;

/// The single running execution registered under a key.
struct Flight<T> {
    id: u64,
    result: watch::Receiver<Option<T>>,
}

/// Coalesces concurrent executions by key.
///
/// The output type `T` is cloned once per attached caller, so every caller of a
/// flight receives an identical value. Fallible work should return a `Result`
/// with a `Clone` error type; the error then reaches every caller unchanged.
///
/// # Example
///
/// ```
/// use resource_guard::SingleFlight;
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let flights: SingleFlight<&str, u32> = SingleFlight::new();
///
/// let (a, b) = tokio::join!(
///     flights.run("config", async {
///         tokio::time::sleep(Duration::from_millis(10)).await;
///         5
///     }),
///     flights.run("config", async { 999 }),
/// );
/// assert_eq!(a, Ok(5));
/// assert_eq!(b, Ok(5));
/// # }
/// ```
pub struct SingleFlight<K, T>
where
    K: Hash + Eq,
{
    flights: DashMap<K, Flight<T>>,
    next_id: AtomicU64,
}

impl<K, T> SingleFlight<K, T>
where
    K: Hash + Eq + Clone,
    T: Clone,
{
    /// Create an empty coalescer.
    pub fn new() -> Self {
        Self {
            flights: DashMap::new(),
            next_id: AtomicU64::new(0),
        }
    }

    /// Run `work` under `key`, or attach to the execution already in flight.
    ///
    /// Attached callers never poll their own `work`; it is dropped unrun.
    ///
    /// # Errors
    /// Returns `GuardError::Cancelled` to attached callers if the leading caller
    /// is dropped before its work completes. The registration is removed in that
    /// case, so the next call for the key starts a fresh execution.
    ///
    /// # Panics
    /// A panic in `work` unwinds through the leading caller only. Attached
    /// callers see it as a dropped leader and get `GuardError::Cancelled`, so
    /// failures meant to reach every caller identically must be returned as an
    /// `Err` inside `T`.
    pub async fn run<F>(&self, key: K, work: F) -> Result<T, GuardError>
    where
        F: Future<Output = T>,
    {
        match self.board(key) {
            Role::Follow(result) => Self::follow(result).await,
            Role::Lead(landing) => {
                let value = work.await;
                landing.complete(value.clone());
                Ok(value)
            }
        }
    }

    /// Register as leader for `key`, or pick up the running flight's result.
    fn board(&self, key: K) -> Role<'_, K, T> {
        match self.flights.entry(key.clone()) {
            Entry::Occupied(flight) => {
                trace!(flight = flight.get().id, "attached to in-flight execution");
                Role::Follow(flight.get().result.clone())
            }
            Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let (sender, result) = watch::channel(None);
                slot.insert(Flight { id, result });
                trace!(flight = id, "leading new execution");
                Role::Lead(Landing {
                    flights: &self.flights,
                    key,
                    id,
                    sender,
                })
            }
        }
    }

    /// Number of keys with an execution in flight.
    pub fn in_flight(&self) -> usize {
        self.flights.len()
    }

    /// Check if an execution is in flight for `key`.
    pub fn is_in_flight(&self, key: &K) -> bool {
        self.flights.contains_key(key)
    }

    async fn follow(mut result: watch::Receiver<Option<T>>) -> Result<T, GuardError> {
        let value = result
            .wait_for(Option::is_some)
            .await
            .map_err(|_| GuardError::Cancelled)?;
        value.clone().ok_or(GuardError::Cancelled)
    }
}

impl<K, T> Default for SingleFlight<K, T>
where
    K: Hash + Eq + Clone,
    T: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, T> fmt::Debug for SingleFlight<K, T>
where
    K: Hash + Eq,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleFlight")
            .field("in_flight", &self.flights.len())
            .finish()
    }
}

enum Role<'a, K, T>
where
    K: Hash + Eq,
{
    Follow(watch::Receiver<Option<T>>),
    Lead(Landing<'a, K, T>),
}

/// Held by the leading caller; deregisters the flight when dropped.
///
/// The registration is removed before the sender, so followers woken by a
/// dropped leader never find a stale entry to attach to.
struct Landing<'a, K, T>
where
    K: Hash + Eq,
{
    flights: &'a DashMap<K, Flight<T>>,
    key: K,
    id: u64,
    sender: watch::Sender<Option<T>>,
}

impl<K, T> Landing<'_, K, T>
where
    K: Hash + Eq,
{
    /// Publish the output to every attached caller, then deregister.
    fn complete(self, value: T) {
        self.sender.send_replace(Some(value));
    }
}

impl<K, T> Drop for Landing<'_, K, T>
where
    K: Hash + Eq,
{
    fn drop(&mut self) {
        let id = self.id;
        self.flights.remove_if(&self.key, |_, flight| flight.id == id);
        if self.sender.borrow().is_none() {
            trace!(flight = id, "leader dropped before completing");
        }
    }
}
