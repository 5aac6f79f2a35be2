//! Counting semaphore with strict FIFO fairness.
//!
//! Permits released while callers are queued are handed directly to the
//! longest-waiting caller; the counter is only incremented when nobody waits.
//! This keeps the invariant that no permit sits idle while a waiter exists.
//!
//! # Cancellation
//!
//! `acquire` is cancelled by dropping its future. A queued waiter removes itself
//! from the queue on drop. If a permit was already handed to it but not yet
//! observed, that permit is passed on to the next waiter (or the counter).

use crate::domain::config::SemaphoreConfig;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;
use tracing::trace;

#[derive(Debug)]
struct Waiter {
    id: u64,
    grant: oneshot::Sender<()>,
}

#[derive(Debug)]
struct State {
    permits: usize,
    waiters: VecDeque<Waiter>,
    next_waiter_id: u64,
}

impl State {
    /// Return one permit: to the oldest live waiter, else to the counter.
    fn release(&mut self) {
        while let Some(waiter) = self.waiters.pop_front() {
            if waiter.grant.send(()).is_ok() {
                trace!(waiter = waiter.id, "semaphore permit handed to waiter");
                return;
            }
        }
        self.permits += 1;
    }
}

/// Bounds the number of concurrent holders of a resource.
///
/// # Example
///
/// ```
/// use resource_guard::CountingSemaphore;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let semaphore = CountingSemaphore::new(2);
///
/// let first = semaphore.acquire().await;
/// let _second = semaphore.acquire().await;
/// assert_eq!(semaphore.available_permits(), 0);
/// assert!(semaphore.try_acquire().is_none());
///
/// drop(first);
/// assert_eq!(semaphore.available_permits(), 1);
/// # }
/// ```
pub struct CountingSemaphore {
    state: Mutex<State>,
}

impl CountingSemaphore {
    /// Create a semaphore with `permits` initial permits.
    ///
    /// # Panics
    /// Panics if `permits` is zero.
    pub fn new(permits: usize) -> Self {
        Self::with_config(SemaphoreConfig { permits })
    }

    /// Create a semaphore from a configuration.
    ///
    /// # Panics
    /// Panics if the configuration does not validate.
    pub fn with_config(config: SemaphoreConfig) -> Self {
        if let Err(e) = config.validate() {
            panic!("{e}");
        }
        Self {
            state: Mutex::new(State {
                permits: config.permits,
                waiters: VecDeque::new(),
                next_waiter_id: 0,
            }),
        }
    }

    /// Wait for a permit.
    ///
    /// Waiters are served strictly in call order. The returned guard gives the
    /// permit back when dropped.
    pub async fn acquire(&self) -> SemaphorePermit<'_> {
        self.acquire_inner().await;
        SemaphorePermit { semaphore: self }
    }

    /// Wait for a permit that is not tied to a borrow of the semaphore.
    ///
    /// Useful for handing a permit to a spawned task.
    pub async fn acquire_owned(self: Arc<Self>) -> OwnedSemaphorePermit {
        self.acquire_inner().await;
        OwnedSemaphorePermit { semaphore: self }
    }

    /// Take a permit if one is free right now.
    pub fn try_acquire(&self) -> Option<SemaphorePermit<'_>> {
        let mut state = self.lock();
        if state.permits == 0 {
            return None;
        }
        state.permits -= 1;
        Some(SemaphorePermit { semaphore: self })
    }

    /// Return a permit.
    ///
    /// Pair with [`SemaphorePermit::forget`]. Calling this without a forgotten
    /// permit raises the total number of permits.
    pub fn release(&self) {
        self.lock().release();
    }

    /// Number of permits free right now.
    pub fn available_permits(&self) -> usize {
        self.lock().permits
    }

    /// Number of callers currently queued in `acquire`.
    pub fn waiting(&self) -> usize {
        self.lock().waiters.len()
    }

    async fn acquire_inner(&self) {
        let pending = {
            let mut state = self.lock();
            if state.permits > 0 {
                state.permits -= 1;
                return;
            }

            let id = state.next_waiter_id;
            state.next_waiter_id += 1;
            let (grant, granted) = oneshot::channel();
            state.waiters.push_back(Waiter { id, grant });
            trace!(waiter = id, queued = state.waiters.len(), "semaphore waiter queued");

            PendingAcquire {
                semaphore: self,
                id,
                granted,
                done: false,
            }
        };

        pending.wait().await;
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for CountingSemaphore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("CountingSemaphore")
            .field("available_permits", &state.permits)
            .field("waiting", &state.waiters.len())
            .finish()
    }
}

/// A queued `acquire` call.
///
/// Owns the grant receiver so it stays alive until `drop` has settled whether a
/// permit was handed over.
struct PendingAcquire<'a> {
    semaphore: &'a CountingSemaphore,
    id: u64,
    granted: oneshot::Receiver<()>,
    done: bool,
}

impl PendingAcquire<'_> {
    async fn wait(mut self) {
        match (&mut self.granted).await {
            Ok(()) => self.done = true,
            // The sender only goes away after a successful send or once this
            // waiter is removed in `drop`, which cannot happen while we await.
            Err(_) => unreachable!("semaphore waiter {} lost its grant", self.id),
        }
    }
}

impl Drop for PendingAcquire<'_> {
    fn drop(&mut self) {
        if self.done {
            return;
        }

        let mut state = self.semaphore.lock();
        if let Some(pos) = state.waiters.iter().position(|w| w.id == self.id) {
            state.waiters.remove(pos);
            trace!(waiter = self.id, "semaphore waiter cancelled while queued");
        } else {
            trace!(waiter = self.id, "semaphore waiter cancelled after grant");
            state.release();
        }
    }
}

/// A permit borrowed from a [`CountingSemaphore`], returned on drop.
#[must_use = "the permit is released as soon as it is dropped"]
#[derive(Debug)]
pub struct SemaphorePermit<'a> {
    semaphore: &'a CountingSemaphore,
}

impl SemaphorePermit<'_> {
    /// Keep the permit checked out without a guard.
    ///
    /// The caller becomes responsible for calling [`CountingSemaphore::release`].
    pub fn forget(self) {
        std::mem::forget(self);
    }
}

impl Drop for SemaphorePermit<'_> {
    fn drop(&mut self) {
        self.semaphore.release();
    }
}

/// A permit holding an `Arc` to its [`CountingSemaphore`], returned on drop.
#[must_use = "the permit is released as soon as it is dropped"]
#[derive(Debug)]
pub struct OwnedSemaphorePermit {
    semaphore: Arc<CountingSemaphore>,
}

impl OwnedSemaphorePermit {
    /// The semaphore this permit belongs to.
    pub fn semaphore(&self) -> &Arc<CountingSemaphore> {
        &self.semaphore
    }
}

impl Drop for OwnedSemaphorePermit {
    fn drop(&mut self) {
        self.semaphore.release();
    }
}
