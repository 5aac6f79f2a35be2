//! Reusable byte buffers.
//!
//! A freelist of fixed-capacity `Vec<u8>` buffers. Buffers return to the pool,
//! cleared, when their guard drops; once `max_pooled` idle buffers are retained
//! further returns are freed instead.

use crate::domain::config::BufferPoolConfig;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Shared pool of byte buffers. Clones share the same freelist.
///
/// # Example
///
/// ```
/// use resource_guard::BufferPool;
///
/// let pool = BufferPool::new(4096, 8);
/// {
///     let mut buf = pool.get();
///     buf.extend_from_slice(b"chunk");
///     assert!(buf.capacity() >= 4096);
/// }
/// assert_eq!(pool.available(), 1);
/// assert!(pool.get().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct BufferPool {
    inner: Arc<PoolInner>,
}

#[derive(Debug)]
struct PoolInner {
    buffer_size: usize,
    max_pooled: usize,
    free: Mutex<Vec<Vec<u8>>>,
}

impl BufferPool {
    /// Create a pool of `buffer_size`-byte buffers retaining up to `max_pooled` idle ones.
    ///
    /// # Panics
    /// Panics if `buffer_size` is zero.
    pub fn new(buffer_size: usize, max_pooled: usize) -> Self {
        Self::with_config(BufferPoolConfig {
            buffer_size,
            max_pooled,
        })
    }

    /// Create a pool from a configuration.
    ///
    /// # Panics
    /// Panics if the configuration does not validate.
    pub fn with_config(config: BufferPoolConfig) -> Self {
        if let Err(e) = config.validate() {
            panic!("{e}");
        }
        Self {
            inner: Arc::new(PoolInner {
                buffer_size: config.buffer_size,
                max_pooled: config.max_pooled,
                free: Mutex::new(Vec::with_capacity(config.max_pooled)),
            }),
        }
    }

    /// Take an empty buffer, reusing an idle one when available.
    pub fn get(&self) -> PooledBuffer {
        let buf = self
            .inner
            .free()
            .pop()
            .unwrap_or_else(|| Vec::with_capacity(self.inner.buffer_size));
        PooledBuffer {
            buf,
            pool: Arc::clone(&self.inner),
        }
    }

    /// Number of idle buffers ready for reuse.
    pub fn available(&self) -> usize {
        self.inner.free().len()
    }

    /// Capacity of each buffer handed out.
    pub fn buffer_size(&self) -> usize {
        self.inner.buffer_size
    }
}

impl PoolInner {
    fn free(&self) -> MutexGuard<'_, Vec<Vec<u8>>> {
        self.free.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn put_back(&self, mut buf: Vec<u8>) {
        // Buffers shrunk below the pool size would hand out short capacity later
        if buf.capacity() < self.buffer_size {
            return;
        }
        buf.clear();
        let mut free = self.free();
        if free.len() < self.max_pooled {
            free.push(buf);
        }
    }
}

/// A buffer checked out of a [`BufferPool`]; returns to the pool on drop.
#[derive(Debug)]
pub struct PooledBuffer {
    buf: Vec<u8>,
    pool: Arc<PoolInner>,
}

impl PooledBuffer {
    /// Detach the buffer from the pool.
    pub fn into_inner(mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }
}

impl Deref for PooledBuffer {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        &self.buf
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        self.pool.put_back(std::mem::take(&mut self.buf));
    }
}
