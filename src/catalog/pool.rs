//! Bounded memory pools backing the frame arena.

use std::fmt;
use std::mem;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytemuck::Pod;

use crate::error::{PlaybackError, Result};

struct PoolInner {
    name: String,
    capacity: usize,
    used: AtomicUsize,
}

/// A memory region with a fixed byte budget.
///
/// Buffers handed out by [`MemoryPool::allocate`] count against the budget
/// until they are dropped.
#[derive(Clone)]
pub struct MemoryPool {
    inner: Arc<PoolInner>,
}

impl fmt::Debug for MemoryPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryPool")
            .field("name", &self.inner.name)
            .field("capacity", &self.inner.capacity)
            .field("used", &self.used())
            .finish()
    }
}

impl MemoryPool {
    /// Create a pool with the given byte budget.
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                name: name.into(),
                capacity,
                used: AtomicUsize::new(0),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Bytes currently held by live buffers.
    pub fn used(&self) -> usize {
        self.inner.used.load(Ordering::Acquire)
    }

    pub fn available(&self) -> usize {
        self.capacity().saturating_sub(self.used())
    }

    /// Allocate a zeroed buffer of `len` elements.
    pub fn allocate<T: Pod>(&self, len: usize) -> Result<PoolBuffer<T>> {
        let bytes = len
            .checked_mul(mem::size_of::<T>())
            .ok_or_else(|| PlaybackError::out_of_memory(self.name(), usize::MAX))?;
        self.reserve(bytes)?;

        let mut data = Vec::new();
        if data.try_reserve_exact(len).is_err() {
            self.release(bytes);
            return Err(PlaybackError::out_of_memory(self.name(), bytes));
        }
        data.resize(len, T::zeroed());

        log::debug!(
            "{} pool: allocated {} bytes ({} of {} used)",
            self.name(),
            bytes,
            self.used(),
            self.capacity()
        );

        Ok(PoolBuffer {
            data,
            bytes,
            pool: self.clone(),
        })
    }

    fn reserve(&self, bytes: usize) -> Result<()> {
        let capacity = self.inner.capacity;
        self.inner
            .used
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                used.checked_add(bytes).filter(|&total| total <= capacity)
            })
            .map(|_| ())
            .map_err(|_| PlaybackError::out_of_memory(self.name(), bytes))
    }

    fn release(&self, bytes: usize) {
        self.inner.used.fetch_sub(bytes, Ordering::AcqRel);
    }
}

/// A buffer drawn from a [`MemoryPool`], returned to it on drop.
pub struct PoolBuffer<T: Pod> {
    data: Vec<T>,
    bytes: usize,
    pool: MemoryPool,
}

impl<T: Pod> PoolBuffer<T> {
    /// Size of the buffer in bytes.
    pub fn size_bytes(&self) -> usize {
        self.bytes
    }

    /// Name of the pool this buffer came from.
    pub fn pool_name(&self) -> &str {
        self.pool.name()
    }

    /// View the buffer as raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }
}

impl<T: Pod> Deref for PoolBuffer<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.data
    }
}

impl<T: Pod> DerefMut for PoolBuffer<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.data
    }
}

impl<T: Pod> fmt::Debug for PoolBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolBuffer")
            .field("pool", &self.pool.name())
            .field("len", &self.data.len())
            .field("bytes", &self.bytes)
            .finish()
    }
}

impl<T: Pod> Drop for PoolBuffer<T> {
    fn drop(&mut self) {
        self.pool.release(self.bytes);
    }
}

/// The two pools the arena draws from.
#[derive(Debug, Clone)]
pub struct MemoryPools {
    /// Large external memory for bulk data.
    pub slow: MemoryPool,
    /// Small internal memory for latency-sensitive scratch space.
    pub fast: MemoryPool,
}

impl MemoryPools {
    pub fn new(slow_bytes: usize, fast_bytes: usize) -> Self {
        Self {
            slow: MemoryPool::new("slow", slow_bytes),
            fast: MemoryPool::new("fast", fast_bytes),
        }
    }

    /// Pools sized from a player configuration.
    pub fn from_config(config: &crate::schema::PlayerConfig) -> Self {
        Self::new(config.slow_pool_bytes, config.fast_pool_bytes)
    }
}
