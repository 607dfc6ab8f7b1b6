//! Fixed-capacity ring buffer for recent activity
//!
//! The buffer owns its storage; a single `RwLock` guards the container and
//! nothing else. Once full, each push overwrites the oldest entry.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;

struct Inner<T> {
    slots: Vec<Option<T>>,
    /// Next slot to write
    head: usize,
    len: usize,
    last_push: Option<DateTime<Utc>>,
}

/// Occupancy snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BufferStats {
    pub size: usize,
    pub capacity: usize,
    /// `size / capacity`
    pub usage: f64,
    pub last_push: Option<DateTime<Utc>>,
}

/// Bounded buffer keeping the newest `capacity` entries
pub struct RingBuffer<T> {
    capacity: usize,
    inner: RwLock<Inner<T>>,
}

impl<T: Clone> RingBuffer<T> {
    /// Create a buffer holding up to `capacity` entries.
    ///
    /// A zero capacity is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            inner: RwLock::new(Inner {
                slots: (0..capacity).map(|_| None).collect(),
                head: 0,
                len: 0,
                last_push: None,
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner<T>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner<T>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an entry, evicting the oldest when full
    pub fn push(&self, item: T) {
        let mut inner = self.write();
        let head = inner.head;
        inner.slots[head] = Some(item);
        inner.head = (head + 1) % self.capacity;
        if inner.len < self.capacity {
            inner.len += 1;
        }
        inner.last_push = Some(Utc::now());
    }

    /// All entries, oldest first
    pub fn snapshot(&self) -> Vec<T> {
        self.latest(self.capacity)
    }

    /// The newest `n` entries, oldest first
    pub fn latest(&self, n: usize) -> Vec<T> {
        let inner = self.read();
        let n = n.min(inner.len);
        (0..n)
            .filter_map(|i| {
                let idx = (inner.head + self.capacity - n + i) % self.capacity;
                inner.slots[idx].clone()
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every entry
    pub fn clear(&self) {
        let mut inner = self.write();
        inner.slots.iter_mut().for_each(|slot| *slot = None);
        inner.head = 0;
        inner.len = 0;
    }

    pub fn stats(&self) -> BufferStats {
        let inner = self.read();
        BufferStats {
            size: inner.len,
            capacity: self.capacity,
            usage: inner.len as f64 / self.capacity as f64,
            last_push: inner.last_push,
        }
    }
}
