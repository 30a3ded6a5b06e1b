use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::Arc;

use crate::sample::Sample;

/// Samples per sealed archive chunk.
const CHUNK_LEN: usize = 1024;

/// Every sample ingested while collecting, in arrival order.
///
/// Grows without bound until cleared; long sessions at full rate are limited
/// only by memory. Full chunks are sealed behind an `Arc` so that
/// [`Archive::snapshot`] only has to copy the open tail.
#[derive(Debug, Default)]
pub struct Archive {
    sealed: Vec<Arc<[Sample]>>,
    tail: Vec<Sample>,
}

impl Archive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: Sample) {
        self.tail.push(sample);
        if self.tail.len() == CHUNK_LEN {
            let chunk = std::mem::replace(&mut self.tail, Vec::with_capacity(CHUNK_LEN));
            self.sealed.push(chunk.into());
        }
    }

    pub fn len(&self) -> usize {
        self.sealed.len() * CHUNK_LEN + self.tail.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.sealed
            .iter()
            .flat_map(|chunk| chunk.iter())
            .chain(self.tail.iter())
    }

    /// The archive as of now. Sealed chunks are shared, not copied.
    pub fn snapshot(&self) -> ArchiveSnapshot {
        let mut chunks = self.sealed.clone();
        if !self.tail.is_empty() {
            chunks.push(Arc::from(self.tail.as_slice()));
        }
        ArchiveSnapshot { chunks }
    }

    pub fn clear(&mut self) {
        self.sealed.clear();
        self.tail.clear();
    }
}

/// Read-only view of an [`Archive`] that outlives the session lock.
#[derive(Debug, Clone, Default)]
pub struct ArchiveSnapshot {
    chunks: Vec<Arc<[Sample]>>,
}

impl ArchiveSnapshot {
    pub fn len(&self) -> usize {
        self.chunks.iter().map(|chunk| chunk.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.chunks.iter().flat_map(|chunk| chunk.iter())
    }

    pub fn to_vec(&self) -> Vec<Sample> {
        self.iter().copied().collect()
    }
}

/// Fixed-capacity FIFO. Pushing into a full ring evicts the oldest entry.
#[derive(Debug)]
pub struct DisplayRing<T> {
    items: VecDeque<T>,
    capacity: NonZeroUsize,
}

impl<T: Clone> DisplayRing<T> {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity.get()),
            capacity,
        }
    }

    pub fn push(&mut self, item: T) {
        if self.items.len() == self.capacity.get() {
            self.items.pop_front();
        }
        self.items.push_back(item);
    }

    /// Owned copy, oldest first.
    pub fn snapshot(&self) -> Vec<T> {
        self.items.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> NonZeroUsize {
        self.capacity
    }

    /// Shrinking below the current length drops the oldest entries right away.
    pub fn set_capacity(&mut self, capacity: NonZeroUsize) {
        self.capacity = capacity;
        let excess = self.items.len().saturating_sub(capacity.get());
        self.items.drain(..excess);
        self.items.shrink_to(capacity.get());
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
