use std::sync::atomic::{AtomicI64, Ordering};

use crate::error::Result;
use crate::task::TaskQueue;

/// Pre-sized accumulator buffer, one region per task id, `tile_size` lanes
/// per region.
///
/// Slots are atomics so lanes of different groups can write concurrently
/// through a shared reference. Claimed indices are unique, so no two groups
/// ever touch the same region during a run.
#[derive(Debug)]
pub struct OutputBuffer {
    tile_size: usize,
    slots: Box<[AtomicI64]>,
}

impl OutputBuffer {
    /// Zeroed buffer with `regions * tile_size` slots.
    pub fn zeroed(regions: usize, tile_size: usize) -> Self {
        let slots = (0..regions * tile_size).map(|_| AtomicI64::new(0)).collect();
        Self { tile_size, slots }
    }

    /// Zeroed buffer large enough for every task in `queue`.
    pub fn for_queue(queue: &TaskQueue, tile_size: usize) -> Result<Self> {
        Ok(Self::zeroed(queue.regions_needed(queue.len())?, tile_size))
    }

    pub fn tile_size(&self) -> usize {
        self.tile_size
    }

    pub fn regions(&self) -> usize {
        if self.tile_size == 0 {
            0
        } else {
            self.slots.len() / self.tile_size
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Flat index `region * tile_size + lane`, or `None` when out of bounds.
    pub fn index_of(&self, region: usize, lane: usize) -> Option<usize> {
        if lane >= self.tile_size || region >= self.regions() {
            return None;
        }
        Some(region * self.tile_size + lane)
    }

    /// Accumulator slot for one lane of one region.
    pub fn slot(&self, region: usize, lane: usize) -> Option<&AtomicI64> {
        self.index_of(region, lane).map(|i| &self.slots[i])
    }

    pub fn value(&self, region: usize, lane: usize) -> Option<i64> {
        self.slot(region, lane).map(|s| s.load(Ordering::Relaxed))
    }

    /// Copy of every slot, region-major.
    pub fn snapshot(&self) -> Vec<i64> {
        self.slots.iter().map(|s| s.load(Ordering::Relaxed)).collect()
    }

    /// Consume the buffer into plain values.
    pub fn into_values(self) -> Vec<i64> {
        self.slots.into_vec().into_iter().map(AtomicI64::into_inner).collect()
    }
}
