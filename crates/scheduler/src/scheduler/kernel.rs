use std::sync::atomic::{AtomicI64, Ordering};

use tqs_core::Task;

use super::types::LaneCtx;

/// Work performed by every lane of a group for one claimed task.
///
/// `slot` is the lane's accumulator in the task's output region. The
/// scheduler guarantees no other group touches that region during the run.
/// A kernel must not panic: the remaining lanes of its group would wait on
/// the group barrier forever.
pub trait Kernel: Sync {
    /// Human-readable name for logging.
    fn name(&self) -> &str {
        "kernel"
    }

    fn execute(&self, task: &Task, lane: LaneCtx, slot: &AtomicI64);
}

/// HEAVY/LIGHT accumulation: add `tile_size` once per inner iteration, then
/// add the task id. HEAVY runs `iterations` inner iterations, LIGHT runs one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccumulateKernel {
    pub iterations: u32,
}

impl AccumulateKernel {
    pub fn new(iterations: u32) -> Self {
        Self { iterations }
    }
}

impl Kernel for AccumulateKernel {
    fn name(&self) -> &str {
        "accumulate"
    }

    #[inline]
    fn execute(&self, task: &Task, lane: LaneCtx, slot: &AtomicI64) {
        let tile = lane.tile_size as i64;
        for _ in 0..task.op.inner_iterations(self.iterations) {
            slot.fetch_add(tile, Ordering::Relaxed);
        }
        slot.fetch_add(task.id as i64, Ordering::Relaxed);
    }
}
