//! Host-side check of a drained output buffer against the closed form of
//! the accumulation kernel.

use rayon::prelude::*;
use tqs_core::{OutputBuffer, Task, TaskQueue};

/// Value every lane of `task`'s region holds after one run on a zeroed
/// buffer.
pub fn expected_value(task: &Task, tile_size: usize, iterations: u32) -> i64 {
    task.op.inner_iterations(iterations) as i64 * tile_size as i64 + task.id as i64
}

/// First slot whose value differs from the expected accumulation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("task {task_id} lane {lane}: expected {expected}, found {found:?}")]
pub struct Mismatch {
    pub task_id: u32,
    pub lane: usize,
    pub expected: i64,
    /// `None` when the slot is missing from the buffer.
    pub found: Option<i64>,
}

/// Verify a live output buffer.
pub fn verify(queue: &TaskQueue, output: &OutputBuffer, iterations: u32) -> Result<(), Mismatch> {
    verify_values(queue, &output.snapshot(), output.tile_size(), iterations)
}

/// Verify region-major `values` (`region * tile_size + lane`) for every task
/// in `queue`. Reports the mismatch of the lowest queue position.
pub fn verify_values(
    queue: &TaskQueue,
    values: &[i64],
    tile_size: usize,
    iterations: u32,
) -> Result<(), Mismatch> {
    let offset = queue.offset();
    let mismatch = queue.tasks().par_iter().find_map_first(|task| {
        let expected = expected_value(task, tile_size, iterations);
        let region = task.id.checked_sub(offset).map(|r| r as usize);
        (0..tile_size).find_map(|lane| {
            let found = region.and_then(|r| values.get(r * tile_size + lane).copied());
            (found != Some(expected)).then_some(Mismatch {
                task_id: task.id,
                lane,
                expected,
                found,
            })
        })
    });
    match mismatch {
        Some(m) => Err(m),
        None => Ok(()),
    }
}
