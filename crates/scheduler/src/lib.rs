pub mod batch;
pub mod scheduler;
pub mod verify;

pub use batch::{run_batches, BatchOutcome};
pub use scheduler::{
    AccumulateKernel, GroupCache, GroupReport, Kernel, LaneCtx, RunReport, ScheduleError,
    Scheduler, SharedCursor,
};
pub use verify::{expected_value, verify, verify_values, Mismatch};

use tqs_core::{OutputBuffer, Task, TaskQueue};

/// One-shot run: launch `group_count x group_size` lanes, drain the first
/// `queue_size` tasks, accumulate into `output`, and return once every group
/// is done.
///
/// Task `x` writes region `x - offset`; `output` must use `group_size` as its
/// tile size. For repeated runs build a [`Scheduler`] once and reuse it.
pub fn run_schedule(
    group_count: usize,
    group_size: usize,
    tasks: &[Task],
    output: &OutputBuffer,
    iterations: u32,
    offset: u32,
    queue_size: usize,
) -> Result<RunReport, ScheduleError> {
    let scheduler = Scheduler::new(group_count, group_size)?;
    let queue = TaskQueue::new(offset, tasks.to_vec());
    scheduler.run_with(&queue, queue_size, output, &AccumulateKernel::new(iterations))
}
