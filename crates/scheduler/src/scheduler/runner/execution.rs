use std::sync::atomic::Ordering;
use std::sync::{Barrier, PoisonError};
use std::time::Instant;

use chrono::Utc;
use tqs_core::{OutputBuffer, TaskQueue, TqsError};
use tracing::{debug, info, trace};
use uuid::Uuid;

use crate::scheduler::cache::GroupCache;
use crate::scheduler::cursor::SharedCursor;
use crate::scheduler::error::ScheduleError;
use crate::scheduler::kernel::{AccumulateKernel, Kernel};
use crate::scheduler::metrics::{GroupReport, RunReport};
use crate::scheduler::types::LaneCtx;

use super::Scheduler;

/// State shared by the lanes of one group, and only by them.
struct Group {
    cache: GroupCache,
    barrier: Barrier,
}

impl Group {
    fn new(group_size: usize) -> Self {
        Self {
            cache: GroupCache::new(),
            barrier: Barrier::new(group_size),
        }
    }
}

/// Read-only view of a run handed to every lane.
struct RunCtx<'a, K: Kernel> {
    cursor: &'a SharedCursor,
    queue: &'a TaskQueue,
    queue_size: usize,
    output: &'a OutputBuffer,
    kernel: &'a K,
}

impl Scheduler {
    /// Drain every task in `queue` with the HEAVY/LIGHT accumulation kernel.
    pub fn run(
        &self,
        queue: &TaskQueue,
        output: &OutputBuffer,
        iterations: u32,
    ) -> Result<RunReport, ScheduleError> {
        self.run_with(queue, queue.len(), output, &AccumulateKernel::new(iterations))
    }

    /// Drain the first `queue_size` tasks of `queue` with `kernel`.
    ///
    /// Blocks until every group has observed queue exhaustion. All
    /// preconditions are checked before any lane starts.
    pub fn run_with<K: Kernel>(
        &self,
        queue: &TaskQueue,
        queue_size: usize,
        output: &OutputBuffer,
        kernel: &K,
    ) -> Result<RunReport, ScheduleError> {
        self.prepare(queue, queue_size, output)?;

        let _guard = self.run_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(
            run_id = %run_id,
            groups = self.group_count,
            group_size = self.group_size,
            queue_size,
            offset = queue.offset(),
            kernel = kernel.name(),
            "run starting"
        );

        let cursor = SharedCursor::new();
        let groups: Vec<Group> = (0..self.group_count)
            .map(|_| Group::new(self.group_size))
            .collect();
        let ctx = RunCtx {
            cursor: &cursor,
            queue,
            queue_size,
            output,
            kernel,
        };

        let start = Instant::now();
        let per_lane = self.pool.broadcast(|b| {
            let lane = LaneCtx::from_global(b.index(), self.group_size);
            drive_lane(lane, &groups[lane.group], &ctx)
        });
        let elapsed = start.elapsed();

        let report = RunReport {
            run_id,
            started_at,
            elapsed,
            queue_size,
            group_size: self.group_size,
            total_claims: cursor.consumed(),
            groups: per_lane.into_iter().flatten().collect(),
        };
        self.runs_completed.fetch_add(1, Ordering::Relaxed);

        info!(
            run_id = %run_id,
            tasks = report.tasks_executed(),
            discarded = report.discarded_claims(),
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            imbalance = report.imbalance(),
            "run complete"
        );

        Ok(report)
    }

    /// Reject runs whose queue or buffer would make a lane index out of
    /// bounds.
    fn prepare(
        &self,
        queue: &TaskQueue,
        queue_size: usize,
        output: &OutputBuffer,
    ) -> Result<(), ScheduleError> {
        if output.tile_size() != self.group_size {
            return Err(TqsError::TileMismatch {
                tile_size: output.tile_size(),
                group_size: self.group_size,
            }
            .into());
        }
        queue.validate(queue_size, output.regions())?;
        Ok(())
    }
}

/// Claim the next index for a group and publish it to the group cache.
/// Only the designated lane calls this.
fn claim_into<K: Kernel>(group: &Group, ctx: &RunCtx<'_, K>, report: &mut GroupReport) {
    let next = ctx.cursor.claim();
    // Never read the queue past queue_size.
    let task = if next < ctx.queue_size {
        ctx.queue.get(next).copied()
    } else {
        None
    };
    group.cache.publish(next, task);
    report.record_claim(next, task.as_ref());
}

/// Claim/execute loop run by every lane. Returns the group report from the
/// designated lane and `None` from the others.
fn drive_lane<K: Kernel>(lane: LaneCtx, group: &Group, ctx: &RunCtx<'_, K>) -> Option<GroupReport> {
    let mut report = lane.is_designated().then(|| GroupReport::new(lane.group));
    let start = Instant::now();

    if let Some(report) = report.as_mut() {
        claim_into(group, ctx, report);
    }
    group.barrier.wait();

    while let Some(task) = group.cache.current(ctx.queue_size) {
        trace!(group = lane.group, lane = lane.lane, task = task.id, "executing");
        // Bounds were checked in prepare(); region and lane are in range.
        let region = (task.id - ctx.queue.offset()) as usize;
        if let Some(slot) = ctx.output.slot(region, lane.lane) {
            ctx.kernel.execute(&task, lane, slot);
        }

        // Every lane is done with the cached task before it is replaced.
        group.barrier.wait();
        if let Some(report) = report.as_mut() {
            claim_into(group, ctx, report);
        }
        group.barrier.wait();
    }

    if let Some(report) = report.as_mut() {
        report.busy = start.elapsed();
        debug!(
            group = lane.group,
            tasks = report.tasks_executed(),
            heavy = report.heavy,
            light = report.light,
            busy_ms = report.busy.as_secs_f64() * 1000.0,
            "group done"
        );
    }
    report
}
