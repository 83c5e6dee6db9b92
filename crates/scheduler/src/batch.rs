//! Drain a task pool larger than one queue through consecutive runs.
//!
//! Each window of `queue_size` tasks gets its own run, cursor and output
//! buffer, with `offset` set to the pool offset plus the window start. The
//! pool must be dense (task `i` has id `offset + i`), so concatenated window
//! outputs have the same region layout as a single run over the whole pool.

use std::time::Duration;

use serde::Serialize;
use tqs_core::{OutputBuffer, TaskQueue};
use tracing::{debug, info};

use crate::scheduler::{GroupReport, RunReport, ScheduleError, Scheduler};

/// Concatenated output and per-run reports of a batched drain.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub values: Vec<i64>,
    pub reports: Vec<RunReport>,
}

impl BatchOutcome {
    /// Sum of run wall times.
    pub fn elapsed(&self) -> Duration {
        self.reports.iter().map(|r| r.elapsed).sum()
    }

    pub fn tasks_executed(&self) -> usize {
        self.reports.iter().map(RunReport::tasks_executed).sum()
    }

    /// Worst per-run imbalance across the batch.
    pub fn max_imbalance(&self) -> f64 {
        self.reports
            .iter()
            .map(RunReport::imbalance)
            .fold(1.0, f64::max)
    }

    /// Busiest group of any run in the batch.
    pub fn slowest_group(&self) -> Option<&GroupReport> {
        self.reports
            .iter()
            .filter_map(RunReport::slowest_group)
            .max_by_key(|g| g.busy)
    }
}

/// Run `pool` through `scheduler` in windows of `queue_size` tasks.
pub fn run_batches(
    scheduler: &Scheduler,
    pool: &TaskQueue,
    queue_size: usize,
    iterations: u32,
) -> Result<BatchOutcome, ScheduleError> {
    if queue_size == 0 && !pool.is_empty() {
        return Err(ScheduleError::InvalidLaunch(
            "queue_size must be at least 1 to drain a non-empty pool".into(),
        ));
    }
    if !pool.is_dense() {
        return Err(ScheduleError::InvalidLaunch(format!(
            "batched drain needs dense task ids starting at offset {}",
            pool.offset()
        )));
    }

    let tile_size = scheduler.group_size();
    let mut values = Vec::with_capacity(pool.len() * tile_size);
    let mut reports = Vec::new();

    for (batch, start) in (0..pool.len()).step_by(queue_size.max(1)).enumerate() {
        let window = pool.window(start, queue_size)?;
        let output = OutputBuffer::for_queue(&window, tile_size)?;
        debug!(batch, offset = window.offset(), tasks = window.len(), "batch starting");

        let report = scheduler.run(&window, &output, iterations)?;
        values.extend(output.into_values());
        reports.push(report);
    }

    let outcome = BatchOutcome { values, reports };
    info!(
        batches = outcome.reports.len(),
        tasks = outcome.tasks_executed(),
        elapsed_ms = outcome.elapsed().as_secs_f64() * 1000.0,
        "pool drained"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tqs_core::{Task, TaskPattern};

    use crate::verify::verify_values;

    #[test]
    fn pool_split_into_windows() {
        let scheduler = Scheduler::new(3, 2).unwrap();
        let pool = TaskQueue::generate(0, 10, TaskPattern::Alternating).unwrap();

        let outcome = run_batches(&scheduler, &pool, 4, 3).unwrap();

        assert_eq!(outcome.reports.len(), 3);
        assert_eq!(outcome.reports[2].queue_size, 2);
        assert_eq!(outcome.tasks_executed(), 10);
        assert_eq!(outcome.values.len(), 20);
        assert!(verify_values(&pool, &outcome.values, 2, 3).is_ok());
        assert!(outcome.max_imbalance() >= 1.0);

        let slowest = outcome.slowest_group().unwrap();
        assert!(slowest.group < 3);
        assert!(outcome.reports.iter().flat_map(|r| &r.groups).all(|g| g.busy <= slowest.busy));
    }

    #[test]
    fn empty_pool_runs_nothing() {
        let scheduler = Scheduler::new(2, 2).unwrap();
        let pool = TaskQueue::generate(0, 0, TaskPattern::AllLight).unwrap();

        let outcome = run_batches(&scheduler, &pool, 0, 1).unwrap();

        assert!(outcome.reports.is_empty());
        assert!(outcome.values.is_empty());
        assert_eq!(outcome.elapsed(), Duration::ZERO);
        assert!(outcome.slowest_group().is_none());
    }

    #[test]
    fn zero_queue_size_rejected() {
        let scheduler = Scheduler::new(1, 1).unwrap();
        let pool = TaskQueue::generate(0, 3, TaskPattern::AllLight).unwrap();
        assert!(matches!(
            run_batches(&scheduler, &pool, 0, 1),
            Err(ScheduleError::InvalidLaunch(_))
        ));
    }

    #[test]
    fn offset_pool_keeps_region_layout() {
        let scheduler = Scheduler::new(2, 2).unwrap();
        let pool = TaskQueue::generate(10, 5, TaskPattern::Alternating).unwrap();

        let outcome = run_batches(&scheduler, &pool, 2, 4).unwrap();

        assert_eq!(outcome.reports.len(), 3);
        assert_eq!(outcome.values.len(), 10);
        assert!(verify_values(&pool, &outcome.values, 2, 4).is_ok());
        // Region 2 holds task 12 (HEAVY at position 2).
        assert_eq!(outcome.values[4], 4 * 2 + 12);
    }

    #[test]
    fn gapped_pool_rejected() {
        let scheduler = Scheduler::new(1, 2).unwrap();
        let pool = TaskQueue::new(10, vec![Task::light(12), Task::light(13), Task::light(14)]);
        assert!(matches!(
            run_batches(&scheduler, &pool, 2, 1),
            Err(ScheduleError::InvalidLaunch(_))
        ));
    }
}
