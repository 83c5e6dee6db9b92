use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tqs_core::config::MAX_LANES;
use tqs_core::RunConfig;
use tracing::info;

use crate::scheduler::error::ScheduleError;

/// The task queue scheduler. Owns one pool thread per lane and reuses it
/// across runs.
pub struct Scheduler {
    pub(super) group_count: usize,
    pub(super) group_size: usize,
    /// One thread per lane: `group_count * group_size` threads.
    pub(super) pool: rayon::ThreadPool,
    /// Serializes runs; two interleaved launches could deadlock on barriers.
    pub(super) run_lock: Mutex<()>,
    /// Completed runs (for logging).
    pub(super) runs_completed: AtomicU64,
}

impl Scheduler {
    /// Create a scheduler with `group_count` groups of `group_size` lanes.
    ///
    /// Fails if the shape is empty or the lane threads cannot be created; in
    /// either case no run ever starts.
    pub fn new(group_count: usize, group_size: usize) -> Result<Self, ScheduleError> {
        if group_count == 0 || group_size == 0 {
            return Err(ScheduleError::InvalidLaunch(format!(
                "need at least one group and one lane, got {}x{}",
                group_count, group_size
            )));
        }
        let lanes = group_count
            .checked_mul(group_size)
            .filter(|&l| l <= MAX_LANES)
            .ok_or_else(|| {
                ScheduleError::InvalidLaunch(format!(
                    "{}x{} lanes exceeds limit of {}",
                    group_count, group_size, MAX_LANES
                ))
            })?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(lanes)
            .thread_name(move |i| format!("tqs-g{}-l{}", i / group_size, i % group_size))
            .build()?;

        info!(
            "Scheduler ready: {} groups x {} lanes ({} threads)",
            group_count, group_size, lanes
        );

        Ok(Self {
            group_count,
            group_size,
            pool,
            run_lock: Mutex::new(()),
            runs_completed: AtomicU64::new(0),
        })
    }

    /// Create a scheduler shaped by a run config.
    pub fn from_config(config: &RunConfig) -> Result<Self, ScheduleError> {
        Self::new(config.resolved_group_count(), config.group_size)
    }

    pub fn group_count(&self) -> usize {
        self.group_count
    }

    /// Lanes per group; output buffers must use this as their tile size.
    pub fn group_size(&self) -> usize {
        self.group_size
    }

    pub fn lanes(&self) -> usize {
        self.group_count * self.group_size
    }

    pub fn runs_completed(&self) -> u64 {
        self.runs_completed.load(Ordering::Relaxed)
    }
}
