//! Work-draining task queue scheduler.
//!
//! A run launches `group_count` groups of `group_size` lanes. Lane 0 of each
//! group claims the next queue index from a [`SharedCursor`] shared by every
//! group, publishes it through the group's [`GroupCache`], and the whole group
//! executes the task before the next claim. Groups never wait on each other;
//! the cursor is the only cross-group state.

pub mod cache;
pub mod cursor;
pub mod error;
pub mod kernel;
pub mod metrics;
pub mod runner;
pub mod types;

pub use cache::GroupCache;
pub use cursor::SharedCursor;
pub use error::ScheduleError;
pub use kernel::{AccumulateKernel, Kernel};
pub use metrics::{GroupReport, RunReport};
pub use runner::Scheduler;
pub use types::LaneCtx;
