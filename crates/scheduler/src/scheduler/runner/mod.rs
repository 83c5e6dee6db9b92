//! Scheduler runner -- owns the lane pool and drives runs.
//!
//! Split into focused submodules:
//! - `core`: Scheduler struct, constructor, and accessor methods
//! - `execution`: run preparation, launch, and the per-lane claim/execute loop

mod core;
mod execution;

pub use self::core::Scheduler;
