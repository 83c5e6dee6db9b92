pub mod config;
pub mod error;
pub mod output;
pub mod task;

pub use config::RunConfig;
pub use error::*;
pub use output::OutputBuffer;
pub use task::*;
