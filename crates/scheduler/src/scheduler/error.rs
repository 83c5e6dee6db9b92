use tqs_core::TqsError;

/// Errors raised while preparing a run. Nothing fails once lanes start.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("Invalid launch: {0}")]
    InvalidLaunch(String),
    #[error("Precondition failed: {0}")]
    Precondition(#[from] TqsError),
    #[error("Failed to build lane pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}
