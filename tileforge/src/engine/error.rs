//! Engine error types.

use crate::theme::ThemeError;
use thiserror::Error;

/// Errors reported by engine reconfiguration and teardown.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Every worker failed to open the map source. The engine keeps
    /// running with all sources closed; jobs fail until the controller
    /// retries with different parameters.
    #[error("Failed to open map source on all {workers} workers")]
    ConfigurationFailed { workers: usize },

    /// The requested theme could not be loaded. The previous theme stays
    /// in effect.
    #[error("Failed to load render theme: {0}")]
    ThemeLoad(#[from] ThemeError),

    /// One or more worker threads panicked instead of joining cleanly
    /// during teardown. Teardown still ran to completion for every worker.
    #[error("Worker threads {workers:?} did not shut down cleanly")]
    WorkerJoinFailed { workers: Vec<usize> },
}
