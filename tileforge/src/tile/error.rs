//! Tile generation error types.

use crate::source::SourceError;
use thiserror::Error;

/// Errors a tile generator can report for a single job.
///
/// These are per-job outcomes: a worker logs them, forwards them to the
/// render sink and moves on. None of them terminates the worker.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerateError {
    /// The worker's data source is not open
    #[error("Map source is not open")]
    SourceUnavailable,

    /// No render theme has been assigned yet
    #[error("No render theme bound")]
    NoTheme,

    /// The source had no data for the tile, or the data was malformed
    #[error("Tile data unavailable or malformed: {0}")]
    Parse(#[source] SourceError),
}
