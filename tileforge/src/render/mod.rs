//! Render output interfaces.
//!
//! Workers deliver finished tiles to a [`RenderSink`] supplied by the
//! embedding application (a GL renderer, a file writer, a test collector).
//! The sink is shared by all workers and must be thread safe; callbacks
//! arrive on worker threads, except [`RenderSink::request_redraw`], which
//! the engine emits after a reconfiguration from the controlling thread.

use crate::source::SourceRef;
use crate::theme::RenderTheme;
use crate::tile::{GenerateError, TileJob};
use crate::coord::TileCoord;
use std::sync::Arc;

/// A finished, drawable tile produced by a generator.
///
/// Carries the raw payload plus the tile address, the source ref of the job
/// it answers and the theme it was styled with, so consumers can invalidate
/// artifacts that outlived their configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct TileArtifact {
    tile: TileCoord,
    source: SourceRef,
    theme: Arc<RenderTheme>,
    data: Vec<u8>,
}

impl TileArtifact {
    /// Create a new artifact.
    pub fn new(tile: TileCoord, source: SourceRef, theme: Arc<RenderTheme>, data: Vec<u8>) -> Self {
        Self {
            tile,
            source,
            theme,
            data,
        }
    }

    /// The tile this artifact covers.
    pub fn tile(&self) -> TileCoord {
        self.tile
    }

    /// The source configuration the artifact was generated under.
    pub fn source(&self) -> &SourceRef {
        &self.source
    }

    /// The theme the artifact was styled with.
    pub fn theme(&self) -> &RenderTheme {
        &self.theme
    }

    /// The raw tile payload.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the artifact, returning the payload.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// Receiver for worker output and engine redraw requests.
pub trait RenderSink: Send + Sync {
    /// Called by a worker when a tile has been generated.
    ///
    /// Each successfully generated job produces exactly one call.
    fn tile_ready(&self, artifact: TileArtifact);

    /// Called by a worker when generating a tile failed.
    ///
    /// The worker has already logged the failure and moves on to its next
    /// job; this hook exists for consumers that track or display errors.
    fn tile_failed(&self, _job: &TileJob, _error: &GenerateError) {}

    /// Called by the engine when the whole view must be rebuilt, after a
    /// source, theme or viewport change.
    ///
    /// Implementations may call back into the engine to submit a fresh job
    /// batch, but must not invoke reconfiguration operations from here.
    fn request_redraw(&self);
}
