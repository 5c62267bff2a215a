//! Tile job type.

use crate::coord::TileCoord;
use crate::source::SourceRef;
use std::hash::{Hash, Hasher};

/// A unit of work for the worker pool: render one tile.
///
/// Jobs are immutable once created. Their identity is the tile address
/// alone; two jobs for the same tile compare equal even when created for
/// different source configurations, so a replaced batch never queues the
/// same tile twice.
#[derive(Debug, Clone)]
pub struct TileJob {
    tile: TileCoord,
    source: SourceRef,
}

impl TileJob {
    /// Create a job for the given tile and source configuration.
    pub fn new(tile: TileCoord, source: SourceRef) -> Self {
        Self { tile, source }
    }

    /// The tile to render.
    pub fn tile(&self) -> TileCoord {
        self.tile
    }

    /// The source configuration the job was derived for.
    pub fn source(&self) -> &SourceRef {
        &self.source
    }
}

impl PartialEq for TileJob {
    fn eq(&self, other: &Self) -> bool {
        self.tile == other.tile
    }
}

impl Eq for TileJob {}

impl Hash for TileJob {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tile.hash(state);
    }
}

impl std::fmt::Display for TileJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tile)
    }
}
