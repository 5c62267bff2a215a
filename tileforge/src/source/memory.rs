//! In-memory map source for demos and tests.
//!
//! Serves a deterministic synthetic payload for every tile inside its
//! bounding box, with no backing files. Useful for exercising the engine
//! end to end without a real map database.

use super::types::{MapSource, SourceError, SourceFactory, SourceMetadata, SourceOptions};
use crate::coord::{self, GeoPoint, TileCoord};

/// Magic bytes prefixing every synthetic tile payload.
const PAYLOAD_MAGIC: &[u8; 4] = b"MTIL";

/// Map source backed by procedurally generated in-memory data.
#[derive(Debug, Clone)]
pub struct MemorySource {
    open: bool,
    metadata: SourceMetadata,
}

impl MemorySource {
    /// Create a closed source covering the whole world.
    pub fn new() -> Self {
        Self {
            open: false,
            metadata: SourceMetadata::default(),
        }
    }

    /// Restrict the source to the given metadata (bounds, start position).
    pub fn with_metadata(mut self, metadata: SourceMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Builds the deterministic payload for a tile.
    fn payload(tile: TileCoord) -> Vec<u8> {
        let mut data = Vec::with_capacity(13);
        data.extend_from_slice(PAYLOAD_MAGIC);
        data.push(tile.zoom);
        data.extend_from_slice(&tile.x.to_be_bytes());
        data.extend_from_slice(&tile.y.to_be_bytes());
        data
    }

    /// Returns true if the tile overlaps the configured bounding box.
    fn in_bounds(&self, tile: TileCoord) -> bool {
        let bounds = self.metadata.bounds;
        let northwest = GeoPoint::new(coord::clamp_latitude(bounds.max_lat), bounds.min_lon);
        let southeast = GeoPoint::new(coord::clamp_latitude(bounds.min_lat), bounds.max_lon);

        let (first, last) = match (
            coord::tile_containing(northwest, tile.zoom),
            coord::tile_containing(southeast, tile.zoom),
        ) {
            (Ok(first), Ok(last)) => (first, last),
            _ => return false,
        };

        (first.x..=last.x).contains(&tile.x) && (first.y..=last.y).contains(&tile.y)
    }
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl MapSource for MemorySource {
    fn open(&mut self, _options: &SourceOptions) -> Result<(), SourceError> {
        self.open = true;
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn metadata(&self) -> Option<SourceMetadata> {
        self.open.then(|| self.metadata.clone())
    }

    fn tile_data(&mut self, tile: TileCoord) -> Result<Vec<u8>, SourceError> {
        if !self.open {
            return Err(SourceError::NotOpen);
        }
        if tile.zoom > coord::MAX_ZOOM || !self.in_bounds(tile) {
            return Err(SourceError::TileNotFound { tile });
        }
        Ok(Self::payload(tile))
    }
}

/// Factory producing [`MemorySource`] instances.
#[derive(Debug, Clone, Default)]
pub struct MemorySourceFactory {
    metadata: SourceMetadata,
}

impl MemorySourceFactory {
    /// Create a factory for world-covering memory sources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the metadata every created source reports.
    pub fn with_metadata(mut self, metadata: SourceMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

impl SourceFactory for MemorySourceFactory {
    fn kind(&self) -> &str {
        "memory"
    }

    fn create(&self) -> Box<dyn MapSource> {
        Box::new(MemorySource::new().with_metadata(self.metadata.clone()))
    }
}
