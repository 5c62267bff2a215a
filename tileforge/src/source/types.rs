//! Map source types and traits

use crate::coord::{BoundingBox, GeoPoint, TileCoord};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during map source operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SourceError {
    /// The source has not been opened or was closed
    #[error("Map source is not open")]
    NotOpen,

    /// Opening the source failed
    #[error("Failed to open map source: {reason}")]
    OpenFailed { reason: String },

    /// No data exists for the requested tile
    #[error("No tile data for {tile}")]
    TileNotFound { tile: TileCoord },

    /// Tile data exists but could not be decoded
    #[error("Malformed tile data for {tile}: {reason}")]
    Malformed { tile: TileCoord, reason: String },
}

/// Opaque key/value parameters for opening a map source.
///
/// The engine passes these through untouched; their meaning is defined by
/// the `MapSource` implementation (file paths, connection strings, etc.).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceOptions {
    params: HashMap<String, String>,
}

impl SourceOptions {
    /// Create an empty set of options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter, builder style.
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.params.insert(key.to_string(), value.to_string());
        self
    }

    /// Set a parameter.
    pub fn set(&mut self, key: &str, value: &str) {
        self.params.insert(key.to_string(), value.to_string());
    }

    /// Look up a parameter.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Returns true if no parameters are set.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Iterate over all parameters.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Descriptive metadata reported by an open map source.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceMetadata {
    /// Geographic area the source covers
    pub bounds: BoundingBox,
    /// Suggested initial map center, if the source declares one
    pub start_center: Option<GeoPoint>,
    /// Suggested initial zoom level, if the source declares one
    pub start_zoom: Option<u8>,
}

impl Default for SourceMetadata {
    fn default() -> Self {
        Self {
            bounds: BoundingBox::world(),
            start_center: None,
            start_zoom: None,
        }
    }
}

/// A cheap cloneable identifier for a source kind.
///
/// Jobs carry the ref of the source they were derived for, and generators
/// stamp it into artifacts, so consumers can discard output produced under
/// a superseded source configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceRef(Arc<str>);

impl SourceRef {
    /// Create a ref from a source kind name.
    pub fn new(kind: &str) -> Self {
        Self(Arc::from(kind))
    }

    /// The source kind name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceRef {
    fn from(kind: &str) -> Self {
        Self::new(kind)
    }
}

/// Trait for tile data sources.
///
/// Implementors read raw tile payloads from some backing store (map files,
/// tile archives, in-memory fixtures). Instances are owned by exactly one
/// worker at a time and are never shared across threads, so methods take
/// `&mut self` and implementations need no internal locking.
pub trait MapSource: Send {
    /// Opens the source with the given parameters.
    ///
    /// Opening an already open source closes it first. A failed open leaves
    /// the source closed.
    fn open(&mut self, options: &SourceOptions) -> Result<(), SourceError>;

    /// Closes the source. Closing a closed source is a no-op.
    fn close(&mut self);

    /// Returns true if the source is currently open.
    fn is_open(&self) -> bool;

    /// Returns the source's metadata, or `None` while closed.
    fn metadata(&self) -> Option<SourceMetadata>;

    /// Reads the raw payload for one tile.
    ///
    /// This is a blocking call; the worker invoking it cannot be paused or
    /// shut down until it returns.
    fn tile_data(&mut self, tile: TileCoord) -> Result<Vec<u8>, SourceError>;
}

/// Trait for creating per-worker source instances.
///
/// Each worker owns its own `MapSource`; the factory is what the engine
/// shares. `kind()` names the source type and is used to detect no-op
/// source swaps.
pub trait SourceFactory: Send + Sync {
    /// Returns the source kind name, e.g. "memory" or "mapfile".
    fn kind(&self) -> &str;

    /// Creates a new closed source instance.
    fn create(&self) -> Box<dyn MapSource>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_options_roundtrip() {
        let options = SourceOptions::new()
            .with("path", "/maps/berlin.map")
            .with("language", "de");

        assert_eq!(options.get("path"), Some("/maps/berlin.map"));
        assert_eq!(options.get("language"), Some("de"));
        assert_eq!(options.get("missing"), None);
        assert!(!options.is_empty());
    }

    #[test]
    fn test_source_options_default_is_empty() {
        assert!(SourceOptions::default().is_empty());
    }

    #[test]
    fn test_source_ref_equality() {
        let a = SourceRef::new("memory");
        let b = SourceRef::from("memory");
        let c = SourceRef::new("mapfile");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str(), "memory");
        assert_eq!(a.to_string(), "memory");
    }

    #[test]
    fn test_metadata_default_covers_world() {
        let metadata = SourceMetadata::default();
        assert_eq!(metadata.bounds, BoundingBox::world());
        assert!(metadata.start_center.is_none());
        assert!(metadata.start_zoom.is_none());
    }
}
