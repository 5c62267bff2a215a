//! Tile generator trait and default implementation.

use super::error::GenerateError;
use super::job::TileJob;
use crate::render::TileArtifact;
use crate::source::{MapSource, SourceError};
use crate::theme::RenderTheme;
use std::sync::Arc;

/// Trait for turning tile jobs into drawable artifacts.
///
/// Each worker owns exactly one generator, which in turn owns the worker's
/// data source and a handle to the current render theme. The mutation
/// methods are plain field swaps with no internal locking: the engine only
/// calls them while the owning worker is parked behind the pause barrier,
/// which is what makes the single-owner model sound.
pub trait TileGenerator: Send {
    /// Generate the artifact for one job.
    ///
    /// A failure affects this job only; the worker carries on with the next
    /// one. Implementations must report failures through the error type
    /// rather than panic.
    fn generate(&mut self, job: &TileJob) -> Result<TileArtifact, GenerateError>;

    /// Replace the data source outright.
    ///
    /// The previous source is dropped; callers close it first.
    fn set_source(&mut self, source: Box<dyn MapSource>);

    /// The current data source.
    fn source(&self) -> &dyn MapSource;

    /// The current data source, mutably, for open/close calls.
    fn source_mut(&mut self) -> &mut dyn MapSource;

    /// Assign the render theme used for subsequent jobs.
    fn set_theme(&mut self, theme: Arc<RenderTheme>);

    /// The current render theme, if one is assigned.
    fn theme(&self) -> Option<&RenderTheme>;
}

/// Default generator: reads the tile payload from the source and tags it
/// with the job's source ref and the active theme.
pub struct MapTileGenerator {
    source: Box<dyn MapSource>,
    theme: Option<Arc<RenderTheme>>,
}

impl MapTileGenerator {
    /// Create a generator over the given source, with no theme assigned.
    ///
    /// Until a theme is set every job fails with
    /// [`GenerateError::NoTheme`].
    pub fn new(source: Box<dyn MapSource>) -> Self {
        Self {
            source,
            theme: None,
        }
    }

    /// Assign an initial theme, builder style.
    pub fn with_theme(mut self, theme: Arc<RenderTheme>) -> Self {
        self.theme = Some(theme);
        self
    }
}

impl TileGenerator for MapTileGenerator {
    fn generate(&mut self, job: &TileJob) -> Result<TileArtifact, GenerateError> {
        if !self.source.is_open() {
            return Err(GenerateError::SourceUnavailable);
        }
        let theme = self.theme.clone().ok_or(GenerateError::NoTheme)?;

        let data = match self.source.tile_data(job.tile()) {
            Ok(data) => data,
            Err(SourceError::NotOpen) => return Err(GenerateError::SourceUnavailable),
            Err(e) => return Err(GenerateError::Parse(e)),
        };

        Ok(TileArtifact::new(
            job.tile(),
            job.source().clone(),
            theme,
            data,
        ))
    }

    fn set_source(&mut self, source: Box<dyn MapSource>) {
        self.source = source;
    }

    fn source(&self) -> &dyn MapSource {
        self.source.as_ref()
    }

    fn source_mut(&mut self) -> &mut dyn MapSource {
        self.source.as_mut()
    }

    fn set_theme(&mut self, theme: Arc<RenderTheme>) {
        self.theme = Some(theme);
    }

    fn theme(&self) -> Option<&RenderTheme> {
        self.theme.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::TileCoord;
    use crate::source::{MemorySource, SourceMetadata, SourceOptions, SourceRef};

    fn open_memory_source() -> Box<dyn MapSource> {
        let mut source = MemorySource::new();
        source.open(&SourceOptions::default()).unwrap();
        Box::new(source)
    }

    fn test_theme() -> Arc<RenderTheme> {
        Arc::new(RenderTheme::new("test", [0, 0, 0, 255]))
    }

    fn test_job() -> TileJob {
        TileJob::new(TileCoord::new(2, 3, 5), SourceRef::new("memory"))
    }

    /// Source whose reads always report malformed data.
    struct MalformedSource;

    impl MapSource for MalformedSource {
        fn open(&mut self, _options: &SourceOptions) -> Result<(), SourceError> {
            Ok(())
        }

        fn close(&mut self) {}

        fn is_open(&self) -> bool {
            true
        }

        fn metadata(&self) -> Option<SourceMetadata> {
            Some(SourceMetadata::default())
        }

        fn tile_data(&mut self, tile: TileCoord) -> Result<Vec<u8>, SourceError> {
            Err(SourceError::Malformed {
                tile,
                reason: "truncated block".to_string(),
            })
        }
    }

    #[test]
    fn test_generate_produces_tagged_artifact() {
        let mut generator = MapTileGenerator::new(open_memory_source()).with_theme(test_theme());

        let artifact = generator.generate(&test_job()).unwrap();

        assert_eq!(artifact.tile(), TileCoord::new(2, 3, 5));
        assert_eq!(artifact.source().as_str(), "memory");
        assert_eq!(artifact.theme().name(), "test");
        assert!(!artifact.data().is_empty());
    }

    #[test]
    fn test_generate_without_theme_fails() {
        let mut generator = MapTileGenerator::new(open_memory_source());

        assert_eq!(
            generator.generate(&test_job()),
            Err(GenerateError::NoTheme)
        );
    }

    #[test]
    fn test_generate_with_closed_source_fails() {
        let mut generator =
            MapTileGenerator::new(Box::new(MemorySource::new())).with_theme(test_theme());

        assert_eq!(
            generator.generate(&test_job()),
            Err(GenerateError::SourceUnavailable)
        );
    }

    #[test]
    fn test_generate_maps_read_failures_to_parse() {
        let mut generator = MapTileGenerator::new(Box::new(MalformedSource)).with_theme(test_theme());

        let result = generator.generate(&test_job());
        assert!(matches!(result, Err(GenerateError::Parse(_))));
    }

    #[test]
    fn test_set_source_swaps_instance() {
        let mut generator = MapTileGenerator::new(open_memory_source()).with_theme(test_theme());
        assert!(generator.source().is_open());

        generator.set_source(Box::new(MemorySource::new()));
        assert!(!generator.source().is_open());
        assert_eq!(
            generator.generate(&test_job()),
            Err(GenerateError::SourceUnavailable)
        );
    }

    #[test]
    fn test_set_theme_applies_to_subsequent_jobs() {
        let mut generator = MapTileGenerator::new(open_memory_source()).with_theme(test_theme());

        generator.set_theme(Arc::new(RenderTheme::new("other", [1, 2, 3, 255])));

        let artifact = generator.generate(&test_job()).unwrap();
        assert_eq!(artifact.theme().name(), "other");
        assert_eq!(generator.theme().unwrap().name(), "other");
    }
}
