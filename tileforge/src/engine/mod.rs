//! Map engine: the coordination layer.
//!
//! A [`MapEngine`] owns the job queue, the worker pool and the shared view
//! state, and implements the quiesce protocol every reconfiguration runs
//! through: clear the queue, pause all workers and wait until each has
//! drained its in-flight job, mutate the per-worker resources, resume.
//! Reconfiguration calls serialize through one internal lock, so at most
//! one mutation is in flight at a time.
//!
//! Redraw signals are sent after that lock is released. A sink may submit
//! a fresh job batch from inside `request_redraw` without deadlocking.

mod error;

pub use error::EngineError;

use crate::config::EngineConfig;
use crate::coord::GeoPoint;
use crate::pool::WorkerPool;
use crate::render::RenderSink;
use crate::source::{SourceFactory, SourceMetadata, SourceOptions, SourceRef};
use crate::theme::{ThemeId, ThemeProvider};
use crate::tile::{JobQueue, MapTileGenerator, TileGenerator, TileJob};
use crate::view::{MapPosition, ViewState};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Zoom level used when a source declares no start zoom.
const DEFAULT_START_ZOOM: u8 = 1;

/// Live configuration record, guarded by the reconfiguration lock.
struct EngineShared {
    source_kind: String,
    options: Option<SourceOptions>,
    theme: Option<ThemeId>,
}

/// The tile engine: N workers over one job queue, plus the shared view.
pub struct MapEngine {
    queue: Arc<JobQueue>,
    pool: WorkerPool,
    view: Arc<ViewState>,
    sink: Arc<dyn RenderSink>,
    themes: Arc<dyn ThemeProvider>,
    shared: Mutex<EngineShared>,
}

impl MapEngine {
    /// Build an engine and start its workers.
    ///
    /// One source instance is created per worker and opened with the
    /// configured options before any worker thread starts. Open failures
    /// are logged and tolerated; a worker with a closed source fails its
    /// jobs until the source is reconfigured. The default theme is loaded
    /// the same way. If the view has no position yet it is placed at the
    /// source's declared start position, falling back to the center of
    /// the source's bounds.
    pub fn new(
        config: EngineConfig,
        sources: &dyn SourceFactory,
        themes: Arc<dyn ThemeProvider>,
        sink: Arc<dyn RenderSink>,
    ) -> Self {
        let queue = Arc::new(JobQueue::new());
        let view = Arc::new(ViewState::new(
            config.zoom_min,
            config.zoom_max,
            config.tile_size,
        ));

        let theme = match themes.load(&config.default_theme) {
            Ok(theme) => Some(theme),
            Err(e) => {
                warn!("failed to load theme {}: {}", config.default_theme, e);
                None
            }
        };

        let mut opened = 0;
        let mut start = None;
        let mut generators: Vec<Box<dyn TileGenerator>> = Vec::with_capacity(config.workers);
        for id in 0..config.workers {
            let mut source = sources.create();
            match source.open(&config.source_options) {
                Ok(()) => {
                    opened += 1;
                    if start.is_none() {
                        start = source.metadata();
                    }
                }
                Err(e) => {
                    warn!(
                        "tile worker {}: failed to open {} source: {}",
                        id,
                        sources.kind(),
                        e
                    );
                }
            }
            let mut generator = MapTileGenerator::new(source);
            if let Some(theme) = &theme {
                generator.set_theme(Arc::clone(theme));
            }
            generators.push(Box::new(generator));
        }

        let pool = WorkerPool::new(Arc::clone(&queue), generators, Arc::clone(&sink));

        let shared = Mutex::new(EngineShared {
            source_kind: sources.kind().to_string(),
            options: (opened > 0).then(|| config.source_options.clone()),
            theme: theme.is_some().then(|| config.default_theme.clone()),
        });

        let engine = Self {
            queue,
            pool,
            view,
            sink,
            themes,
            shared,
        };

        if !engine.view.is_valid() {
            let position = start_position(start);
            engine.view.set_position(position.center, position.zoom);
            debug!("initial position {}", position);
        }

        info!(
            "map engine started: {} workers on {} source",
            engine.pool.worker_count(),
            sources.kind()
        );
        engine
    }

    /// Replace the pending job batch and wake the workers.
    ///
    /// `None` or an empty batch cancels all not-yet-started work without
    /// pausing anyone; jobs already being generated still complete.
    pub fn submit_jobs(&self, jobs: Option<Vec<TileJob>>) {
        match jobs {
            Some(jobs) => self.pool.submit(jobs),
            None => self.pool.clear(),
        }
    }

    /// Pause every worker, optionally waiting until all are parked.
    ///
    /// Serializes with reconfiguration. Pending jobs stay queued.
    pub fn pause_all(&self, wait: bool) {
        let _shared = self.shared.lock().unwrap();
        self.pool.pause_all(wait);
    }

    /// Resume every paused worker.
    pub fn resume_all(&self) {
        let _shared = self.shared.lock().unwrap();
        self.pool.resume_all();
    }

    /// Reopen every worker's map source with new parameters.
    ///
    /// Runs the quiesce protocol, then closes and reopens each worker's
    /// source with `options` (`None` means source defaults). Succeeds if at
    /// least one worker's source opened, and triggers a full redraw. If
    /// every open fails the sources are left closed, nothing is rolled
    /// back, and `ConfigurationFailed` is returned.
    pub fn set_source_options(
        &self,
        options: Option<SourceOptions>,
    ) -> Result<(), EngineError> {
        let opened = {
            let mut shared = self.shared.lock().unwrap();
            let options = options.unwrap_or_default();
            info!("reconfiguring map source parameters");

            self.queue.clear();
            self.pool.pause_all(true);
            let mut opened = 0;
            for worker in self.pool.workers() {
                let result = worker.with_generator(|generator| {
                    let source = generator.source_mut();
                    source.close();
                    source.open(&options)
                });
                match result {
                    Ok(()) => opened += 1,
                    Err(e) => {
                        warn!("tile worker {}: failed to reopen map source: {}", worker.id(), e);
                    }
                }
            }
            self.pool.resume_all();

            shared.options = (opened > 0).then_some(options);
            opened
        };

        if opened == 0 {
            return Err(EngineError::ConfigurationFailed {
                workers: self.pool.worker_count(),
            });
        }
        info!(
            "map source reopened on {}/{} workers",
            opened,
            self.pool.worker_count()
        );
        self.sink.request_redraw();
        Ok(())
    }

    /// Switch every worker to a different kind of map source.
    ///
    /// A no-op when `factory` produces the kind already active. Otherwise
    /// runs the quiesce protocol and replaces each worker's source instance
    /// outright, opening the new one with default options. Partial success
    /// counts as success, as for
    /// [`set_source_options`](Self::set_source_options). If the view has
    /// never been positioned it picks up the new source's start position.
    pub fn set_source(&self, factory: &dyn SourceFactory) -> Result<(), EngineError> {
        let (opened, start) = {
            let mut shared = self.shared.lock().unwrap();
            if shared.source_kind == factory.kind() {
                debug!("map source {} already active", factory.kind());
                return Ok(());
            }
            info!(
                "switching map source from {} to {}",
                shared.source_kind,
                factory.kind()
            );

            self.queue.clear();
            self.pool.pause_all(true);
            let options = SourceOptions::default();
            let mut opened = 0;
            let mut start = None;
            for worker in self.pool.workers() {
                let (result, metadata) = worker.with_generator(|generator| {
                    generator.source_mut().close();
                    let mut source = factory.create();
                    let result = source.open(&options);
                    let metadata = source.metadata();
                    generator.set_source(source);
                    (result, metadata)
                });
                match result {
                    Ok(()) => {
                        opened += 1;
                        if start.is_none() {
                            start = metadata;
                        }
                    }
                    Err(e) => {
                        warn!(
                            "tile worker {}: failed to open {} source: {}",
                            worker.id(),
                            factory.kind(),
                            e
                        );
                    }
                }
            }
            self.pool.resume_all();

            shared.source_kind = factory.kind().to_string();
            shared.options = (opened > 0).then_some(options);
            (opened, start)
        };

        if opened == 0 {
            return Err(EngineError::ConfigurationFailed {
                workers: self.pool.worker_count(),
            });
        }
        if !self.view.is_valid() {
            let position = start_position(start);
            self.view.set_position(position.center, position.zoom);
        }
        self.sink.request_redraw();
        Ok(())
    }

    /// Load a theme and bind it to every worker's generator.
    ///
    /// Runs the quiesce protocol. On load failure the previous theme stays
    /// in effect on every worker and no redraw is triggered.
    pub fn set_theme(&self, theme: &ThemeId) -> Result<(), EngineError> {
        let loaded = {
            let mut shared = self.shared.lock().unwrap();
            self.queue.clear();
            self.pool.pause_all(true);
            let loaded = self.themes.load(theme);
            if let Ok(loaded) = &loaded {
                for worker in self.pool.workers() {
                    worker.with_generator(|generator| generator.set_theme(Arc::clone(loaded)));
                }
                shared.theme = Some(theme.clone());
            }
            self.pool.resume_all();
            loaded
        };

        match loaded {
            Ok(loaded) => {
                info!("render theme set to {}", loaded.name());
                self.sink.request_redraw();
                Ok(())
            }
            Err(e) => {
                warn!("failed to load render theme {}: {}", theme, e);
                Err(EngineError::ThemeLoad(e))
            }
        }
    }

    /// Apply a new viewport size and trigger a redraw.
    pub fn resize(&self, width: u32, height: u32) {
        {
            let _shared = self.shared.lock().unwrap();
            self.queue.clear();
            self.pool.pause_all(true);
            self.view.set_size(width, height);
            self.pool.resume_all();
        }
        debug!("viewport resized to {}x{}", width, height);
        self.sink.request_redraw();
    }

    /// Move the view and trigger a redraw.
    pub fn set_position(&self, center: GeoPoint, zoom: u8) {
        self.view.set_position(center, zoom);
        self.sink.request_redraw();
    }

    /// Move the view center, keeping the zoom, and trigger a redraw.
    pub fn set_center(&self, center: GeoPoint) {
        self.view.set_center(center);
        self.sink.request_redraw();
    }

    /// Change the zoom level and trigger a redraw.
    pub fn set_zoom(&self, zoom: u8) {
        self.view.set_zoom(zoom);
        self.sink.request_redraw();
    }

    /// Step the zoom by `delta` levels.
    ///
    /// Triggers a redraw and returns true if the level changed; returns
    /// false when the target lies outside the view's zoom limits.
    pub fn zoom_by(&self, delta: i8) -> bool {
        if self.view.zoom_by(delta) {
            self.sink.request_redraw();
            return true;
        }
        false
    }

    /// Current view position.
    pub fn position(&self) -> MapPosition {
        self.view.position()
    }

    /// Whether the view is positioned inside the active source's bounds.
    pub fn has_valid_center(&self) -> bool {
        if !self.view.is_valid() {
            return false;
        }
        let center = self.view.position().center;
        match self.pool.workers().first() {
            Some(worker) => worker
                .with_generator(|generator| generator.source().metadata())
                .is_some_and(|metadata| metadata.bounds.contains(center)),
            None => false,
        }
    }

    /// Shared handle to the view state.
    pub fn view(&self) -> Arc<ViewState> {
        Arc::clone(&self.view)
    }

    /// Ref identifying the active source kind, for stamping into jobs.
    pub fn source_ref(&self) -> SourceRef {
        SourceRef::new(&self.shared.lock().unwrap().source_kind)
    }

    /// Options the sources were last successfully opened with.
    pub fn current_options(&self) -> Option<SourceOptions> {
        self.shared.lock().unwrap().options.clone()
    }

    /// Id of the currently bound theme, if one loaded.
    pub fn current_theme(&self) -> Option<ThemeId> {
        self.shared.lock().unwrap().theme.clone()
    }

    /// Number of workers in the pool.
    pub fn worker_count(&self) -> usize {
        self.pool.worker_count()
    }

    /// Tear the engine down.
    ///
    /// The queue stops handing out jobs, then every worker is paused, shut
    /// down, joined and its source closed. Teardown always completes for
    /// all workers; worker threads that panicked instead of joining
    /// cleanly are reported in the error.
    pub fn destroy(mut self) -> Result<(), EngineError> {
        info!("shutting down map engine");
        self.queue.close();
        let failed = self.pool.destroy();
        if failed.is_empty() {
            Ok(())
        } else {
            Err(EngineError::WorkerJoinFailed { workers: failed })
        }
    }
}

impl Drop for MapEngine {
    /// Close the queue so late submissions are dropped. Workers signal
    /// their own shutdown on drop; [`destroy`](Self::destroy) is the
    /// graceful path that also joins them and closes the sources.
    fn drop(&mut self) {
        self.queue.close();
    }
}

/// Derive the initial view position from source metadata.
fn start_position(metadata: Option<SourceMetadata>) -> MapPosition {
    let metadata = metadata.unwrap_or_default();
    let center = metadata
        .start_center
        .unwrap_or_else(|| metadata.bounds.center());
    let zoom = metadata.start_zoom.unwrap_or(DEFAULT_START_ZOOM);
    MapPosition::new(center, zoom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::BoundingBox;
    use crate::render::TileArtifact;
    use crate::source::{MapSource, MemorySource, MemorySourceFactory};
    use crate::theme::BuiltinThemeProvider;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSink {
        redraws: AtomicUsize,
    }

    impl CountingSink {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                redraws: AtomicUsize::new(0),
            })
        }

        fn redraws(&self) -> usize {
            self.redraws.load(Ordering::SeqCst)
        }
    }

    impl RenderSink for CountingSink {
        fn tile_ready(&self, _artifact: TileArtifact) {}

        fn request_redraw(&self) {
            self.redraws.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Factory producing sources with a fixed metadata block.
    struct RegionFactory {
        metadata: SourceMetadata,
    }

    impl SourceFactory for RegionFactory {
        fn kind(&self) -> &str {
            "region"
        }

        fn create(&self) -> Box<dyn MapSource> {
            Box::new(MemorySource::new().with_metadata(self.metadata.clone()))
        }
    }

    fn test_engine(workers: usize, sink: Arc<dyn RenderSink>) -> MapEngine {
        let config = EngineConfig::default().with_workers(workers);
        MapEngine::new(
            config,
            &MemorySourceFactory::new(),
            Arc::new(BuiltinThemeProvider::new()),
            sink,
        )
    }

    #[test]
    fn test_start_position_from_metadata() {
        let metadata = SourceMetadata {
            bounds: BoundingBox::new(40.0, 10.0, 50.0, 20.0),
            start_center: Some(GeoPoint::new(48.1, 11.5)),
            start_zoom: Some(12),
        };
        let position = start_position(Some(metadata));
        assert_eq!(position.zoom, 12);
        assert!((position.center.lat - 48.1).abs() < 1e-9);
    }

    #[test]
    fn test_start_position_falls_back_to_bounds_center() {
        let metadata = SourceMetadata {
            bounds: BoundingBox::new(40.0, 10.0, 50.0, 20.0),
            start_center: None,
            start_zoom: None,
        };
        let position = start_position(Some(metadata));
        assert_eq!(position.zoom, DEFAULT_START_ZOOM);
        assert!((position.center.lat - 45.0).abs() < 1e-9);
        assert!((position.center.lon - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_engine_positions_view_on_construction() {
        let sink = CountingSink::new();
        let engine = test_engine(2, sink);

        assert!(engine.view().is_valid());
        assert!(engine.has_valid_center());
        engine.destroy().unwrap();
    }

    #[test]
    fn test_same_source_kind_is_a_noop() {
        let sink = CountingSink::new();
        let engine = test_engine(2, sink.clone());
        let before = sink.redraws();

        engine.set_source(&MemorySourceFactory::new()).unwrap();

        assert_eq!(sink.redraws(), before, "no redraw for a no-op switch");
        assert_eq!(engine.source_ref().as_str(), "memory");
        engine.destroy().unwrap();
    }

    #[test]
    fn test_switching_source_kind_records_it() {
        let sink = CountingSink::new();
        let engine = test_engine(2, sink.clone());

        let factory = RegionFactory {
            metadata: SourceMetadata::default(),
        };
        engine.set_source(&factory).unwrap();

        assert_eq!(engine.source_ref().as_str(), "region");
        assert!(sink.redraws() > 0);
        engine.destroy().unwrap();
    }

    #[test]
    fn test_unknown_theme_keeps_previous() {
        let sink = CountingSink::new();
        let engine = test_engine(1, sink.clone());
        let before = engine.current_theme();

        let result = engine.set_theme(&ThemeId::builtin("no-such-theme"));

        assert!(matches!(result, Err(EngineError::ThemeLoad(_))));
        assert_eq!(engine.current_theme(), before);
        engine.destroy().unwrap();
    }

    #[test]
    fn test_zoom_by_outside_limits_reports_false() {
        let sink = CountingSink::new();
        let engine = test_engine(1, sink.clone());
        engine.set_position(GeoPoint::origin(), 1);
        let before = sink.redraws();

        assert!(!engine.zoom_by(-1));
        assert_eq!(sink.redraws(), before, "failed zoom must not redraw");

        assert!(engine.zoom_by(1));
        assert_eq!(sink.redraws(), before + 1);
        engine.destroy().unwrap();
    }

    #[test]
    fn test_resize_redraws() {
        let sink = CountingSink::new();
        let engine = test_engine(2, sink.clone());
        let before = sink.redraws();

        engine.resize(1024, 768);

        assert_eq!(engine.view().size(), (1024, 768));
        assert_eq!(sink.redraws(), before + 1);
        engine.destroy().unwrap();
    }
}
