//! Tile worker pool.
//!
//! A fixed set of [`Worker`]s draining one shared [`JobQueue`]. The pool
//! provides the collective operations the engine's reconfiguration
//! protocol is built on: pause-and-quiesce every worker, resume them all,
//! and tear the pool down worker by worker.

mod worker;

pub use worker::{Worker, WorkerState};

use crate::render::RenderSink;
use crate::tile::{JobQueue, TileGenerator, TileJob};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Fixed-size pool of tile workers over a shared job queue.
pub struct WorkerPool {
    workers: Vec<Worker>,
    queue: Arc<JobQueue>,
}

impl WorkerPool {
    /// Spawn one worker per generator.
    ///
    /// Workers start in the `Running` state and immediately wait for jobs.
    pub fn new(
        queue: Arc<JobQueue>,
        generators: Vec<Box<dyn TileGenerator>>,
        sink: Arc<dyn RenderSink>,
    ) -> Self {
        info!("starting tile worker pool with {} workers", generators.len());

        let workers = generators
            .into_iter()
            .enumerate()
            .map(|(id, generator)| {
                Worker::spawn(id, Arc::clone(&queue), generator, Arc::clone(&sink))
            })
            .collect();

        Self { workers, queue }
    }

    /// Number of workers in the pool.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// The pool's workers, in id order.
    pub fn workers(&self) -> &[Worker] {
        &self.workers
    }

    /// Replace the job batch and wake every worker.
    ///
    /// An empty batch just discards pending work.
    pub fn submit(&self, jobs: Vec<TileJob>) {
        if jobs.is_empty() {
            self.queue.clear();
            return;
        }
        self.queue.set_jobs(jobs);
        self.wake_all();
    }

    /// Discard pending jobs without waking anyone.
    pub fn clear(&self) {
        self.queue.clear();
    }

    /// Wake every worker to re-check the queue.
    pub fn wake_all(&self) {
        for worker in &self.workers {
            worker.wake();
        }
    }

    /// Request every worker to park.
    ///
    /// With `wait` set this blocks until each worker has honored the pause,
    /// i.e. finished its in-flight job and parked. On return no worker is
    /// inside `generate` and none will start a job until
    /// [`resume_all`](Self::resume_all); this is the quiesce barrier
    /// reconfiguration relies on.
    pub fn pause_all(&self, wait: bool) {
        for worker in &self.workers {
            worker.pause();
        }
        if wait {
            for worker in &self.workers {
                worker.await_paused();
            }
        }
    }

    /// Release every parked worker.
    pub fn resume_all(&self) {
        for worker in &self.workers {
            worker.proceed();
        }
    }

    /// Tear the pool down: every worker is paused, shut down, joined and
    /// its data source closed, in id order.
    ///
    /// Teardown always completes for all workers. Returns the ids of
    /// workers whose threads panicked instead of joining cleanly.
    pub fn destroy(&mut self) -> Vec<usize> {
        info!("stopping {} tile workers", self.workers.len());

        let mut failed = Vec::new();
        for worker in &mut self.workers {
            worker.pause();
            worker.shutdown();
            if let Err(panic) = worker.join() {
                warn!(
                    "tile worker {} panicked during shutdown: {:?}",
                    worker.id(),
                    panic
                );
                failed.push(worker.id());
            }
            worker.with_generator(|generator| generator.source_mut().close());
            debug!("tile worker {} torn down", worker.id());
        }
        failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::TileCoord;
    use crate::render::TileArtifact;
    use crate::source::{
        MapSource, MemorySource, SourceError, SourceMetadata, SourceOptions, SourceRef,
    };
    use crate::theme::RenderTheme;
    use crate::tile::MapTileGenerator;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::thread;
    use std::time::{Duration, Instant};

    /// Sink recording every delivered tile.
    struct CollectingSink {
        tiles: Mutex<Vec<TileCoord>>,
    }

    impl CollectingSink {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                tiles: Mutex::new(Vec::new()),
            })
        }

        fn delivered(&self) -> Vec<TileCoord> {
            self.tiles.lock().unwrap().clone()
        }
    }

    impl RenderSink for CollectingSink {
        fn tile_ready(&self, artifact: TileArtifact) {
            self.tiles.lock().unwrap().push(artifact.tile());
        }

        fn request_redraw(&self) {}
    }

    /// Source that counts how often it gets closed.
    struct TrackingSource {
        open: bool,
        closes: Arc<AtomicUsize>,
    }

    impl MapSource for TrackingSource {
        fn open(&mut self, _options: &SourceOptions) -> Result<(), SourceError> {
            self.open = true;
            Ok(())
        }

        fn close(&mut self) {
            if self.open {
                self.closes.fetch_add(1, Ordering::SeqCst);
            }
            self.open = false;
        }

        fn is_open(&self) -> bool {
            self.open
        }

        fn metadata(&self) -> Option<SourceMetadata> {
            self.open.then(SourceMetadata::default)
        }

        fn tile_data(&mut self, tile: TileCoord) -> Result<Vec<u8>, SourceError> {
            if !self.open {
                return Err(SourceError::NotOpen);
            }
            Ok(vec![tile.zoom])
        }
    }

    fn test_theme() -> Arc<RenderTheme> {
        Arc::new(RenderTheme::new("test", [0, 0, 0, 255]))
    }

    fn memory_generators(count: usize) -> Vec<Box<dyn TileGenerator>> {
        (0..count)
            .map(|_| {
                let mut source = MemorySource::new();
                source.open(&SourceOptions::default()).unwrap();
                Box::new(MapTileGenerator::new(Box::new(source)).with_theme(test_theme()))
                    as Box<dyn TileGenerator>
            })
            .collect()
    }

    fn job(x: u32, y: u32, zoom: u8) -> TileJob {
        TileJob::new(TileCoord::new(x, y, zoom), SourceRef::new("memory"))
    }

    fn wait_until(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if check() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        check()
    }

    #[test]
    fn test_each_job_dispatched_exactly_once() {
        let queue = Arc::new(JobQueue::new());
        let sink = CollectingSink::new();
        let mut pool = WorkerPool::new(Arc::clone(&queue), memory_generators(2), sink.clone());

        pool.submit(vec![job(2, 3, 5), job(2, 4, 5)]);

        assert!(wait_until(Duration::from_secs(2), || {
            sink.delivered().len() == 2
        }));

        let mut tiles = sink.delivered();
        tiles.sort_by_key(|t| (t.x, t.y));
        assert_eq!(
            tiles,
            vec![TileCoord::new(2, 3, 5), TileCoord::new(2, 4, 5)],
            "both tiles delivered once each, regardless of which worker took them"
        );

        pool.destroy();
    }

    #[test]
    fn test_pause_all_quiesces_the_pool() {
        let queue = Arc::new(JobQueue::new());
        let sink = CollectingSink::new();
        let mut pool = WorkerPool::new(Arc::clone(&queue), memory_generators(3), sink.clone());

        pool.pause_all(true);
        for worker in pool.workers() {
            assert!(worker.state().is_paused());
        }

        // Work submitted while quiesced stays untouched
        pool.submit(vec![job(1, 1, 4), job(2, 1, 4)]);
        assert!(
            !wait_until(Duration::from_millis(200), || !sink.delivered().is_empty()),
            "No worker may generate while the pool is quiesced"
        );
        assert_eq!(queue.len(), 2);

        pool.resume_all();
        assert!(wait_until(Duration::from_secs(2), || {
            sink.delivered().len() == 2
        }));

        pool.destroy();
    }

    #[test]
    fn test_generators_mutable_while_quiesced() {
        let queue = Arc::new(JobQueue::new());
        let sink = CollectingSink::new();
        let mut pool = WorkerPool::new(Arc::clone(&queue), memory_generators(2), sink.clone());

        pool.pause_all(true);
        for worker in pool.workers() {
            worker.with_generator(|generator| {
                generator.set_theme(Arc::new(RenderTheme::new("swapped", [9, 9, 9, 255])));
            });
        }
        pool.resume_all();

        for worker in pool.workers() {
            let name = worker.with_generator(|generator| generator.theme().unwrap().name().to_string());
            assert_eq!(name, "swapped");
        }

        pool.destroy();
    }

    #[test]
    fn test_destroy_stops_workers_and_closes_sources() {
        let closes = Arc::new(AtomicUsize::new(0));
        let generators: Vec<Box<dyn TileGenerator>> = (0..3)
            .map(|_| {
                let mut source = TrackingSource {
                    open: false,
                    closes: Arc::clone(&closes),
                };
                source.open(&SourceOptions::default()).unwrap();
                Box::new(MapTileGenerator::new(Box::new(source)).with_theme(test_theme()))
                    as Box<dyn TileGenerator>
            })
            .collect();

        let queue = Arc::new(JobQueue::new());
        let sink = CollectingSink::new();
        let mut pool = WorkerPool::new(queue, generators, sink);

        let failed = pool.destroy();

        assert!(failed.is_empty());
        assert_eq!(closes.load(Ordering::SeqCst), 3, "every source closed");
        for worker in pool.workers() {
            assert!(worker.state().is_stopped());
        }
    }

    #[test]
    fn test_submit_empty_batch_clears() {
        let queue = Arc::new(JobQueue::new());
        let sink = CollectingSink::new();
        let mut pool = WorkerPool::new(Arc::clone(&queue), memory_generators(1), sink);

        pool.pause_all(true);
        pool.submit(vec![job(1, 1, 4)]);
        pool.submit(Vec::new());
        assert!(queue.is_empty());

        pool.destroy();
    }
}
