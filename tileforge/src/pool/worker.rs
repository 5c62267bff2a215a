//! Tile worker thread.

use crate::render::RenderSink;
use crate::tile::{JobQueue, TileGenerator, TileJob};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// Lifecycle state of a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Taking jobs, or waiting for some to arrive
    Running,

    /// Pause requested; honored at the top of the next loop iteration
    PauseRequested,

    /// Parked until proceed or shutdown
    Paused,

    /// Shutdown requested; the run loop exits at its next check
    ShuttingDown,

    /// The run loop has exited. Terminal.
    Stopped,
}

impl WorkerState {
    /// Returns true if the worker is parked behind the pause barrier.
    pub fn is_paused(&self) -> bool {
        matches!(self, Self::Paused)
    }

    /// Returns true if the run loop has exited.
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped)
    }
}

/// Control block shared between a worker thread and its owner.
struct WorkerShared {
    state: Mutex<WorkerState>,
    cond: Condvar,
}

impl WorkerShared {
    fn new() -> Self {
        Self {
            state: Mutex::new(WorkerState::Running),
            cond: Condvar::new(),
        }
    }
}

pub(crate) type SharedGenerator = Arc<Mutex<Box<dyn TileGenerator>>>;

/// A tile rendering worker.
///
/// Owns one OS thread running a take/generate/deliver loop, plus the
/// generator (data source + theme) that thread works with.
///
/// The pause protocol: [`pause`](Self::pause) flags the worker,
/// [`await_paused`](Self::await_paused) blocks until it has parked at the
/// top of its loop (an in-flight generate always completes first), and
/// [`proceed`](Self::proceed) releases it. While parked the worker does not
/// touch its generator, so the owner may mutate the generator's source and
/// theme through [`with_generator`](Self::with_generator).
pub struct Worker {
    id: usize,
    shared: Arc<WorkerShared>,
    generator: SharedGenerator,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    /// Spawn a worker thread over the given queue, generator and sink.
    pub(crate) fn spawn(
        id: usize,
        queue: Arc<JobQueue>,
        generator: Box<dyn TileGenerator>,
        sink: Arc<dyn RenderSink>,
    ) -> Self {
        let shared = Arc::new(WorkerShared::new());
        let generator: SharedGenerator = Arc::new(Mutex::new(generator));

        let handle = {
            let shared = Arc::clone(&shared);
            let generator = Arc::clone(&generator);
            thread::Builder::new()
                .name(format!("tile-worker-{}", id))
                .spawn(move || Self::run_loop(id, shared, queue, generator, sink))
                .expect("Failed to spawn tile worker thread")
        };

        Self {
            id,
            shared,
            generator,
            handle: Some(handle),
        }
    }

    /// The worker's index within its pool.
    pub fn id(&self) -> usize {
        self.id
    }

    /// The worker's current lifecycle state.
    pub fn state(&self) -> WorkerState {
        *self.shared.state.lock().unwrap()
    }

    /// Request the worker to park.
    ///
    /// Takes effect at the top of the run loop; a job already being
    /// generated completes first. Idempotent, and a no-op once shutdown
    /// has begun.
    pub fn pause(&self) {
        let mut state = self.shared.state.lock().unwrap();
        if *state == WorkerState::Running {
            *state = WorkerState::PauseRequested;
            self.shared.cond.notify_all();
        }
    }

    /// Block until a requested pause has been honored.
    ///
    /// Returns immediately when no pause is in flight, including when the
    /// worker is already parked or shutting down.
    pub fn await_paused(&self) {
        let mut state = self.shared.state.lock().unwrap();
        while *state == WorkerState::PauseRequested {
            state = self.shared.cond.wait(state).unwrap();
        }
    }

    /// Release a parked worker, or cancel a not-yet-honored pause.
    ///
    /// Idempotent; proceeding a running worker changes nothing.
    pub fn proceed(&self) {
        let mut state = self.shared.state.lock().unwrap();
        if matches!(*state, WorkerState::Paused | WorkerState::PauseRequested) {
            *state = WorkerState::Running;
            self.shared.cond.notify_all();
        }
    }

    /// Request the run loop to exit.
    ///
    /// Observed between jobs and at every wait point, including while the
    /// worker is parked or waiting for work. Non-blocking; call
    /// [`join`](Self::join) afterwards to wait for the thread.
    pub fn shutdown(&self) {
        let mut state = self.shared.state.lock().unwrap();
        if *state != WorkerState::Stopped {
            *state = WorkerState::ShuttingDown;
            self.shared.cond.notify_all();
        }
    }

    /// Nudge the worker to re-check the queue after a submission.
    ///
    /// The state lock is taken first so a wake cannot slip between the
    /// worker's last empty-queue check and its wait.
    pub(crate) fn wake(&self) {
        let _state = self.shared.state.lock().unwrap();
        self.shared.cond.notify_all();
    }

    /// Wait for the worker thread to finish.
    ///
    /// Returns an error if the thread panicked. Joining an already joined
    /// worker is a no-op.
    pub fn join(&mut self) -> thread::Result<()> {
        match self.handle.take() {
            Some(handle) => handle.join(),
            None => Ok(()),
        }
    }

    /// Run a closure against the worker's generator.
    ///
    /// Locks the generator for the duration of the closure. Outside the
    /// pause barrier this can block behind an in-flight generate; the
    /// engine therefore mutates generators only between `await_paused` and
    /// `proceed`, where the lock is free by construction.
    pub fn with_generator<R>(&self, f: impl FnOnce(&mut dyn TileGenerator) -> R) -> R {
        let mut generator = self.generator.lock().unwrap();
        f(generator.as_mut())
    }

    /// Worker thread body.
    fn run_loop(
        id: usize,
        shared: Arc<WorkerShared>,
        queue: Arc<JobQueue>,
        generator: SharedGenerator,
        sink: Arc<dyn RenderSink>,
    ) {
        debug!("tile worker {} started", id);

        while let Some(job) = Self::next_job(&shared, &queue) {
            let result = {
                let mut generator = generator.lock().unwrap();
                generator.generate(&job)
            };

            match result {
                Ok(artifact) => sink.tile_ready(artifact),
                Err(error) => {
                    warn!("tile worker {}: generating {} failed: {}", id, job, error);
                    sink.tile_failed(&job, &error);
                }
            }
        }

        let mut state = shared.state.lock().unwrap();
        *state = WorkerState::Stopped;
        shared.cond.notify_all();
        drop(state);

        debug!("tile worker {} stopped", id);
    }

    /// Block until a job may be taken, honoring pause and shutdown.
    ///
    /// Returns `None` when the worker should exit.
    fn next_job(shared: &WorkerShared, queue: &JobQueue) -> Option<TileJob> {
        let mut state = shared.state.lock().unwrap();
        loop {
            match *state {
                WorkerState::ShuttingDown | WorkerState::Stopped => return None,
                WorkerState::PauseRequested => {
                    *state = WorkerState::Paused;
                    shared.cond.notify_all();
                }
                WorkerState::Paused => {
                    state = shared.cond.wait(state).unwrap();
                }
                WorkerState::Running => {
                    if let Some(job) = queue.take() {
                        return Some(job);
                    }
                    state = shared.cond.wait(state).unwrap();
                }
            }
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        // Signal only; deterministic teardown joins through the pool
        self.shutdown();
    }
}
