//! Shared job queue.

use super::job::TileJob;
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

/// A replaceable batch of tile jobs shared between the engine and workers.
///
/// The queue holds at most one batch at a time: `set_jobs` replaces the
/// whole batch atomically, discarding any pending jobs from the previous
/// one. Workers drain it non-blockingly through `take`; parking on an empty
/// queue is the worker's affair, the queue itself never blocks.
///
/// Once `close` is called the queue stays permanently empty; late
/// submissions from a racing controller are silently dropped.
pub struct JobQueue {
    inner: Mutex<QueueInner>,
}

struct QueueInner {
    jobs: VecDeque<TileJob>,
    closed: bool,
}

impl JobQueue {
    /// Create an empty, open queue.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(QueueInner {
                jobs: VecDeque::new(),
                closed: false,
            }),
        }
    }

    /// Replace the current batch with `jobs`.
    ///
    /// Duplicate tiles within the batch are dropped, keeping the first
    /// occurrence so the caller's ordering is preserved. An empty batch is
    /// equivalent to [`clear`](Self::clear).
    pub fn set_jobs(&self, jobs: Vec<TileJob>) {
        let mut inner = self.inner.lock().unwrap();
        if inner.closed {
            return;
        }

        let mut seen = HashSet::with_capacity(jobs.len());
        inner.jobs = jobs
            .into_iter()
            .filter(|job| seen.insert(job.tile()))
            .collect();
    }

    /// Discard all pending jobs.
    pub fn clear(&self) {
        self.inner.lock().unwrap().jobs.clear();
    }

    /// Take the next job, if any.
    ///
    /// Jobs come out in the order the batch supplied them. Returns `None`
    /// on an empty or closed queue, and each job from a batch is returned
    /// exactly once.
    pub fn take(&self) -> Option<TileJob> {
        let mut inner = self.inner.lock().unwrap();
        if inner.closed {
            return None;
        }
        inner.jobs.pop_front()
    }

    /// Returns true if no jobs are pending.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().jobs.is_empty()
    }

    /// Number of pending jobs.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().jobs.len()
    }

    /// Permanently close the queue.
    ///
    /// Pending jobs are discarded, `take` returns `None` forever and later
    /// `set_jobs` calls are ignored. Part of engine teardown.
    pub fn close(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.closed = true;
        inner.jobs.clear();
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}
