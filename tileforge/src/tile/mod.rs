//! Tile job and generation abstraction layer.
//!
//! This module holds the unit of work ([`TileJob`]), the shared queue the
//! worker pool drains ([`JobQueue`]) and the [`TileGenerator`] trait that
//! turns jobs into drawable artifacts.
//!
//! The queue holds at most one batch: a controller derives the tile set for
//! the current view and replaces the whole batch whenever the view changes,
//! rather than appending. Workers take jobs one at a time and hand results
//! to the render sink; they never touch the queue in any other way.

mod error;
mod generator;
mod job;
mod queue;

pub use error::GenerateError;
pub use generator::{MapTileGenerator, TileGenerator};
pub use job::TileJob;
pub use queue::JobQueue;
