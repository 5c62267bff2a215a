//! Map data source abstraction layer.
//!
//! This module provides the `MapSource` trait for reading raw tile payloads
//! from a backing store, the `SourceFactory` trait for creating per-worker
//! instances, and an in-memory implementation for demos and tests.
//!
//! Each worker in the pool owns exactly one source instance. The engine
//! opens, closes and replaces those instances only while the owning worker
//! is quiesced, so implementations never see concurrent calls.

mod memory;
mod types;

pub use memory::{MemorySource, MemorySourceFactory};
pub use types::{MapSource, SourceError, SourceFactory, SourceMetadata, SourceOptions, SourceRef};
