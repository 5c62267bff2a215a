//! Tileforge - Parallel map tile generation
//!
//! This library coordinates a pool of tile workers over a shared job
//! queue: the controlling layer derives the tiles covering the current
//! view, submits them as a batch, and receives finished artifacts through
//! a render sink. Shared resources (map source, render theme, viewport)
//! are swapped through a pause-and-quiesce protocol so no worker ever
//! observes a half-reconfigured generator.
//!
//! # High-Level API
//!
//! The [`engine`] module provides the main entry point:
//!
//! ```ignore
//! use tileforge::config::EngineConfig;
//! use tileforge::engine::MapEngine;
//! use tileforge::source::MemorySourceFactory;
//! use tileforge::theme::BuiltinThemeProvider;
//!
//! let engine = MapEngine::new(
//!     EngineConfig::load()?,
//!     &MemorySourceFactory::new(),
//!     std::sync::Arc::new(BuiltinThemeProvider::new()),
//!     sink,
//! );
//!
//! let tiles = engine.view().visible_tiles();
//! let source = engine.source_ref();
//! engine.submit_jobs(Some(
//!     tiles.into_iter().map(|t| tileforge::tile::TileJob::new(t, source.clone())).collect(),
//! ));
//! ```

pub mod config;
pub mod coord;
pub mod engine;
pub mod logging;
pub mod pool;
pub mod render;
pub mod source;
pub mod theme;
pub mod tile;
pub mod view;

/// Version of the tileforge library and CLI.
///
/// Defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
