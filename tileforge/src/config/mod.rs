//! Engine configuration.
//!
//! [`EngineConfig`] carries everything [`MapEngine`](crate::engine::MapEngine)
//! needs at construction. It can be built in code, or loaded from
//! `~/.tileforge/config.ini` via [`EngineConfig::load`].

mod file;

pub use file::{config_directory, config_file_path, ConfigError};

use crate::coord;
use crate::source::SourceOptions;
use crate::theme::{ThemeId, DEFAULT_THEME};

/// Tile edge length in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Default lower zoom limit.
pub const DEFAULT_ZOOM_MIN: u8 = 1;

/// Default upper zoom limit.
pub const DEFAULT_ZOOM_MAX: u8 = coord::MAX_ZOOM;

/// Worker count used when none is configured: one per available core,
/// falling back to 4 when parallelism cannot be determined.
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Settings for building a [`MapEngine`](crate::engine::MapEngine).
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Number of tile workers to spawn.
    pub workers: usize,
    /// Tile edge length in pixels.
    pub tile_size: u32,
    /// Lower zoom limit of the view.
    pub zoom_min: u8,
    /// Upper zoom limit of the view.
    pub zoom_max: u8,
    /// Theme bound to every generator at startup.
    pub default_theme: ThemeId,
    /// Parameters the initial sources are opened with.
    pub source_options: SourceOptions,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: default_worker_count(),
            tile_size: DEFAULT_TILE_SIZE,
            zoom_min: DEFAULT_ZOOM_MIN,
            zoom_max: DEFAULT_ZOOM_MAX,
            default_theme: ThemeId::builtin(DEFAULT_THEME),
            source_options: SourceOptions::default(),
        }
    }
}

impl EngineConfig {
    /// Set the worker count. Zero is raised to one.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Set the tile edge length in pixels.
    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    /// Set the view's zoom limits.
    pub fn with_zoom_limits(mut self, zoom_min: u8, zoom_max: u8) -> Self {
        self.zoom_min = zoom_min;
        self.zoom_max = zoom_max;
        self
    }

    /// Set the theme loaded at startup.
    pub fn with_default_theme(mut self, theme: ThemeId) -> Self {
        self.default_theme = theme;
        self
    }

    /// Set the parameters the initial sources open with.
    pub fn with_source_options(mut self, options: SourceOptions) -> Self {
        self.source_options = options;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();

        assert!(config.workers >= 1);
        assert_eq!(config.tile_size, DEFAULT_TILE_SIZE);
        assert_eq!(config.zoom_min, DEFAULT_ZOOM_MIN);
        assert_eq!(config.zoom_max, DEFAULT_ZOOM_MAX);
        assert_eq!(config.default_theme, ThemeId::builtin(DEFAULT_THEME));
        assert!(config.source_options.is_empty());
    }

    #[test]
    fn test_builders() {
        let config = EngineConfig::default()
            .with_workers(3)
            .with_tile_size(512)
            .with_zoom_limits(2, 15)
            .with_default_theme(ThemeId::builtin("midnight"));

        assert_eq!(config.workers, 3);
        assert_eq!(config.tile_size, 512);
        assert_eq!((config.zoom_min, config.zoom_max), (2, 15));
        assert_eq!(config.default_theme, ThemeId::builtin("midnight"));
    }

    #[test]
    fn test_zero_workers_raised_to_one() {
        let config = EngineConfig::default().with_workers(0);
        assert_eq!(config.workers, 1);
    }
}
