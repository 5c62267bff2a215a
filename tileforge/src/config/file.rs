//! Configuration file handling for ~/.tileforge/config.ini.
//!
//! Loads engine settings with sensible defaults. A missing file is not an
//! error; every key is optional and overlays [`EngineConfig::default`].

use super::EngineConfig;
use crate::coord;
use crate::source::SourceOptions;
use crate::theme::ThemeId;
use ini::Ini;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    Read(#[from] ini::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

impl EngineConfig {
    /// Load configuration from the default path (~/.tileforge/config.ini).
    ///
    /// Returns defaults if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// Returns defaults if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        parse_ini(&ini)
    }
}

/// Parse an `Ini` object into an `EngineConfig`.
///
/// Starts from `EngineConfig::default()` and overlays any values found.
fn parse_ini(ini: &Ini) -> Result<EngineConfig, ConfigError> {
    let mut config = EngineConfig::default();

    // [engine] section
    if let Some(section) = ini.section(Some("engine")) {
        if let Some(v) = section.get("workers") {
            let workers: usize =
                parse_value("engine", "workers", v, "must be a positive integer")?;
            if workers == 0 {
                return Err(invalid("engine", "workers", v, "must be a positive integer"));
            }
            config.workers = workers;
        }
        if let Some(v) = section.get("tile_size") {
            let tile_size: u32 = parse_value(
                "engine",
                "tile_size",
                v,
                "must be a positive integer (pixels)",
            )?;
            if tile_size == 0 {
                return Err(invalid(
                    "engine",
                    "tile_size",
                    v,
                    "must be a positive integer (pixels)",
                ));
            }
            config.tile_size = tile_size;
        }
    }

    // [view] section
    if let Some(section) = ini.section(Some("view")) {
        if let Some(v) = section.get("zoom_min") {
            config.zoom_min = parse_value("view", "zoom_min", v, "must be an integer zoom level")?;
        }
        if let Some(v) = section.get("zoom_max") {
            let zoom_max: u8 =
                parse_value("view", "zoom_max", v, "must be an integer zoom level")?;
            if zoom_max > coord::MAX_ZOOM {
                return Err(invalid(
                    "view",
                    "zoom_max",
                    v,
                    &format!("must be at most {}", coord::MAX_ZOOM),
                ));
            }
            config.zoom_max = zoom_max;
        }
        if config.zoom_min > config.zoom_max {
            return Err(invalid(
                "view",
                "zoom_min",
                &config.zoom_min.to_string(),
                "must not exceed zoom_max",
            ));
        }
    }

    // [theme] section
    if let Some(section) = ini.section(Some("theme")) {
        if let Some(v) = section.get("default") {
            let v = v.trim();
            if !v.is_empty() {
                config.default_theme = ThemeId::parse(v);
            }
        }
    }

    // [source] section: passed through untouched to the source implementation
    if let Some(section) = ini.section(Some("source")) {
        let mut options = SourceOptions::new();
        for (key, value) in section.iter() {
            options.set(key, value);
        }
        config.source_options = options;
    }

    Ok(config)
}

fn parse_value<T: FromStr>(
    section: &str,
    key: &str,
    value: &str,
    reason: &str,
) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(section, key, value, reason))
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Get the path to the config directory (~/.tileforge).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tileforge")
}

/// Get the path to the config file (~/.tileforge/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
