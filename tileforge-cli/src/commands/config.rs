//! Config command - show the active configuration.

use tileforge::config::{config_file_path, EngineConfig};

use crate::error::CliError;

/// Run the config command.
pub fn run() -> Result<(), CliError> {
    let path = config_file_path();
    let config = EngineConfig::load()?;

    println!("Config file: {}", path.display());
    if !path.exists() {
        println!("  (not present, using defaults)");
    }
    println!();
    println!("[engine]");
    println!("workers = {}", config.workers);
    println!("tile_size = {}", config.tile_size);
    println!();
    println!("[view]");
    println!("zoom_min = {}", config.zoom_min);
    println!("zoom_max = {}", config.zoom_max);
    println!();
    println!("[theme]");
    println!("default = {}", config.default_theme);

    if !config.source_options.is_empty() {
        let mut params: Vec<(&str, &str)> = config.source_options.iter().collect();
        params.sort();
        println!();
        println!("[source]");
        for (key, value) in params {
            println!("{} = {}", key, value);
        }
    }
    Ok(())
}
