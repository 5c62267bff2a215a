//! Themes command - list the built-in render themes.

use tileforge::theme::{BuiltinThemeProvider, DEFAULT_THEME};

use crate::error::CliError;

/// Run the themes command.
pub fn run() -> Result<(), CliError> {
    let provider = BuiltinThemeProvider::new();

    println!("Built-in render themes:");
    for name in provider.names() {
        if name == DEFAULT_THEME {
            println!("  {} (default)", name);
        } else {
            println!("  {}", name);
        }
    }
    Ok(())
}
