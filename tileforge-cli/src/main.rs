//! Tileforge CLI - Command-line interface
//!
//! This binary provides a command-line interface to the tileforge library.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use commands::render::RenderArgs;

#[derive(Parser)]
#[command(name = "tileforge")]
#[command(about = "Generate map tiles with a parallel worker pool", long_about = None)]
#[command(version = tileforge::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render the tiles covering a viewport to files
    Render(RenderArgs),
    /// List the built-in render themes
    Themes,
    /// Show the active configuration
    Config,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Render(args) => commands::render::run(args),
        Command::Themes => commands::themes::run(),
        Command::Config => commands::config::run(),
    };

    if let Err(e) = result {
        e.exit();
    }
}
