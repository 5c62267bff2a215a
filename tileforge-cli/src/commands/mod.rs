//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`render`] - Render the tiles covering a viewport to files
//! - [`themes`] - List the built-in render themes
//! - [`config`] - Show the active configuration

pub mod config;
pub mod render;
pub mod themes;
