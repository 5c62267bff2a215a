//! Render theme abstraction layer.
//!
//! A render theme is the styling rule set tile generators apply to raw map
//! data. Themes are identified by a [`ThemeId`] and resolved through a
//! [`ThemeProvider`]; the engine distributes the resolved theme to every
//! worker while the pool is quiesced. Theme file parsing itself is out of
//! scope here: external providers hand the engine an already parsed
//! [`RenderTheme`].

mod builtin;

pub use builtin::{BuiltinThemeProvider, DEFAULT_THEME};

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while resolving a render theme.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ThemeError {
    /// The built-in theme name is not registered
    #[error("Unknown built-in theme '{0}'")]
    UnknownBuiltIn(String),

    /// An external theme file could not be loaded
    #[error("Failed to load theme from '{path}': {reason}")]
    LoadFailed { path: PathBuf, reason: String },
}

/// Identifies a render theme.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ThemeId {
    /// A theme bundled with the library, looked up by name
    BuiltIn(String),
    /// A theme loaded from an external file
    External(PathBuf),
}

impl ThemeId {
    /// Create a built-in theme id.
    pub fn builtin(name: &str) -> Self {
        Self::BuiltIn(name.to_string())
    }

    /// Parse an id from configuration text.
    ///
    /// Values that look like file paths become `External`, everything else
    /// is treated as a built-in name.
    pub fn parse(value: &str) -> Self {
        if value.contains(['/', '\\']) || value.ends_with(".xml") {
            Self::External(PathBuf::from(value))
        } else {
            Self::BuiltIn(value.to_string())
        }
    }
}

impl std::fmt::Display for ThemeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThemeId::BuiltIn(name) => f.write_str(name),
            ThemeId::External(path) => write!(f, "{}", path.display()),
        }
    }
}

/// An immutable, parsed render theme.
///
/// Once constructed a theme never changes; workers share one instance
/// through an `Arc` and swap the pointer only while quiesced.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTheme {
    name: String,
    background: [u8; 4],
    line_scale: f32,
}

impl RenderTheme {
    /// Create a theme with the given name and RGBA background color.
    pub fn new(name: &str, background: [u8; 4]) -> Self {
        Self {
            name: name.to_string(),
            background,
            line_scale: 1.0,
        }
    }

    /// Set the line width scale factor.
    pub fn with_line_scale(mut self, line_scale: f32) -> Self {
        self.line_scale = line_scale;
        self
    }

    /// The theme name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The RGBA map background color.
    pub fn background(&self) -> [u8; 4] {
        self.background
    }

    /// The line width scale factor.
    pub fn line_scale(&self) -> f32 {
        self.line_scale
    }
}

/// Trait for resolving theme ids into parsed themes.
pub trait ThemeProvider: Send + Sync {
    /// Resolves and loads the theme for the given id.
    fn load(&self, id: &ThemeId) -> Result<Arc<RenderTheme>, ThemeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_id_parse_builtin() {
        assert_eq!(ThemeId::parse("daylight"), ThemeId::builtin("daylight"));
    }

    #[test]
    fn test_theme_id_parse_path() {
        assert_eq!(
            ThemeId::parse("/themes/custom.xml"),
            ThemeId::External(PathBuf::from("/themes/custom.xml"))
        );
        assert_eq!(
            ThemeId::parse("custom.xml"),
            ThemeId::External(PathBuf::from("custom.xml"))
        );
    }

    #[test]
    fn test_theme_accessors() {
        let theme = RenderTheme::new("test", [10, 20, 30, 255]).with_line_scale(1.5);

        assert_eq!(theme.name(), "test");
        assert_eq!(theme.background(), [10, 20, 30, 255]);
        assert_eq!(theme.line_scale(), 1.5);
    }
}
