//! Built-in render themes.

use super::{RenderTheme, ThemeError, ThemeId, ThemeProvider};
use std::collections::HashMap;
use std::sync::Arc;

/// Name of the default built-in theme.
pub const DEFAULT_THEME: &str = "daylight";

/// Theme provider serving the themes bundled with the library.
///
/// External theme files are not handled here; pass a custom
/// [`ThemeProvider`] to the engine to support them.
pub struct BuiltinThemeProvider {
    themes: HashMap<String, Arc<RenderTheme>>,
}

impl BuiltinThemeProvider {
    /// Create a provider with the standard theme set.
    pub fn new() -> Self {
        let mut themes = HashMap::new();
        themes.insert(
            DEFAULT_THEME.to_string(),
            Arc::new(RenderTheme::new(DEFAULT_THEME, [239, 235, 224, 255])),
        );
        themes.insert(
            "midnight".to_string(),
            Arc::new(RenderTheme::new("midnight", [28, 31, 38, 255]).with_line_scale(1.2)),
        );
        Self { themes }
    }

    /// Names of all registered themes, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.themes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for BuiltinThemeProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ThemeProvider for BuiltinThemeProvider {
    fn load(&self, id: &ThemeId) -> Result<Arc<RenderTheme>, ThemeError> {
        match id {
            ThemeId::BuiltIn(name) => self
                .themes
                .get(name)
                .cloned()
                .ok_or_else(|| ThemeError::UnknownBuiltIn(name.clone())),
            ThemeId::External(path) => Err(ThemeError::LoadFailed {
                path: path.clone(),
                reason: "external theme files are not supported by the built-in provider"
                    .to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_loads_default_theme() {
        let provider = BuiltinThemeProvider::new();
        let theme = provider.load(&ThemeId::builtin(DEFAULT_THEME)).unwrap();

        assert_eq!(theme.name(), DEFAULT_THEME);
    }

    #[test]
    fn test_unknown_name_errors() {
        let provider = BuiltinThemeProvider::new();
        let result = provider.load(&ThemeId::builtin("sepia"));

        assert_eq!(result.unwrap_err(), ThemeError::UnknownBuiltIn("sepia".to_string()));
    }

    #[test]
    fn test_external_ids_rejected() {
        let provider = BuiltinThemeProvider::new();
        let result = provider.load(&ThemeId::External(PathBuf::from("theme.xml")));

        assert!(matches!(result, Err(ThemeError::LoadFailed { .. })));
    }

    #[test]
    fn test_names_sorted() {
        let provider = BuiltinThemeProvider::new();
        assert_eq!(provider.names(), vec!["daylight", "midnight"]);
    }
}
