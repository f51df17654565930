//! Level color themes.
//!
//! A theme is plain data owned by whoever renders with it. Loggers carry their
//! own theme, so switching themes on one logger never affects another.

use tintlog_core::Level;

/// Styling for one level.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LevelStyle {
    /// Text color for the message and badge foreground accents.
    pub color: String,
    /// Badge background.
    pub background: String,
    /// Short glyph shown by icon-bearing presets.
    pub icon: String,
}

impl LevelStyle {
    #[must_use]
    pub fn new(color: &str, background: &str, icon: &str) -> Self {
        Self {
            color: color.to_string(),
            background: background.to_string(),
            icon: icon.to_string(),
        }
    }
}

/// One [`LevelStyle`] per level.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LevelPalette {
    pub debug: LevelStyle,
    pub info: LevelStyle,
    pub warn: LevelStyle,
    pub error: LevelStyle,
    pub critical: LevelStyle,
}

impl LevelPalette {
    #[must_use]
    pub fn get(&self, level: Level) -> &LevelStyle {
        match level {
            Level::Debug => &self.debug,
            Level::Info => &self.info,
            Level::Warn => &self.warn,
            Level::Error => &self.error,
            Level::Critical => &self.critical,
        }
    }
}

/// A named palette.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Theme {
    pub name: String,
    pub levels: LevelPalette,
    /// Color for timestamps and locations.
    pub muted: String,
    /// Prefix badge background.
    pub accent: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self::default_theme()
    }
}

impl Theme {
    /// Built-in theme names.
    pub const NAMES: [&'static str; 5] = ["default", "dark", "light", "dracula", "monokai"];

    /// Look up a built-in theme, falling back to `default`.
    #[must_use]
    pub fn by_name(name: &str) -> Self {
        Self::builtin(name).unwrap_or_default()
    }

    /// Look up a built-in theme by exact (case-insensitive) name.
    #[must_use]
    pub fn builtin(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "default" => Some(Self::default_theme()),
            "dark" => Some(Self::dark()),
            "light" => Some(Self::light()),
            "dracula" => Some(Self::dracula()),
            "monokai" => Some(Self::monokai()),
            _ => None,
        }
    }

    #[must_use]
    pub fn style(&self, level: Level) -> &LevelStyle {
        self.levels.get(level)
    }

    fn default_theme() -> Self {
        Self {
            name: "default".into(),
            levels: LevelPalette {
                debug: LevelStyle::new("#8b949e", "#30363d", "🔍"),
                info: LevelStyle::new("#3b82f6", "#dbeafe", "ℹ"),
                warn: LevelStyle::new("#f59e0b", "#fef3c7", "⚠"),
                error: LevelStyle::new("#ef4444", "#fee2e2", "✖"),
                critical: LevelStyle::new("#ffffff", "#b91c1c", "🔥"),
            },
            muted: "#6b7280".into(),
            accent: "#7c3aed".into(),
        }
    }

    fn dark() -> Self {
        Self {
            name: "dark".into(),
            levels: LevelPalette {
                debug: LevelStyle::new("#9ca3af", "#1f2937", "🔍"),
                info: LevelStyle::new("#60a5fa", "#1e3a8a", "ℹ"),
                warn: LevelStyle::new("#fbbf24", "#78350f", "⚠"),
                error: LevelStyle::new("#f87171", "#7f1d1d", "✖"),
                critical: LevelStyle::new("#fecaca", "#991b1b", "🔥"),
            },
            muted: "#4b5563".into(),
            accent: "#a78bfa".into(),
        }
    }

    fn light() -> Self {
        Self {
            name: "light".into(),
            levels: LevelPalette {
                debug: LevelStyle::new("#4b5563", "#f3f4f6", "🔍"),
                info: LevelStyle::new("#1d4ed8", "#eff6ff", "ℹ"),
                warn: LevelStyle::new("#b45309", "#fffbeb", "⚠"),
                error: LevelStyle::new("#b91c1c", "#fef2f2", "✖"),
                critical: LevelStyle::new("#7f1d1d", "#fecaca", "🔥"),
            },
            muted: "#9ca3af".into(),
            accent: "#6d28d9".into(),
        }
    }

    fn dracula() -> Self {
        Self {
            name: "dracula".into(),
            levels: LevelPalette {
                debug: LevelStyle::new("#6272a4", "#282a36", "🔍"),
                info: LevelStyle::new("#8be9fd", "#282a36", "ℹ"),
                warn: LevelStyle::new("#f1fa8c", "#44475a", "⚠"),
                error: LevelStyle::new("#ff5555", "#44475a", "✖"),
                critical: LevelStyle::new("#ff79c6", "#282a36", "🔥"),
            },
            muted: "#6272a4".into(),
            accent: "#bd93f9".into(),
        }
    }

    fn monokai() -> Self {
        Self {
            name: "monokai".into(),
            levels: LevelPalette {
                debug: LevelStyle::new("#75715e", "#272822", "🔍"),
                info: LevelStyle::new("#66d9ef", "#272822", "ℹ"),
                warn: LevelStyle::new("#e6db74", "#3e3d32", "⚠"),
                error: LevelStyle::new("#f92672", "#3e3d32", "✖"),
                critical: LevelStyle::new("#fd971f", "#49483e", "🔥"),
            },
            muted: "#75715e".into(),
            accent: "#ae81ff".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_builtin_names_resolve() {
        for name in Theme::NAMES {
            let theme = Theme::builtin(name).expect("builtin theme");
            assert_eq!(theme.name, name);
        }
    }

    #[test]
    fn test_unknown_theme_falls_back_to_default() {
        assert_eq!(Theme::by_name("solarized").name, "default");
        assert!(Theme::builtin("solarized").is_none());
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(Theme::by_name("Dracula").name, "dracula");
    }

    #[test]
    fn test_level_styles_differ_per_level() {
        let theme = Theme::default();
        assert_ne!(theme.style(Level::Info), theme.style(Level::Error));
        assert_eq!(theme.style(Level::Warn).icon, "⚠");
    }
}
