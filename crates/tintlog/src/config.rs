//! Logger configuration.
//!
//! `LoggerConfig` can be built programmatically, read from `TINTLOG_*`
//! environment variables, or loaded from a TOML file.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tintlog_buffer::{DEFAULT_CAPACITY, clamp_capacity};
use tintlog_console::{Environment, OutputMode, Part, Preset, ProcessEnvironment, RenderSettings, StyleConfig, Theme};
use tintlog_core::logging::targets;
use tintlog_core::{Level, SerializerOptions};

/// Errors from loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    Io { path: PathBuf, source: std::io::Error },
    /// The configuration file is not valid TOML or has bad values.
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "cannot read {}: {source}", path.display()),
            Self::Parse(e) => write!(f, "invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(e) => Some(e),
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        Self::Parse(err)
    }
}

/// Configuration for a [`crate::Logger`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggerConfig {
    /// Records below this level are discarded.
    pub level: Level,
    /// Output mode; `auto` runs capability detection.
    pub mode: OutputMode,
    /// Built-in theme name. Unknown names use `default`.
    pub theme: String,
    pub preset: Option<Preset>,
    /// Keep emitted records in memory for querying and export.
    pub buffer: bool,
    /// Clamped to the supported range when applied.
    pub buffer_size: usize,
    pub timestamps: bool,
    /// Show the call site on console lines.
    pub location: bool,
    /// chrono format string for console timestamps.
    pub timestamp_format: Option<String>,
    /// Nesting limit for argument serialization.
    pub max_depth: usize,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: Level::Debug,
            mode: OutputMode::Auto,
            theme: "default".to_string(),
            preset: None,
            buffer: true,
            buffer_size: DEFAULT_CAPACITY,
            timestamps: true,
            location: false,
            timestamp_format: None,
            max_depth: SerializerOptions::default().max_depth,
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn ignored(key: &str, value: &str) {
    log::warn!(target: targets::TINTLOG, "ignoring {key}={value:?}: unrecognized value");
}

impl LoggerConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Production defaults: warnings and above, terse lines.
    #[must_use]
    pub fn production() -> Self {
        Self {
            level: Level::Warn,
            preset: Some(Preset::Production),
            location: false,
            ..Self::default()
        }
    }

    /// Create config from process environment variables.
    ///
    /// # Environment Variables
    ///
    /// | Variable | Values | Description |
    /// |----------|--------|-------------|
    /// | `TINTLOG_LEVEL` | debug/info/warn/error/critical | Minimum level |
    /// | `TINTLOG_MODE` | auto/browser/truecolor/basic/plain | Output mode |
    /// | `TINTLOG_THEME` | default/dark/light/dracula/monokai | Theme |
    /// | `TINTLOG_PRESET` | neon/production/debug/glass | Preset |
    /// | `TINTLOG_BUFFER` | 0/1 | Keep records in memory |
    /// | `TINTLOG_BUFFER_SIZE` | integer | Buffer capacity |
    /// | `TINTLOG_TIMESTAMPS` | 0/1 | Show timestamps |
    /// | `TINTLOG_LOCATION` | 0/1 | Show call sites |
    ///
    /// When `TINTLOG_ENV`, `APP_ENV` or `RUST_ENV` is `production`, the
    /// starting point is [`LoggerConfig::production`].
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_environment(&ProcessEnvironment)
    }

    /// Like [`LoggerConfig::from_env`], reading from `env`.
    #[must_use]
    pub fn from_environment(env: &dyn Environment) -> Self {
        let mut config = if env.is_production() {
            Self::production()
        } else {
            Self::default()
        };

        if let Some(value) = env.var("TINTLOG_LEVEL") {
            match value.parse() {
                Ok(level) => config.level = level,
                Err(_) => ignored("TINTLOG_LEVEL", &value),
            }
        }
        if let Some(value) = env.var("TINTLOG_MODE") {
            match value.parse() {
                Ok(mode) => config.mode = mode,
                Err(_) => ignored("TINTLOG_MODE", &value),
            }
        }
        if let Some(value) = env.var("TINTLOG_THEME") {
            if Theme::builtin(&value).is_some() {
                config.theme = value.trim().to_lowercase();
            } else {
                ignored("TINTLOG_THEME", &value);
            }
        }
        if let Some(value) = env.var("TINTLOG_PRESET") {
            if matches!(value.trim().to_lowercase().as_str(), "" | "none") {
                config.preset = None;
            } else {
                match value.parse() {
                    Ok(preset) => config.preset = Some(preset),
                    Err(_) => ignored("TINTLOG_PRESET", &value),
                }
            }
        }
        if let Some(value) = env.var("TINTLOG_BUFFER") {
            match parse_flag(&value) {
                Some(on) => config.buffer = on,
                None => ignored("TINTLOG_BUFFER", &value),
            }
        }
        if let Some(value) = env.var("TINTLOG_BUFFER_SIZE") {
            match value.trim().parse::<usize>() {
                Ok(size) => config.buffer_size = clamp_capacity(size),
                Err(_) => ignored("TINTLOG_BUFFER_SIZE", &value),
            }
        }
        if let Some(value) = env.var("TINTLOG_TIMESTAMPS") {
            match parse_flag(&value) {
                Some(on) => config.timestamps = on,
                None => ignored("TINTLOG_TIMESTAMPS", &value),
            }
        }
        if let Some(value) = env.var("TINTLOG_LOCATION") {
            match parse_flag(&value) {
                Some(on) => config.location = on,
                None => ignored("TINTLOG_LOCATION", &value),
            }
        }
        config
    }

    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(text)?;
        config.buffer_size = clamp_capacity(config.buffer_size);
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// `<config dir>/tintlog/config.toml`, if the platform has a config dir.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tintlog").join("config.toml"))
    }

    /// Load the user config file when present, otherwise the environment.
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.is_file() => Self::from_file(path),
            _ => Ok(Self::from_env()),
        }
    }

    #[must_use]
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = theme.into();
        self
    }

    #[must_use]
    pub fn preset(mut self, preset: Option<Preset>) -> Self {
        self.preset = preset;
        self
    }

    #[must_use]
    pub fn buffer(mut self, enabled: bool) -> Self {
        self.buffer = enabled;
        self
    }

    #[must_use]
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = clamp_capacity(size);
        self
    }

    #[must_use]
    pub fn timestamps(mut self, show: bool) -> Self {
        self.timestamps = show;
        self
    }

    #[must_use]
    pub fn location(mut self, show: bool) -> Self {
        self.location = show;
        self
    }

    #[must_use]
    pub fn timestamp_format(mut self, format: impl Into<String>) -> Self {
        self.timestamp_format = Some(format.into());
        self
    }

    #[must_use]
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub(crate) fn render_settings(&self) -> RenderSettings {
        let mut style = StyleConfig::default()
            .show(Part::Timestamp, self.timestamps)
            .show(Part::Location, self.location);
        if let Some(format) = &self.timestamp_format {
            style = style.with_timestamp_format(format.clone());
        }
        RenderSettings {
            style,
            theme: Theme::by_name(&self.theme),
            preset: self.preset,
        }
    }

    pub(crate) fn serializer_options(&self) -> SerializerOptions {
        SerializerOptions::default().with_max_depth(self.max_depth)
    }
}
