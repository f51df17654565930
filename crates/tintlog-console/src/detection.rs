//! Output target detection
//!
//! Determines which rendering strategy applies: styled browser console, ANSI
//! at full or reduced color depth, or plain text. Environment access goes
//! through the [`Environment`] trait so tests can pin every signal.

use std::io::IsTerminal;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::color::ColorCapability;

/// Configured output mode. Anything other than `Auto` skips detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    #[default]
    Auto,
    Browser,
    #[serde(alias = "full")]
    TrueColor,
    Basic,
    Plain,
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "browser" | "css" => Ok(Self::Browser),
            "truecolor" | "full" | "24bit" => Ok(Self::TrueColor),
            "basic" | "ansi" | "16" => Ok(Self::Basic),
            "plain" | "none" | "text" => Ok(Self::Plain),
            other => Err(format!("unknown output mode: {other}")),
        }
    }
}

/// Resolved rendering strategy for one logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputTarget {
    /// `%c` placeholders with parallel CSS strings.
    BrowserCss,
    /// ANSI escape codes at the given depth.
    Ansi(ColorCapability),
    /// No styling.
    Plain,
}

impl OutputTarget {
    /// Color depth used by color conversion for this target.
    #[must_use]
    pub fn capability(self) -> ColorCapability {
        match self {
            Self::Ansi(cap) => cap,
            Self::BrowserCss => ColorCapability::Full,
            Self::Plain => ColorCapability::None,
        }
    }

    /// Whether escape codes may appear in output.
    #[must_use]
    pub fn is_ansi(self) -> bool {
        matches!(self, Self::Ansi(cap) if cap != ColorCapability::None)
    }

    /// Resolve a configured mode against the environment.
    ///
    /// Explicit modes always win. `Auto` runs [`detect`].
    #[must_use]
    pub fn resolve(mode: OutputMode, env: &dyn Environment) -> Self {
        match mode {
            OutputMode::Auto => detect(env),
            OutputMode::Browser => Self::BrowserCss,
            OutputMode::TrueColor => Self::Ansi(ColorCapability::Full),
            OutputMode::Basic => Self::Ansi(ColorCapability::Basic),
            OutputMode::Plain => Self::Plain,
        }
    }
}

/// CI markers, checked in order.
const CI_MARKERS: &[&str] = &[
    "CI",
    "CONTINUOUS_INTEGRATION",
    "BUILD_NUMBER",
    "RUN_ID",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "BUILDKITE",
    "CIRCLECI",
    "TRAVIS",
    "JENKINS_URL",
    "TEAMCITY_VERSION",
];

/// CI vendors whose log viewers render ANSI colors.
const ANSI_CI_MARKERS: &[&str] = &["GITHUB_ACTIONS", "GITLAB_CI", "BUILDKITE"];

const PRODUCTION_MARKERS: &[&str] = &["TINTLOG_ENV", "APP_ENV", "RUST_ENV"];

const TRUECOLOR_PROGRAMS: &[&str] = &["iTerm.app", "WezTerm", "vscode", "ghostty"];

/// Source of the signals detection reads.
pub trait Environment: Send + Sync {
    /// Value of an environment variable.
    fn var(&self, key: &str) -> Option<String>;

    /// Whether the log stream is an interactive terminal.
    fn is_terminal(&self) -> bool;

    /// Whether the host is a browser-like console that understands `%c`.
    fn is_browser(&self) -> bool;

    fn has(&self, key: &str) -> bool {
        self.var(key).is_some()
    }

    /// Whether any CI marker is set.
    fn is_ci(&self) -> bool {
        CI_MARKERS
            .iter()
            .any(|key| self.var(key).is_some_and(|v| v != "false" && v != "0"))
    }

    /// Whether a production marker says `production` or `prod`.
    fn is_production(&self) -> bool {
        PRODUCTION_MARKERS.iter().any(|key| {
            self.var(key)
                .is_some_and(|v| matches!(v.to_lowercase().as_str(), "production" | "prod"))
        })
    }

    /// Color depth suggested by terminal hints alone.
    fn color_hint(&self) -> ColorCapability {
        if self
            .var("COLORTERM")
            .is_some_and(|v| matches!(v.to_lowercase().as_str(), "truecolor" | "24bit"))
        {
            return ColorCapability::Full;
        }
        if self
            .var("TERM_PROGRAM")
            .is_some_and(|v| TRUECOLOR_PROGRAMS.contains(&v.as_str()))
        {
            return ColorCapability::Full;
        }
        ColorCapability::Basic
    }
}

/// Auto-detect the output target.
#[must_use]
pub fn detect(env: &dyn Environment) -> OutputTarget {
    if env.is_browser() {
        return OutputTarget::BrowserCss;
    }

    // Explicit disable always wins over force
    if env.has("NO_COLOR") || env.has("TINTLOG_PLAIN") {
        return OutputTarget::Plain;
    }

    if let Some(forced) = env.var("FORCE_COLOR").or_else(|| env.var("TINTLOG_FORCE_COLOR")) {
        return match forced.trim() {
            "0" | "false" => OutputTarget::Plain,
            "1" => OutputTarget::Ansi(ColorCapability::Basic),
            _ => OutputTarget::Ansi(ColorCapability::Full),
        };
    }

    if env.is_ci() {
        return if ANSI_CI_MARKERS.iter().any(|key| env.has(key)) {
            OutputTarget::Ansi(ColorCapability::Basic)
        } else {
            OutputTarget::Plain
        };
    }

    if !env.is_terminal() {
        return OutputTarget::Plain;
    }

    if env.var("TERM").is_some_and(|t| t == "dumb") {
        return OutputTarget::Plain;
    }

    OutputTarget::Ansi(env.color_hint())
}

/// The real process environment; terminal status is read from stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn is_terminal(&self) -> bool {
        std::io::stderr().is_terminal()
    }

    fn is_browser(&self) -> bool {
        cfg!(all(target_arch = "wasm32", target_os = "unknown"))
    }
}

/// A fixed environment for tests.
///
/// ```
/// use tintlog_console::detection::{detect, OutputTarget, StaticEnvironment};
///
/// let env = StaticEnvironment::new().terminal(true).with_var("NO_COLOR", "1");
/// assert_eq!(detect(&env), OutputTarget::Plain);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticEnvironment {
    vars: Vec<(String, String)>,
    terminal: bool,
    browser: bool,
}

impl StaticEnvironment {
    /// An empty, non-interactive environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interactive terminal with truecolor hints.
    #[must_use]
    pub fn truecolor_terminal() -> Self {
        Self::new().terminal(true).with_var("COLORTERM", "truecolor")
    }

    #[must_use]
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        self.vars.retain(|(k, _)| *k != key);
        self.vars.push((key, value.into()));
        self
    }

    #[must_use]
    pub fn terminal(mut self, terminal: bool) -> Self {
        self.terminal = terminal;
        self
    }

    #[must_use]
    pub fn browser(mut self, browser: bool) -> Self {
        self.browser = browser;
        self
    }
}

impl Environment for StaticEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        self.vars
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    fn is_terminal(&self) -> bool {
        self.terminal
    }

    fn is_browser(&self) -> bool {
        self.browser
    }
}
