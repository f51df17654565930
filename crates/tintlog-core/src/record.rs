//! The log record: one structured entry per logging call.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Severity of a log record.
///
/// Levels are totally ordered: `Debug < Info < Warn < Error < Critical`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// Diagnostic detail for development.
    Debug,
    /// Normal operational messages.
    Info,
    /// Recoverable problems.
    Warn,
    /// Failed operations.
    Error,
    /// Failures that need immediate attention.
    Critical,
}

impl Level {
    /// All levels in ascending order.
    pub const ALL: [Level; 5] = [
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Critical,
    ];

    /// Lowercase name (`"warn"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }

    /// Uppercase badge label (`"WARN"`).
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }

    /// Whether this level counts as an error (`error` or `critical`).
    #[must_use]
    pub const fn is_error(self) -> bool {
        matches!(self, Self::Error | Self::Critical)
    }

    /// Parse a level name, falling back to `Info` for anything unknown.
    #[must_use]
    pub fn from_str_lossy(s: &str) -> Self {
        s.parse().unwrap_or(Self::Info)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a level name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLevelError(pub String);

impl fmt::Display for ParseLevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown log level: {}", self.0)
    }
}

impl std::error::Error for ParseLevelError {}

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "debug" | "trace" => Ok(Self::Debug),
            "info" | "log" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "critical" | "fatal" => Ok(Self::Critical),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Self::Error,
            log::Level::Warn => Self::Warn,
            log::Level::Info => Self::Info,
            log::Level::Debug | log::Level::Trace => Self::Debug,
        }
    }
}

/// Process-unique record identifier.
///
/// Used for rendering keys and de-duplication, never for ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

static NEXT_RECORD_ID: AtomicU64 = AtomicU64::new(1);

impl RecordId {
    /// Allocate the next identifier.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_RECORD_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "log-{}", self.0)
    }
}

/// Where a logging call was made.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
}

impl SourceLocation {
    #[must_use]
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
            function: None,
        }
    }

    #[must_use]
    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Console group nesting at the time of the call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInfo {
    pub depth: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// One structured logging call.
///
/// Records are built with [`LogRecord::new`] and the `with_*` methods, then
/// frozen behind an `Arc` when emitted. Nothing mutates a stored record.
#[derive(Clone, Debug)]
pub struct LogRecord {
    pub id: RecordId,
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub message: String,
    /// Positional arguments, excluding the message.
    pub args: Vec<Value>,
    pub prefix: Option<String>,
    pub location: Option<SourceLocation>,
    pub group: Option<GroupInfo>,
}

impl LogRecord {
    /// Create a record stamped with a fresh id and the current time.
    #[must_use]
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            id: RecordId::next(),
            timestamp: Utc::now(),
            level,
            message: message.into(),
            args: Vec::new(),
            prefix: None,
            location: None,
            group: None,
        }
    }

    #[must_use]
    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = args;
        self
    }

    #[must_use]
    pub fn with_arg(mut self, arg: impl Into<Value>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    #[must_use]
    pub fn with_group(mut self, group: GroupInfo) -> Self {
        self.group = Some(group);
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Message followed by the inspected arguments, space separated.
    ///
    /// This is the text free-text search runs against.
    #[must_use]
    pub fn searchable_text(&self) -> String {
        let mut out = self.message.clone();
        for arg in &self.args {
            out.push(' ');
            out.push_str(&arg.inspect());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_ordering() {
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
        assert!(Level::Error < Level::Critical);
    }

    #[test]
    fn level_is_error() {
        assert!(!Level::Warn.is_error());
        assert!(Level::Error.is_error());
        assert!(Level::Critical.is_error());
    }

    #[test]
    fn level_parse() {
        assert_eq!("WARNING".parse::<Level>(), Ok(Level::Warn));
        assert_eq!("fatal".parse::<Level>(), Ok(Level::Critical));
        assert!("loud".parse::<Level>().is_err());
        assert_eq!(Level::from_str_lossy("loud"), Level::Info);
    }

    #[test]
    fn level_serde() {
        assert_eq!(serde_json::to_string(&Level::Critical).unwrap(), "\"critical\"");
        let back: Level = serde_json::from_str("\"warn\"").unwrap();
        assert_eq!(back, Level::Warn);
    }

    #[test]
    fn level_from_log_crate() {
        assert_eq!(Level::from(log::Level::Trace), Level::Debug);
        assert_eq!(Level::from(log::Level::Error), Level::Error);
    }

    #[test]
    fn record_ids_are_unique() {
        let a = LogRecord::new(Level::Info, "a");
        let b = LogRecord::new(Level::Info, "b");
        assert_ne!(a.id, b.id);
        assert!(a.id.to_string().starts_with("log-"));
    }

    #[test]
    fn location_display() {
        let loc = SourceLocation::new("src/main.rs", 10, 5).with_function("main");
        assert_eq!(loc.to_string(), "src/main.rs:10:5");
        assert_eq!(loc.function.as_deref(), Some("main"));
    }

    #[test]
    fn searchable_text_includes_args() {
        let record = LogRecord::new(Level::Info, "user login")
            .with_arg("alice")
            .with_arg(42);
        let text = record.searchable_text();
        assert!(text.contains("user login"));
        assert!(text.contains("alice"));
        assert!(text.contains("42"));
    }
}
