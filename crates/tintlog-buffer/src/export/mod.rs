//! Export formatter
//!
//! Turns a filtered record set into one of five text formats. Every format
//! produces well-formed output for an empty record set.

mod csv;
mod html;
mod json;
mod markdown;
mod plain;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use tintlog_console::Theme;
use tintlog_core::{LogRecord, SerializerOptions, SerializerRegistry};

use crate::error::ExportError;

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Json,
    Csv,
    Markdown,
    Plain,
    Html,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 5] = [
        ExportFormat::Json,
        ExportFormat::Csv,
        ExportFormat::Markdown,
        ExportFormat::Plain,
        ExportFormat::Html,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Markdown => "markdown",
            Self::Plain => "plain",
            Self::Html => "html",
        }
    }

    /// Conventional file extension.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Markdown => "md",
            Self::Plain => "txt",
            Self::Html => "html",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "markdown" | "md" => Ok(Self::Markdown),
            "plain" | "text" | "txt" => Ok(Self::Plain),
            "html" => Ok(Self::Html),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Grouping for formats that support sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Level,
    /// One section per full prefix; unprefixed records go under `(none)`.
    Prefix,
}

impl FromStr for GroupBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "level" => Ok(Self::Level),
            "prefix" | "scope" => Ok(Self::Prefix),
            other => Err(format!("unknown grouping: {other}")),
        }
    }
}

/// Output shaping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Drop arguments, location and group metadata.
    pub minimal: bool,
    /// No formatting whitespace (JSON).
    pub compact: bool,
    pub group_by: Option<GroupBy>,
    /// Level colors or icons where the format allows.
    pub styled: bool,
    /// Markdown summary block.
    pub summary: bool,
    pub serializer: SerializerOptions,
    /// Palette for styled output. `None` uses the default theme.
    pub theme: Option<Theme>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            minimal: false,
            compact: false,
            group_by: None,
            styled: false,
            summary: true,
            serializer: SerializerOptions::default(),
            theme: None,
        }
    }
}

impl ExportOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn minimal(mut self, minimal: bool) -> Self {
        self.minimal = minimal;
        self
    }

    pub fn compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    pub fn group_by(mut self, group_by: GroupBy) -> Self {
        self.group_by = Some(group_by);
        self
    }

    pub fn styled(mut self, styled: bool) -> Self {
        self.styled = styled;
        self
    }

    pub fn summary(mut self, summary: bool) -> Self {
        self.summary = summary;
        self
    }

    pub fn serializer(mut self, options: SerializerOptions) -> Self {
        self.serializer = options;
        self
    }

    pub fn theme(mut self, theme: Theme) -> Self {
        self.theme = Some(theme);
        self
    }
}

/// Export records with the built-in serializers.
pub fn export(
    records: &[Arc<LogRecord>],
    format: ExportFormat,
    options: &ExportOptions,
) -> Result<String, ExportError> {
    export_with(records, format, options, &SerializerRegistry::new())
}

/// Export records, serializing arguments through `registry`.
pub fn export_with(
    records: &[Arc<LogRecord>],
    format: ExportFormat,
    options: &ExportOptions,
    registry: &SerializerRegistry,
) -> Result<String, ExportError> {
    let fallback;
    let theme = match &options.theme {
        Some(theme) => theme,
        None => {
            fallback = Theme::default();
            &fallback
        }
    };
    let ctx = Exporter {
        options,
        registry,
        theme,
    };
    match format {
        ExportFormat::Json => json::render(records, &ctx),
        ExportFormat::Csv => csv::render(records, &ctx),
        ExportFormat::Markdown => Ok(markdown::render(records, &ctx)),
        ExportFormat::Plain => Ok(plain::render(records, &ctx)),
        ExportFormat::Html => Ok(html::render(records, &ctx)),
    }
}

/// Shared state for one export call.
pub(crate) struct Exporter<'a> {
    pub options: &'a ExportOptions,
    pub registry: &'a SerializerRegistry,
    pub theme: &'a Theme,
}

impl Exporter<'_> {
    fn args_json(&self, record: &LogRecord) -> Result<serde_json::Value, ExportError> {
        let args = self
            .registry
            .serialize_args(&record.args, &self.options.serializer)?;
        Ok(serde_json::Value::Array(args))
    }
}

/// Export timestamps are UTC RFC 3339 with milliseconds.
pub(crate) fn timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
