//! Styled, buffered console logging.
//!
//! tintlog renders records for the output it detects: truecolor or 16-color
//! ANSI in terminals, `%c` CSS in browser consoles, plain text when piped or
//! in CI. Every record is also kept in a bounded buffer that can be queried
//! and exported, and copied to any registered transports.
//!
//! # Example
//!
//! ```ignore
//! use tintlog::{Logger, LoggerConfig, Level, Value};
//!
//! let log = Logger::new(LoggerConfig::from_env());
//! let db = log.scope("db");
//! db.warn("slow query");
//! tintlog::error!(db, "connection lost after {} retries", 3; Value::from("pg-1"));
//!
//! let errors = log.query(&tintlog::LogFilter::new().errors_only());
//! ```
//!
//! # Crates
//!
//! - [`tintlog_core`]: records, argument values, serializers
//! - [`tintlog_console`]: color conversion, detection, rendering
//! - [`tintlog_buffer`]: buffer, filters, export formats
//! - [`tintlog_transport`]: batched HTTP and file transports

#![forbid(unsafe_code)]

pub mod config;
mod logger;
pub mod logging;
mod macros;

pub use config::{ConfigError, LoggerConfig};
pub use logger::{Handler, HandlerContext, HandlerId, Logger, LoggerBuilder, init_logger, logger};

pub use tintlog_buffer::{
    BufferStats, ExportError, ExportFormat, ExportOptions, FilterError, GroupBy, LevelCounts, LogBuffer,
    LogFilter, RetentionPolicy, TimeBound,
};
pub use tintlog_console::{
    ConsoleSink, Environment, NullConsole, OutputMode, OutputTarget, Part, PartStyle, Preset, Rendered,
    StaticEnvironment, StderrConsole, StyleBuilder, StyleConfig, Theme,
};
pub use tintlog_core::{
    CircularPolicy, ErrorValue, GroupInfo, Level, LogRecord, SerializeError, SerializerOptions,
    SerializerRegistry, SourceLocation, Value,
};
pub use tintlog_transport::{
    BatchConfig, FileConfig, FileTransport, HttpConfig, HttpTransport, Transport, TransportError,
    TransportManager, TransportOptions, TransportRecord,
};
