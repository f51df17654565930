//! `log` crate integration.
//!
//! ```ignore
//! use tintlog::logging::TintLogger;
//!
//! TintLogger::new(tintlog::logger().clone())
//!     .with_targets(true)
//!     .init(log::LevelFilter::Info)?;
//! ```

use log::{LevelFilter, Log, Metadata, Record};
use tintlog_core::{Level, SourceLocation};
use tintlog_core::logging::is_internal_target;

use crate::Logger;

/// Forwards `log` records into a [`Logger`].
#[derive(Debug, Clone)]
pub struct TintLogger {
    logger: Logger,
    max_level: LevelFilter,
    show_targets: bool,
}

impl TintLogger {
    #[must_use]
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            max_level: LevelFilter::Trace,
            show_targets: false,
        }
    }

    /// Use the `log` target as a scope prefix.
    #[must_use]
    pub fn with_targets(mut self, show: bool) -> Self {
        self.show_targets = show;
        self
    }

    #[must_use]
    pub fn with_max_level(mut self, level: LevelFilter) -> Self {
        self.max_level = level;
        self
    }

    /// Install as the global `log` logger.
    ///
    /// Returns an error if a logger has already been set.
    pub fn init(self, max_level: LevelFilter) -> Result<(), log::SetLoggerError> {
        let logger = Box::new(self.with_max_level(max_level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(max_level);
        Ok(())
    }
}

impl Log for TintLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
            && !is_internal_target(metadata.target())
            && self.logger.enabled(Level::from(metadata.level()))
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let level = Level::from(record.level());
        let message = record.args().to_string();
        let scoped;
        let logger = if self.show_targets {
            scoped = self.logger.scope(record.target());
            &scoped
        } else {
            &self.logger
        };
        match (record.file(), record.line()) {
            // `log` has no column information.
            (Some(file), Some(line)) => {
                let mut location = SourceLocation::new(file, line, 0);
                if let Some(module) = record.module_path() {
                    location = location.with_function(module);
                }
                logger.log_at(level, message, Vec::new(), location);
            }
            _ => {
                logger.log(level, message, Vec::new());
            }
        }
    }

    fn flush(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tintlog_console::testing::TestConsole;
    use tintlog_console::{OutputMode, StaticEnvironment};

    use crate::LoggerConfig;

    fn logger() -> Logger {
        Logger::builder(LoggerConfig::new().mode(OutputMode::Plain).timestamps(false))
            .console(Arc::new(TestConsole::new()))
            .environment(Arc::new(StaticEnvironment::new()))
            .build()
    }

    fn metadata(level: log::Level, target: &str) -> Metadata<'_> {
        Metadata::builder().level(level).target(target).build()
    }

    #[test]
    fn test_internal_targets_skipped() {
        let bridge = TintLogger::new(logger());
        assert!(bridge.enabled(&metadata(log::Level::Warn, "app")));
        assert!(!bridge.enabled(&metadata(log::Level::Warn, "tintlog::transport")));
        assert!(!bridge.enabled(&metadata(log::Level::Warn, "tintlog")));
        assert!(bridge.enabled(&metadata(log::Level::Warn, "tintlog_demo")));
    }

    #[test]
    fn test_respects_max_level_and_logger_level() {
        let inner = logger();
        inner.set_level(Level::Warn);
        let bridge = TintLogger::new(inner).with_max_level(LevelFilter::Info);
        assert!(!bridge.enabled(&metadata(log::Level::Debug, "app")));
        assert!(!bridge.enabled(&metadata(log::Level::Info, "app")));
        assert!(bridge.enabled(&metadata(log::Level::Error, "app")));
    }

    #[test]
    fn test_forwards_record_with_location() {
        let inner = logger();
        let bridge = TintLogger::new(inner.clone()).with_targets(true);
        bridge.log(
            &Record::builder()
                .level(log::Level::Warn)
                .target("app::db")
                .args(format_args!("slow query {}", 42))
                .file(Some("src/db.rs"))
                .line(Some(7))
                .module_path(Some("app::db"))
                .build(),
        );
        let records = inner.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level, Level::Warn);
        assert_eq!(records[0].message, "slow query 42");
        assert_eq!(records[0].prefix.as_deref(), Some("app::db"));
        let location = records[0].location.as_ref().unwrap();
        assert_eq!((location.file.as_str(), location.line), ("src/db.rs", 7));
    }
}
