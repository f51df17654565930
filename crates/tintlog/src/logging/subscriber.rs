//! `tracing` subscriber integration.
//!
//! Events become records: the `message` field is the message, every other
//! field goes into one object argument, and the enclosing span names are
//! joined into a `span` field.

use std::fmt;

use tintlog_core::logging::is_internal_target;
use tintlog_core::{SourceLocation, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;

use super::level_from_tracing;
use crate::Logger;

/// A tracing layer that forwards events into a [`Logger`].
#[derive(Debug, Clone)]
pub struct TintLayer {
    logger: Logger,
    show_targets: bool,
}

impl TintLayer {
    #[must_use]
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            show_targets: false,
        }
    }

    /// Use the event target as a scope prefix.
    #[must_use]
    pub fn with_targets(mut self, show: bool) -> Self {
        self.show_targets = show;
        self
    }
}

#[derive(Default)]
struct FieldCollector {
    message: Option<String>,
    fields: Vec<(String, Value)>,
}

impl FieldCollector {
    fn record_value(&mut self, field: &Field, value: Value) {
        if field.name() == "message" && self.message.is_none() {
            self.message = Some(match &value {
                Value::String(s) => s.clone(),
                other => other.inspect(),
            });
        } else {
            self.fields.push((field.name().to_string(), value));
        }
    }
}

impl Visit for FieldCollector {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record_value(field, Value::from(format!("{value:?}")));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_value(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record_value(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_value(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record_value(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.record_value(field, Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.record_value(field, Value::from_error(value));
    }
}

impl<S> Layer<S> for TintLayer
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if is_internal_target(metadata.target()) {
            return;
        }
        let level = level_from_tracing(*metadata.level());
        if !self.logger.enabled(level) {
            return;
        }

        let mut collector = FieldCollector::default();
        event.record(&mut collector);
        if let Some(scope) = ctx.event_scope(event) {
            let spans: Vec<String> = scope.from_root().map(|span| span.name().to_string()).collect();
            if !spans.is_empty() {
                collector
                    .fields
                    .push(("span".to_string(), Value::from(spans.join("::"))));
            }
        }

        let message = collector
            .message
            .unwrap_or_else(|| metadata.name().to_string());
        let args = if collector.fields.is_empty() {
            Vec::new()
        } else {
            vec![Value::object(collector.fields)]
        };

        let scoped;
        let logger = if self.show_targets {
            scoped = self.logger.scope(metadata.target());
            &scoped
        } else {
            &self.logger
        };
        match (metadata.file(), metadata.line()) {
            (Some(file), Some(line)) => {
                let location = SourceLocation::new(file, line, 0).with_function(metadata.target());
                logger.log_at(level, message, args, location);
            }
            _ => {
                logger.log(level, message, args);
            }
        }
    }
}

/// Builder for a subscriber with a [`TintLayer`] on a registry.
#[derive(Debug)]
pub struct TintSubscriberBuilder {
    logger: Logger,
    show_targets: bool,
    level_filter: LevelFilter,
}

impl TintSubscriberBuilder {
    #[must_use]
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            show_targets: false,
            level_filter: LevelFilter::INFO,
        }
    }

    #[must_use]
    pub fn with_targets(mut self, show: bool) -> Self {
        self.show_targets = show;
        self
    }

    #[must_use]
    pub fn with_level_filter(mut self, filter: LevelFilter) -> Self {
        self.level_filter = filter;
        self
    }

    /// Build the subscriber without installing it.
    #[must_use]
    pub fn build(self) -> impl Subscriber + Send + Sync {
        let layer = TintLayer::new(self.logger).with_targets(self.show_targets);
        tracing_subscriber::registry()
            .with(self.level_filter)
            .with(layer)
    }

    /// Build and install as the global subscriber.
    pub fn init(self) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
        tracing::subscriber::set_global_default(self.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tintlog_console::testing::TestConsole;
    use tintlog_console::{OutputMode, StaticEnvironment};
    use tintlog_core::Level;

    use crate::LoggerConfig;

    fn logger() -> Logger {
        Logger::builder(LoggerConfig::new().mode(OutputMode::Plain).timestamps(false))
            .console(Arc::new(TestConsole::new()))
            .environment(Arc::new(StaticEnvironment::new()))
            .build()
    }

    #[test]
    fn test_event_fields_become_object_argument() {
        let inner = logger();
        let subscriber = TintSubscriberBuilder::new(inner.clone())
            .with_level_filter(LevelFilter::DEBUG)
            .build();
        tracing::subscriber::with_default(subscriber, || {
            let span = tracing::info_span!("request");
            let _enter = span.enter();
            tracing::warn!(user = "ada", attempts = 3_u64, "login failed");
        });

        let records = inner.records();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.level, Level::Warn);
        assert_eq!(record.message, "login failed");
        let args = tintlog_core::SerializerRegistry::new()
            .serialize_args(&record.args, &tintlog_core::SerializerOptions::default())
            .unwrap();
        assert_eq!(
            args,
            vec![serde_json::json!({ "user": "ada", "attempts": 3, "span": "request" })]
        );
    }

    #[test]
    fn test_level_filter_applies() {
        let inner = logger();
        let subscriber = TintSubscriberBuilder::new(inner.clone()).build();
        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!("filtered out");
            tracing::error!("kept");
        });
        assert_eq!(inner.records().len(), 1);
    }

    #[test]
    fn test_internal_target_dropped() {
        let inner = logger();
        let subscriber = TintSubscriberBuilder::new(inner.clone()).build();
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(target: "tintlog::transport", "loop");
        });
        assert!(inner.records().is_empty());
    }
}
