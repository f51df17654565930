//! Bridges from the `log` and `tracing` ecosystems.
//!
//! - [`TintLogger`] - a `log` crate logger feeding a [`crate::Logger`]
//! - [`TintLayer`] - a `tracing_subscriber` layer doing the same for events
//!
//! Both drop records on tintlog's own diagnostic targets, so internal
//! failures reported through `log` never re-enter the pipeline.

mod logger;
mod subscriber;

pub use logger::TintLogger;
pub use subscriber::{TintLayer, TintSubscriberBuilder};

use tintlog_core::Level;

pub(crate) fn level_from_tracing(level: tracing::Level) -> Level {
    match level {
        tracing::Level::ERROR => Level::Error,
        tracing::Level::WARN => Level::Warn,
        tracing::Level::INFO => Level::Info,
        _ => Level::Debug,
    }
}
