//! Internal diagnostics for tintlog itself.
//!
//! tintlog reports its own failures (a transport that rejected a write, a
//! handler that panicked, an invalid style that fell back to plain output)
//! through the standard [`log`] facade. Applications see them through
//! whatever backend they install.
//!
//! # Log Targets
//!
//! - `tintlog`: Root target for all internal diagnostics
//! - `tintlog::render`: Style compilation and cache activity
//! - `tintlog::buffer`: Retention and capacity changes
//! - `tintlog::transport`: Delivery failures and retries
//! - `tintlog::handler`: User record handlers
//!
//! Example filter: `RUST_LOG=tintlog::transport=debug`
//!
//! The `log` bridge in the `tintlog` crate drops records on these targets so
//! diagnostics never loop back into the pipeline that produced them.

pub use log::{Level, LevelFilter};
pub use log::{debug, error, info, trace, warn};

/// Log targets used by tintlog components.
pub mod targets {
    /// Root target for all tintlog diagnostics.
    pub const TINTLOG: &str = "tintlog";

    /// Rendering, presets and the style cache.
    pub const RENDER: &str = "tintlog::render";

    /// Ring buffer retention and queries.
    pub const BUFFER: &str = "tintlog::buffer";

    /// Transport delivery and batching.
    pub const TRANSPORT: &str = "tintlog::transport";

    /// User record handlers.
    pub const HANDLER: &str = "tintlog::handler";
}

/// Whether a target belongs to tintlog's own diagnostics.
#[must_use]
pub fn is_internal_target(target: &str) -> bool {
    target == targets::TINTLOG
        || target
            .strip_prefix(targets::TINTLOG)
            .is_some_and(|rest| rest.starts_with("::"))
}

/// Returns whether logging is enabled at the given level for the given target.
#[inline]
#[must_use]
pub fn is_enabled(level: Level, target: &str) -> bool {
    log::log_enabled!(target: target, level)
}

/// Logs a transport event at WARN level.
#[macro_export]
macro_rules! log_transport {
    ($($arg:tt)*) => {
        log::warn!(target: "tintlog::transport", $($arg)*)
    };
}

/// Logs a rendering event at DEBUG level.
#[macro_export]
macro_rules! log_render {
    ($($arg:tt)*) => {
        log::debug!(target: "tintlog::render", $($arg)*)
    };
}

/// Logs a buffer event at DEBUG level.
#[macro_export]
macro_rules! log_buffer {
    ($($arg:tt)*) => {
        log::debug!(target: "tintlog::buffer", $($arg)*)
    };
}

/// Logs a handler failure at WARN level.
#[macro_export]
macro_rules! log_handler {
    ($($arg:tt)*) => {
        log::warn!(target: "tintlog::handler", $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_targets_are_hierarchical() {
        assert!(targets::RENDER.starts_with(targets::TINTLOG));
        assert!(targets::BUFFER.starts_with(targets::TINTLOG));
        assert!(targets::TRANSPORT.starts_with(targets::TINTLOG));
        assert!(targets::HANDLER.starts_with(targets::TINTLOG));
    }

    #[test]
    fn internal_target_detection() {
        assert!(is_internal_target("tintlog"));
        assert!(is_internal_target("tintlog::transport"));
        assert!(!is_internal_target("tintlogger"));
        assert!(!is_internal_target("my_app::db"));
    }

    #[test]
    fn is_enabled_without_logger() {
        // No logger installed: the facade reports disabled, and must not panic.
        let _ = is_enabled(Level::Error, targets::TINTLOG);
    }
}
