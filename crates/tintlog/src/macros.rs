//! Call-site capturing logging macros.
//!
//! ```ignore
//! let log = tintlog::logger();
//! tintlog::info!(log, "listening on {}", port);
//! tintlog::error!(log, "request failed"; err_value, request_id);
//! ```
//!
//! Arguments after `;` are converted with `Value::from` and attached to the
//! record. The message is only formatted when the level is enabled.

#[doc(hidden)]
#[macro_export]
macro_rules! __tintlog_emit {
    ($logger:expr, $level:expr, $message:expr, $args:expr) => {{
        let logger: &$crate::Logger = &$logger;
        let level = $level;
        if logger.enabled(level) {
            logger.log_at(
                level,
                $message,
                $args,
                $crate::SourceLocation::new(file!(), line!(), column!()).with_function(module_path!()),
            )
        } else {
            None
        }
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __tintlog_level {
    ($level:expr, $logger:expr, $fmt:literal $(, $fmt_arg:expr)* $(,)? ; $($arg:expr),+ $(,)?) => {
        $crate::__tintlog_emit!(
            $logger,
            $level,
            format!($fmt $(, $fmt_arg)*),
            vec![$($crate::Value::from($arg)),+]
        )
    };
    ($level:expr, $logger:expr, $fmt:literal $(, $fmt_arg:expr)* $(,)?) => {
        $crate::__tintlog_emit!($logger, $level, format!($fmt $(, $fmt_arg)*), Vec::new())
    };
}

/// Log at debug level with the call site.
#[macro_export]
macro_rules! debug {
    ($($tt:tt)+) => { $crate::__tintlog_level!($crate::Level::Debug, $($tt)+) };
}

/// Log at info level with the call site.
#[macro_export]
macro_rules! info {
    ($($tt:tt)+) => { $crate::__tintlog_level!($crate::Level::Info, $($tt)+) };
}

/// Log at warn level with the call site.
#[macro_export]
macro_rules! warn {
    ($($tt:tt)+) => { $crate::__tintlog_level!($crate::Level::Warn, $($tt)+) };
}

/// Log at error level with the call site.
#[macro_export]
macro_rules! error {
    ($($tt:tt)+) => { $crate::__tintlog_level!($crate::Level::Error, $($tt)+) };
}

/// Log at critical level with the call site.
#[macro_export]
macro_rules! critical {
    ($($tt:tt)+) => { $crate::__tintlog_level!($crate::Level::Critical, $($tt)+) };
}
