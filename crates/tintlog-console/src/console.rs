//! Console sinks
//!
//! A [`ConsoleSink`] receives every rendered line. [`StderrConsole`] writes
//! to stderr or any other writer; [`crate::testing::TestConsole`] captures.

use std::io::{self, Write};
use std::sync::Mutex;

use tintlog_core::Level;

use crate::detection::OutputTarget;
use crate::render::Rendered;

/// Destination for rendered lines.
pub trait ConsoleSink: Send + Sync {
    /// Emit one line. Must not panic on I/O failure.
    fn emit(&self, level: Level, rendered: &Rendered);
}

/// Writes rendered lines to stderr or a supplied writer.
///
/// Browser-CSS output has no meaning outside a browser console, so it is
/// written as its plain text.
pub struct StderrConsole {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl StderrConsole {
    #[must_use]
    pub fn new() -> Self {
        Self::with_writer(io::stderr())
    }

    /// Create with a custom writer (for testing)
    #[must_use]
    pub fn with_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
        }
    }

    /// Print an unstyled line
    pub fn print_plain(&self, text: &str) {
        self.write_line(text);
    }

    fn write_line(&self, line: &str) {
        let mut writer = match self.writer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Nowhere to report a failing stderr.
        let _ = writeln!(writer, "{line}");
        let _ = writer.flush();
    }
}

impl Default for StderrConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StderrConsole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StderrConsole").finish_non_exhaustive()
    }
}

impl ConsoleSink for StderrConsole {
    fn emit(&self, _level: Level, rendered: &Rendered) {
        match rendered.target {
            OutputTarget::BrowserCss => self.write_line(&rendered.plain_text()),
            OutputTarget::Ansi(_) | OutputTarget::Plain => self.write_line(&rendered.format),
        }
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullConsole;

impl ConsoleSink for NullConsole {
    fn emit(&self, _level: Level, _rendered: &Rendered) {}
}
