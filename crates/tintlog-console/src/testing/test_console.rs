//! Capturing console sink for tests.
//!
//! [`TestConsole`] records every rendered line twice: as the raw bytes a
//! terminal would receive and with SGR sequences removed, so assertions can
//! target either.

use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};

use strip_ansi_escapes::strip;
use tintlog_core::Level;

use crate::console::{ConsoleSink, StderrConsole};
use crate::render::Rendered;

/// A [`ConsoleSink`] that keeps everything it is given.
///
/// Lines pass through a real [`StderrConsole`] writing into memory, so what
/// is captured is exactly what stderr would have shown. The [`Rendered`]
/// values are kept as well for checking browser `style_args`.
#[derive(Clone)]
pub struct TestConsole {
    inner: Arc<StderrConsole>,
    capture: Arc<Mutex<Capture>>,
}

#[derive(Debug, Default)]
struct Capture {
    plain: Vec<String>,
    raw: Vec<String>,
    emitted: Vec<(Level, Rendered)>,
}

impl TestConsole {
    #[must_use]
    pub fn new() -> Self {
        let capture = Arc::new(Mutex::new(Capture::default()));
        Self {
            inner: Arc::new(StderrConsole::with_writer(CaptureWriter(Arc::clone(&capture)))),
            capture,
        }
    }

    /// The console lines are written through, for unstyled writes.
    #[must_use]
    pub fn console(&self) -> &StderrConsole {
        &self.inner
    }

    fn capture(&self) -> MutexGuard<'_, Capture> {
        match self.capture.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Captured lines without escape sequences.
    #[must_use]
    pub fn output(&self) -> Vec<String> {
        self.capture().plain.clone()
    }

    /// Captured lines as written, escape sequences included.
    #[must_use]
    pub fn raw_output(&self) -> Vec<String> {
        self.capture().raw.clone()
    }

    /// Every render result received, in order.
    #[must_use]
    pub fn rendered(&self) -> Vec<Rendered> {
        self.capture().emitted.iter().map(|(_, r)| r.clone()).collect()
    }

    /// Level of every emitted record, in order.
    #[must_use]
    pub fn levels(&self) -> Vec<Level> {
        self.capture().emitted.iter().map(|(level, _)| *level).collect()
    }

    /// Number of emitted records at `level`.
    #[must_use]
    pub fn count(&self, level: Level) -> usize {
        self.capture().emitted.iter().filter(|(l, _)| *l == level).count()
    }

    /// Stripped output joined with newlines.
    #[must_use]
    pub fn output_string(&self) -> String {
        self.output().join("\n")
    }

    /// Case-insensitive substring search over the stripped output.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.output_string()
            .to_lowercase()
            .contains(&needle.to_lowercase())
    }

    #[must_use]
    pub fn contains_all(&self, needles: &[&str]) -> bool {
        let haystack = self.output_string().to_lowercase();
        needles.iter().all(|n| haystack.contains(&n.to_lowercase()))
    }

    /// Regex search over the stripped output. An invalid pattern never matches.
    #[must_use]
    pub fn matches(&self, pattern: &str) -> bool {
        regex::Regex::new(pattern).is_ok_and(|re| re.is_match(&self.output_string()))
    }

    /// # Panics
    ///
    /// Panics if no captured line contains `needle`.
    pub fn assert_contains(&self, needle: &str) {
        assert!(self.contains(needle), "expected {needle:?} in console output:\n{}", self.output_string());
    }

    /// # Panics
    ///
    /// Panics if any captured line contains `needle`.
    pub fn assert_not_contains(&self, needle: &str) {
        assert!(!self.contains(needle), "unexpected {needle:?} in console output:\n{}", self.output_string());
    }

    /// # Panics
    ///
    /// Panics if the stripped output does not have `expected` lines.
    pub fn assert_line_count(&self, expected: usize) {
        let lines = self.output();
        assert_eq!(lines.len(), expected, "console output:\n{}", lines.join("\n"));
    }

    pub fn clear(&self) {
        *self.capture() = Capture::default();
    }
}

impl ConsoleSink for TestConsole {
    fn emit(&self, level: Level, rendered: &Rendered) {
        self.capture().emitted.push((level, rendered.clone()));
        self.inner.emit(level, rendered);
    }
}

impl Default for TestConsole {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TestConsole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let capture = self.capture();
        f.debug_struct("TestConsole")
            .field("lines", &capture.plain.len())
            .field("emitted", &capture.emitted.len())
            .finish()
    }
}

struct CaptureWriter(Arc<Mutex<Capture>>);

impl Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut capture = match self.0.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let stripped = strip(buf);
        capture
            .raw
            .extend(String::from_utf8_lossy(buf).lines().map(str::to_string));
        capture
            .plain
            .extend(String::from_utf8_lossy(&stripped).lines().map(str::to_string));
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
