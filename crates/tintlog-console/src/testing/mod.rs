//! Testing utilities for tintlog console output
//!
//! Provides `TestConsole` for capturing and asserting on rendered lines in tests.

mod test_console;

pub use test_console::TestConsole;
