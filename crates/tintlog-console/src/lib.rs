//! Styled console output for tintlog.
//!
//! - [`color`] converts CSS color expressions to hex or SGR escapes
//! - [`detection`] picks an [`OutputTarget`] from the environment
//! - [`render`] composes level, timestamp, prefix and message into a line,
//!   caching compiled templates per style key
//! - [`console`] writes rendered lines; [`testing`] captures them

#![forbid(unsafe_code)]

pub mod color;
pub mod console;
pub mod detection;
mod error;
pub mod render;
pub mod style;
pub mod testing;
pub mod theme;

pub use color::{AnsiColor, ColorCapability, Rgb};
pub use console::{ConsoleSink, NullConsole, StderrConsole};
pub use detection::{Environment, OutputMode, OutputTarget, ProcessEnvironment, StaticEnvironment, detect};
pub use error::RenderError;
pub use render::{CacheStats, Preset, RenderSettings, Rendered, Renderer};
pub use style::{Part, PartStyle, StyleBuilder, StyleConfig};
pub use theme::{LevelStyle, Theme};
