//! Record buffering, querying and export for tintlog.
//!
//! - [`LogBuffer`]: capacity-bounded ring of emitted records
//! - [`LogFilter`]: composable AND-ed predicates plus head/tail slicing
//! - [`export`]: JSON, CSV, Markdown, plain text and HTML output
//!
//! The buffer itself is not synchronized; the logger owns it behind a lock.

#![forbid(unsafe_code)]

mod buffer;
mod error;
pub mod export;
pub mod filter;
mod stats;

pub use buffer::{DEFAULT_CAPACITY, LogBuffer, MAX_CAPACITY, MIN_CAPACITY, RetentionPolicy, clamp_capacity};
pub use error::{ExportError, FilterError};
pub use export::{ExportFormat, ExportOptions, GroupBy, export, export_with};
pub use filter::{LogFilter, TimeBound};
pub use stats::{BufferStats, LevelCounts};
