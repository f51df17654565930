//! Core types for tintlog.
//!
//! This crate provides the pieces every other tintlog crate builds on:
//! - [`LogRecord`] and [`Level`], the canonical shape of one logging call
//! - [`Value`], the dynamic argument graph attached to a record
//! - [`SerializerRegistry`], which turns argument graphs into export-safe JSON
//!   with depth and cycle protection
//!
//! # Design Principles
//!
//! - Records are immutable once emitted and shared as `Arc<LogRecord>`
//! - Argument graphs may contain shared and cyclic nodes
//! - All types support `Send + Sync`

#![forbid(unsafe_code)]

mod error;
pub mod logging;
mod record;
pub mod serializer;
pub mod value;

pub use error::SerializeError;
pub use record::{GroupInfo, Level, LogRecord, ParseLevelError, RecordId, SourceLocation};
pub use serializer::{CircularPolicy, SerializeContext, SerializerOptions, SerializerRegistry};
pub use value::{CustomValue, ErrorValue, Node, Value};
