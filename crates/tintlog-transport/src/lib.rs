//! External sinks for tintlog records.
//!
//! A [`TransportManager`] owns a set of named [`Transport`]s, each with its own
//! minimum level and optional transform. Records are projected once into a
//! [`TransportRecord`] and handed to every transport that wants them.
//!
//! The bundled transports batch through a [`Batcher`]:
//! - [`HttpTransport`] posts `{"logs": [...]}` to an endpoint
//! - [`FileTransport`] appends NDJSON lines to a file
//!
//! Writing never waits for I/O. Delivery happens on the batcher's schedule or
//! when [`TransportManager::flush_all`] is awaited.

#![forbid(unsafe_code)]

pub mod batch;
mod error;
pub mod file;
pub mod http;
mod manager;
mod record;
mod transport;

pub use batch::{BatchConfig, BatchSink, Batcher, DEFAULT_BATCH_SIZE, DEFAULT_FLUSH_INTERVAL};
pub use error::TransportError;
pub use file::{FileConfig, FileTransport};
pub use http::{HttpConfig, HttpTransport};
pub use manager::TransportManager;
pub use record::TransportRecord;
pub use transport::{Transform, Transport, TransportOptions};
