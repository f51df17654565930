//! The transport abstraction.

use std::sync::Arc;

use async_trait::async_trait;
use tintlog_core::Level;

use crate::error::TransportError;
use crate::record::TransportRecord;

/// An external sink receiving copies of emitted records.
///
/// `write` only queues; delivery happens on the transport's own schedule or
/// when `flush` is awaited.
#[async_trait]
pub trait Transport: Send + Sync {
    fn name(&self) -> &str;

    /// Queue a record. Must not block on I/O.
    fn write(&self, record: TransportRecord) -> Result<(), TransportError>;

    /// Deliver everything queued.
    async fn flush(&self) -> Result<(), TransportError>;

    /// Final flush, then release timers and handles.
    async fn close(&self) -> Result<(), TransportError>;
}

/// Per-record rewrite. Returning `None` suppresses the record for that
/// transport only.
pub type Transform = Arc<dyn Fn(TransportRecord) -> Option<TransportRecord> + Send + Sync>;

/// How the manager feeds one transport.
#[derive(Clone)]
pub struct TransportOptions {
    /// Records below this level are not sent.
    pub min_level: Level,
    pub transform: Option<Transform>,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            min_level: Level::Debug,
            transform: None,
        }
    }
}

impl TransportOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    pub fn transform<F>(mut self, f: F) -> Self
    where
        F: Fn(TransportRecord) -> Option<TransportRecord> + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(f));
        self
    }
}

impl std::fmt::Debug for TransportOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportOptions")
            .field("min_level", &self.min_level)
            .field("transform", &self.transform.is_some())
            .finish()
    }
}
