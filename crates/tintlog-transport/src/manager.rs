//! Fan-out of records to registered transports.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tintlog_core::{LogRecord, SerializerOptions, SerializerRegistry, log_transport};

use crate::error::TransportError;
use crate::record::TransportRecord;
use crate::transport::{Transport, TransportOptions};

struct Entry {
    name: String,
    transport: Arc<dyn Transport>,
    options: TransportOptions,
    failures: AtomicU64,
}

impl Entry {
    fn dispatch(&self, record: &TransportRecord) -> Result<bool, TransportError> {
        if record.level < self.options.min_level {
            return Ok(false);
        }
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let record = match &self.options.transform {
                Some(transform) => transform(record.clone()),
                None => Some(record.clone()),
            };
            match record {
                Some(record) => self.transport.write(record).map(|()| true),
                None => Ok(false),
            }
        }));
        outcome.unwrap_or_else(|_| {
            Err(TransportError::Panicked {
                name: self.name.clone(),
            })
        })
    }
}

/// Registry of independently configured transports.
///
/// Every transport receives its own copy of each record. A transport that
/// fails or panics is reported on the `tintlog::transport` target and the
/// remaining transports are still served.
pub struct TransportManager {
    entries: RwLock<Vec<Arc<Entry>>>,
    registry: Arc<SerializerRegistry>,
    serializer: SerializerOptions,
}

impl Default for TransportManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TransportManager {
    #[must_use]
    pub fn new() -> Self {
        Self::with_registry(Arc::new(SerializerRegistry::new()), SerializerOptions::default())
    }

    /// Use a custom serializer registry to project record arguments.
    #[must_use]
    pub fn with_registry(registry: Arc<SerializerRegistry>, serializer: SerializerOptions) -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            registry,
            serializer,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Arc<Entry>>> {
        match self.entries.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_lock(&self) -> RwLockWriteGuard<'_, Vec<Arc<Entry>>> {
        match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn snapshot(&self) -> Vec<Arc<Entry>> {
        self.read().clone()
    }

    /// Register a transport. An existing transport with the same name is
    /// replaced and returned; it is not closed.
    pub fn add(
        &self,
        name: impl Into<String>,
        transport: Arc<dyn Transport>,
        options: TransportOptions,
    ) -> Option<Arc<dyn Transport>> {
        let entry = Arc::new(Entry {
            name: name.into(),
            transport,
            options,
            failures: AtomicU64::new(0),
        });
        let mut entries = self.write_lock();
        if let Some(slot) = entries.iter_mut().find(|e| e.name == entry.name) {
            let old = std::mem::replace(slot, entry);
            return Some(Arc::clone(&old.transport));
        }
        entries.push(entry);
        None
    }

    /// Unregister a transport, returning it so the caller can close it.
    pub fn remove(&self, name: &str) -> Option<Arc<dyn Transport>> {
        let mut entries = self.write_lock();
        let index = entries.iter().position(|e| e.name == name)?;
        let entry = entries.remove(index);
        Some(Arc::clone(&entry.transport))
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Transport>> {
        self.read()
            .iter()
            .find(|e| e.name == name)
            .map(|e| Arc::clone(&e.transport))
    }

    /// Registered names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.read().iter().map(|e| e.name.clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Number of failed writes recorded for a transport.
    #[must_use]
    pub fn failures(&self, name: &str) -> Option<u64> {
        self.read()
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.failures.load(Ordering::Relaxed))
    }

    /// Hand a record to every transport whose threshold it meets.
    ///
    /// Returns how many transports accepted it. Never blocks on I/O.
    pub fn write(&self, record: &LogRecord) -> usize {
        let entries = self.snapshot();
        if entries.is_empty() {
            return 0;
        }
        let projected = TransportRecord::from_record(record, &self.registry, &self.serializer);
        let mut delivered = 0;
        for entry in &entries {
            match entry.dispatch(&projected) {
                Ok(true) => delivered += 1,
                Ok(false) => {}
                Err(err) => {
                    entry.failures.fetch_add(1, Ordering::Relaxed);
                    log_transport!("transport '{}' rejected {}: {}", entry.name, projected.id, err);
                }
            }
        }
        delivered
    }

    /// Flush every transport. A failing transport does not stop the others.
    pub async fn flush_all(&self) -> Vec<(String, TransportError)> {
        let mut errors = Vec::new();
        for entry in self.snapshot() {
            if let Err(err) = entry.transport.flush().await {
                entry.failures.fetch_add(1, Ordering::Relaxed);
                log_transport!("flush of transport '{}' failed: {}", entry.name, err);
                errors.push((entry.name.clone(), err));
            }
        }
        errors
    }

    /// Close and unregister every transport.
    pub async fn close_all(&self) -> Vec<(String, TransportError)> {
        let entries: Vec<Arc<Entry>> = std::mem::take(&mut *self.write_lock());
        let mut errors = Vec::new();
        for entry in entries {
            if let Err(err) = entry.transport.close().await {
                log_transport!("close of transport '{}' failed: {}", entry.name, err);
                errors.push((entry.name.clone(), err));
            }
        }
        errors
    }
}

impl std::fmt::Debug for TransportManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportManager")
            .field("transports", &self.names())
            .finish_non_exhaustive()
    }
}
