//! Count- and interval-driven batching.
//!
//! A [`Batcher`] queues records and hands them to a [`BatchSink`] in groups of
//! at most `batch_size`. Inside a Tokio runtime a background task flushes when
//! the queue reaches `batch_size` and on every `flush_interval` tick. Without a
//! runtime the batcher only flushes when asked.
//!
//! Delivery is at-least-once: a batch that fails to send goes back to the
//! front of the queue and is retried on the next flush. After a failed
//! background send only the interval tick retries, so a full queue does not
//! turn every enqueue into a new attempt. The queue is not bounded during an
//! outage.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tintlog_core::log_transport;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::error::TransportError;
use crate::record::TransportRecord;

/// Default records per batch.
pub const DEFAULT_BATCH_SIZE: usize = 50;
/// Default time between background flushes.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(5);

/// Batching thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchConfig {
    pub batch_size: usize,
    pub flush_interval: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
        }
    }
}

impl BatchConfig {
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    #[must_use]
    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }
}

/// Destination for one batch.
#[async_trait]
pub trait BatchSink: Send + Sync + 'static {
    async fn send(&self, batch: &[TransportRecord]) -> Result<(), TransportError>;
}

struct Shared<S> {
    sink: S,
    config: BatchConfig,
    pending: Mutex<VecDeque<TransportRecord>>,
    notify: Notify,
    closed: AtomicBool,
    // Serializes flushes so batches leave in queue order.
    flushing: tokio::sync::Mutex<()>,
}

impl<S: BatchSink> Shared<S> {
    fn pending(&self) -> MutexGuard<'_, VecDeque<TransportRecord>> {
        match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    async fn flush(&self) -> Result<(), TransportError> {
        let _guard = self.flushing.lock().await;
        loop {
            let batch: Vec<TransportRecord> = {
                let mut pending = self.pending();
                let n = pending.len().min(self.config.batch_size);
                pending.drain(..n).collect()
            };
            if batch.is_empty() {
                return Ok(());
            }
            if let Err(err) = self.sink.send(&batch).await {
                let mut pending = self.pending();
                for record in batch.into_iter().rev() {
                    pending.push_front(record);
                }
                return Err(err);
            }
        }
    }
}

/// Queue in front of a [`BatchSink`].
pub struct Batcher<S: BatchSink> {
    shared: Arc<Shared<S>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<S: BatchSink> Batcher<S> {
    /// Create a batcher, starting the background worker if a Tokio runtime
    /// is available.
    pub fn new(sink: S, config: BatchConfig) -> Self {
        let config = BatchConfig {
            batch_size: config.batch_size.max(1),
            ..config
        };
        let shared = Arc::new(Shared {
            sink,
            config,
            pending: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            closed: AtomicBool::new(false),
            flushing: tokio::sync::Mutex::new(()),
        });
        let worker = tokio::runtime::Handle::try_current()
            .ok()
            .map(|handle| handle.spawn(run_worker(Arc::clone(&shared))));
        Self {
            shared,
            worker: Mutex::new(worker),
        }
    }

    /// Whether a background worker is flushing automatically.
    #[must_use]
    pub fn is_automatic(&self) -> bool {
        self.worker
            .lock()
            .map(|w| w.is_some())
            .unwrap_or_else(|poisoned| poisoned.into_inner().is_some())
    }

    #[must_use]
    pub fn config(&self) -> BatchConfig {
        self.shared.config
    }

    /// Queue a record. Never waits for I/O.
    pub fn enqueue(&self, record: TransportRecord) -> Result<(), TransportError> {
        if self.shared.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        let len = {
            let mut pending = self.shared.pending();
            pending.push_back(record);
            pending.len()
        };
        // Wake the worker once per fill, not on every record past it.
        if len == self.shared.config.batch_size {
            self.shared.notify.notify_one();
        }
        Ok(())
    }

    /// Records waiting to be sent.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.shared.pending().len()
    }

    /// Send everything queued. Stops at the first failed batch.
    pub async fn flush(&self) -> Result<(), TransportError> {
        self.shared.flush().await
    }

    /// Stop the worker, wait for it, then flush what remains.
    pub async fn close(&self) -> Result<(), TransportError> {
        self.shared.closed.store(true, Ordering::Release);
        self.shared.notify.notify_one();
        let worker = match self.worker.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = worker {
            if let Err(err) = handle.await {
                log_transport!("batch worker ended abnormally: {}", err);
            }
        }
        self.shared.flush().await
    }

    pub fn sink(&self) -> &S {
        &self.shared.sink
    }
}

impl<S: BatchSink> Drop for Batcher<S> {
    fn drop(&mut self) {
        let worker = match self.worker.get_mut() {
            Ok(worker) => worker.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = worker {
            handle.abort();
        }
    }
}

impl<S: BatchSink> std::fmt::Debug for Batcher<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Batcher")
            .field("config", &self.shared.config)
            .field("pending", &self.pending_len())
            .field("automatic", &self.is_automatic())
            .finish()
    }
}

async fn run_worker<S: BatchSink>(shared: Arc<Shared<S>>) {
    let period = shared.config.flush_interval.max(Duration::from_millis(1));
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut backing_off = false;
    loop {
        let ticked = tokio::select! {
            () = shared.notify.notified() => false,
            _ = ticker.tick() => true,
        };
        if shared.closed.load(Ordering::Acquire) {
            break;
        }
        if (backing_off && !ticked) || shared.pending().is_empty() {
            continue;
        }
        match shared.flush().await {
            Ok(()) => backing_off = false,
            Err(err) => {
                backing_off = true;
                log_transport!("batch send failed, {} records re-queued: {}", shared.pending().len(), err);
            }
        }
    }
}
