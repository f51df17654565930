//! Capacity-bounded, insertion-ordered record store.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tintlog_core::{Level, LogRecord, log_buffer};

use crate::filter::{LogFilter, TimeBound};
use crate::stats::BufferStats;

/// Default number of records kept.
pub const DEFAULT_CAPACITY: usize = 1000;
/// Smallest accepted capacity.
pub const MIN_CAPACITY: usize = 1;
/// Largest accepted capacity.
pub const MAX_CAPACITY: usize = 100_000;

/// Clamp a requested capacity into the supported range.
#[must_use]
pub fn clamp_capacity(requested: usize) -> usize {
    requested.clamp(MIN_CAPACITY, MAX_CAPACITY)
}

/// What a retention sweep removes.
///
/// Set conditions must all hold for a record to go. A policy with no
/// conditions removes nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Remove records strictly older than this.
    pub older_than: Option<TimeBound>,
    /// Remove only records at these levels.
    pub levels: Vec<Level>,
}

impl RetentionPolicy {
    #[must_use]
    pub fn older_than(bound: TimeBound) -> Self {
        Self {
            older_than: Some(bound),
            levels: Vec::new(),
        }
    }

    pub fn at_levels(mut self, levels: impl IntoIterator<Item = Level>) -> Self {
        self.levels.extend(levels);
        self
    }

    fn is_noop(&self) -> bool {
        self.older_than.is_none() && self.levels.is_empty()
    }
}

/// Ring buffer of emitted records.
///
/// Once full, every push evicts the oldest record. Survivors keep their
/// insertion order; stored records are never mutated.
pub struct LogBuffer {
    records: VecDeque<Arc<LogRecord>>,
    capacity: usize,
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl LogBuffer {
    /// Create a buffer; `capacity` is clamped to `[MIN_CAPACITY, MAX_CAPACITY]`.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = clamp_capacity(capacity);
        Self {
            records: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            capacity,
        }
    }

    /// Append a record, evicting the oldest if over capacity.
    pub fn push(&mut self, record: Arc<LogRecord>) {
        self.records.push_back(record);
        if self.records.len() > self.capacity {
            let _ = self.records.pop_front();
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change capacity, clamped. Shrinking evicts the oldest records.
    ///
    /// Returns the capacity actually applied.
    pub fn set_capacity(&mut self, requested: usize) -> usize {
        let capacity = clamp_capacity(requested);
        if capacity != requested {
            log_buffer!("buffer capacity {} clamped to {}", requested, capacity);
        }
        self.capacity = capacity;
        let excess = self.records.len().saturating_sub(capacity);
        if excess > 0 {
            self.records.drain(..excess);
            log_buffer!("evicted {} records after shrinking buffer", excess);
        }
        capacity
    }

    /// All records, oldest first.
    #[must_use]
    pub fn records(&self) -> Vec<Arc<LogRecord>> {
        self.records.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<LogRecord>> {
        self.records.iter()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Run a filter with relative bounds taken against the current time.
    #[must_use]
    pub fn query(&self, filter: &LogFilter) -> Vec<Arc<LogRecord>> {
        self.query_at(filter, Utc::now())
    }

    #[must_use]
    pub fn query_at(&self, filter: &LogFilter, now: DateTime<Utc>) -> Vec<Arc<LogRecord>> {
        filter.apply_at(&self.records, now)
    }

    #[must_use]
    pub fn stats(&self) -> BufferStats {
        BufferStats::compute(self.records.iter().map(AsRef::as_ref), self.capacity)
    }

    /// Remove records matching a retention policy. Returns the count removed.
    pub fn sweep(&mut self, policy: &RetentionPolicy) -> usize {
        self.sweep_at(policy, Utc::now())
    }

    pub fn sweep_at(&mut self, policy: &RetentionPolicy, now: DateTime<Utc>) -> usize {
        if policy.is_noop() {
            return 0;
        }
        let cutoff = policy.older_than.map(|b| b.resolve(now));
        let before = self.records.len();
        self.records.retain(|r| {
            let old = cutoff.is_none_or(|c| r.timestamp < c);
            let level = policy.levels.is_empty() || policy.levels.contains(&r.level);
            !(old && level)
        });
        let removed = before - self.records.len();
        if removed > 0 {
            log_buffer!("retention sweep removed {} records", removed);
        }
        removed
    }
}

impl std::fmt::Debug for LogBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogBuffer")
            .field("len", &self.records.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}
