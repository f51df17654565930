//! Buffer statistics.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tintlog_core::{Level, LogRecord};

/// Record count per level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LevelCounts {
    pub debug: usize,
    pub info: usize,
    pub warn: usize,
    pub error: usize,
    pub critical: usize,
}

impl LevelCounts {
    #[must_use]
    pub fn get(&self, level: Level) -> usize {
        match level {
            Level::Debug => self.debug,
            Level::Info => self.info,
            Level::Warn => self.warn,
            Level::Error => self.error,
            Level::Critical => self.critical,
        }
    }

    fn bump(&mut self, level: Level) {
        let slot = match level {
            Level::Debug => &mut self.debug,
            Level::Info => &mut self.info,
            Level::Warn => &mut self.warn,
            Level::Error => &mut self.error,
            Level::Critical => &mut self.critical,
        };
        *slot += 1;
    }

    /// Error plus critical.
    #[must_use]
    pub fn errors(&self) -> usize {
        self.error + self.critical
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.debug + self.info + self.warn + self.error + self.critical
    }

    /// Count every record in one pass.
    pub fn tally<'a>(records: impl IntoIterator<Item = &'a LogRecord>) -> Self {
        let mut counts = Self::default();
        for record in records {
            counts.bump(record.level);
        }
        counts
    }
}

/// Snapshot of buffer occupancy.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferStats {
    pub size: usize,
    pub max_size: usize,
    /// `size / max_size * 100`.
    pub usage_percent: f64,
    pub oldest_timestamp: Option<DateTime<Utc>>,
    pub newest_timestamp: Option<DateTime<Utc>>,
    pub counts_by_level: LevelCounts,
}

impl BufferStats {
    /// Compute stats over records in insertion order.
    pub fn compute<'a>(records: impl IntoIterator<Item = &'a LogRecord>, max_size: usize) -> Self {
        let mut counts = LevelCounts::default();
        let mut size = 0;
        let mut oldest: Option<DateTime<Utc>> = None;
        let mut newest: Option<DateTime<Utc>> = None;
        for record in records {
            size += 1;
            counts.bump(record.level);
            let ts = record.timestamp;
            oldest = Some(oldest.map_or(ts, |o| o.min(ts)));
            newest = Some(newest.map_or(ts, |n| n.max(ts)));
        }
        let usage_percent = if max_size == 0 {
            0.0
        } else {
            size as f64 / max_size as f64 * 100.0
        };
        Self {
            size,
            max_size,
            usage_percent,
            oldest_timestamp: oldest,
            newest_timestamp: newest,
            counts_by_level: counts,
        }
    }
}
