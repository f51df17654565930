//! Integration tests for tintlog-buffer.
//!
//! Records flow from the ring buffer through filters into every export format.

use std::sync::Arc;

use chrono::{TimeDelta, TimeZone, Utc};
use tintlog_buffer::{
    ExportFormat, ExportOptions, GroupBy, LogBuffer, LogFilter, TimeBound, export,
};
use tintlog_core::{Level, LogRecord, SourceLocation, Value};

fn filled(levels: &[Level]) -> LogBuffer {
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
    let mut buffer = LogBuffer::new(100);
    for (i, level) in levels.iter().enumerate() {
        let record = LogRecord::new(*level, format!("event {i}"))
            .with_timestamp(start + TimeDelta::try_minutes(i as i64).unwrap())
            .with_prefix(if i % 2 == 0 { "api" } else { "worker" });
        buffer.push(Arc::new(record));
    }
    buffer
}

// ============================================================================
// Buffer-Filter Integration Tests
// ============================================================================

#[test]
fn test_errors_only_then_last_k() {
    let buffer = filled(&[
        Level::Error,
        Level::Info,
        Level::Critical,
        Level::Warn,
        Level::Error,
        Level::Debug,
    ]);
    let all_errors = buffer.query(&LogFilter::new().errors_only());
    assert_eq!(all_errors.len(), 3);
    assert!(all_errors.iter().all(|r| matches!(r.level, Level::Error | Level::Critical)));

    let last_two = buffer.query(&LogFilter::new().errors_only().last(2));
    let messages: Vec<_> = last_two.iter().map(|r| r.message.as_str()).collect();
    assert_eq!(messages, ["event 2", "event 4"]);
}

#[test]
fn test_absolute_window_and_prefix() {
    let buffer = filled(&[Level::Info; 10]);
    let filter = LogFilter::new()
        .since_expr("2024-05-01 09:02:00")
        .unwrap()
        .until_expr("2024-05-01T09:06:00Z")
        .unwrap()
        .prefix("api");
    let out = buffer.query(&filter);
    let messages: Vec<_> = out.iter().map(|r| r.message.as_str()).collect();
    assert_eq!(messages, ["event 2", "event 4", "event 6"]);
}

#[test]
fn test_relative_window_against_fixed_now() {
    let buffer = filled(&[Level::Info; 10]);
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 9, 10, 0).unwrap();
    let out = buffer.query_at(&LogFilter::new().since(TimeBound::parse("3m").unwrap()), now);
    assert_eq!(out.len(), 3);
}

#[test]
fn test_invalid_time_is_reported() {
    let err = LogFilter::new().since_expr("last tuesday").unwrap_err();
    assert!(err.to_string().contains("last tuesday"));
}

// ============================================================================
// Buffer-Export Integration Tests
// ============================================================================

#[test]
fn test_json_round_trip_matches_filtered_count() {
    let buffer = filled(&[Level::Info, Level::Error, Level::Warn, Level::Error]);
    let records = buffer.query(&LogFilter::new().level(Level::Error));
    let out = export(&records, ExportFormat::Json, &ExportOptions::default()).unwrap();
    let parsed: Vec<serde_json::Value> = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed.len(), records.len());
    assert_eq!(parsed.len(), 2);
}

#[test]
fn test_markdown_group_by_level_scenario() {
    let buffer = filled(&[Level::Info, Level::Info, Level::Error, Level::Info]);
    let out = export(
        &buffer.records(),
        ExportFormat::Markdown,
        &ExportOptions::new().group_by(GroupBy::Level),
    )
    .unwrap();
    assert!(out.contains("## INFO (3)"));
    assert!(out.contains("## ERROR (1)"));
    assert_eq!(out.lines().filter(|l| l.starts_with("## ")).count(), 2);
}

#[test]
fn test_csv_args_go_through_serializer() {
    let shared = Value::object([("id", Value::from(9))]);
    let record = LogRecord::new(Level::Info, "diamond")
        .with_arg(Value::array([shared.clone(), shared]))
        .with_location(SourceLocation::new("src/a.rs", 1, 2));
    let out = export(&[Arc::new(record)], ExportFormat::Csv, &ExportOptions::default()).unwrap();
    let row = out.lines().nth(1).unwrap();
    assert!(row.ends_with(r#""[[{""id"":9},{""id"":9}]]""#));
    assert!(!row.contains("[Circular]"));
}

#[test]
fn test_no_matches_is_valid_output_in_every_format() {
    let buffer = filled(&[Level::Info, Level::Debug]);
    let records = buffer.query(&LogFilter::new().errors_only());
    assert!(records.is_empty());
    for format in ExportFormat::ALL {
        let out = export(&records, format, &ExportOptions::default());
        assert!(out.is_ok(), "{format} failed on empty input");
    }
}

#[test]
fn test_stats_after_eviction() {
    let mut buffer = LogBuffer::new(3);
    for level in [Level::Info, Level::Warn, Level::Error, Level::Critical] {
        buffer.push(Arc::new(LogRecord::new(level, level.as_str())));
    }
    let stats = buffer.stats();
    assert_eq!(stats.size, 3);
    assert_eq!(stats.max_size, 3);
    assert_eq!(stats.counts_by_level.info, 0);
    assert_eq!(stats.counts_by_level.warn, 1);
    assert_eq!(stats.counts_by_level.error, 1);
    assert_eq!(stats.counts_by_level.critical, 1);
    assert!((stats.usage_percent - 100.0).abs() < f64::EPSILON);
}
