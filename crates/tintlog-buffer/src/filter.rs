//! Composable record filters and time expressions.
//!
//! Predicates combine with AND. Slicing (`first`, then `last`) runs after
//! every predicate, on the chronologically ordered result.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use tintlog_core::{Level, LogRecord};

use crate::error::FilterError;

/// A `since`/`until` bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBound {
    /// Now minus this much.
    Ago(TimeDelta),
    At(DateTime<Utc>),
}

impl TimeBound {
    /// Parse a time expression.
    ///
    /// Accepts `<n>s|m|h|d|w`, RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC),
    /// `YYYY-MM-DD` (midnight UTC) and integer epoch milliseconds.
    pub fn parse(input: &str) -> Result<Self, FilterError> {
        let s = input.trim();
        let invalid = || FilterError::InvalidTime {
            input: input.to_string(),
        };
        if s.is_empty() {
            return Err(invalid());
        }

        if let Some(delta) = parse_relative(s) {
            return Ok(Self::Ago(delta));
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self::At(dt.with_timezone(&Utc)));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
            return Ok(Self::At(naive.and_utc()));
        }
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|naive| Self::At(naive.and_utc()))
                .ok_or_else(invalid);
        }
        if s.bytes().all(|b| b.is_ascii_digit()) {
            return s
                .parse::<i64>()
                .ok()
                .and_then(DateTime::from_timestamp_millis)
                .map(Self::At)
                .ok_or_else(invalid);
        }
        Err(invalid())
    }

    /// The absolute instant this bound denotes at `now`.
    #[must_use]
    pub fn resolve(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::Ago(delta) => now.checked_sub_signed(*delta).unwrap_or(DateTime::<Utc>::MIN_UTC),
            Self::At(at) => *at,
        }
    }
}

impl FromStr for TimeBound {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<DateTime<Utc>> for TimeBound {
    fn from(at: DateTime<Utc>) -> Self {
        Self::At(at)
    }
}

fn parse_relative(s: &str) -> Option<TimeDelta> {
    let unit = s.chars().last()?;
    let seconds_per = match unit {
        's' => 1,
        'm' => 60,
        'h' => 60 * 60,
        'd' => 24 * 60 * 60,
        'w' => 7 * 24 * 60 * 60,
        _ => return None,
    };
    let digits = &s[..s.len() - 1];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let n: i64 = digits.parse().ok()?;
    TimeDelta::try_seconds(n.checked_mul(seconds_per)?)
}

/// Query over buffered records.
///
/// Empty allow-lists mean "no restriction".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    pub levels: Vec<Level>,
    /// Keep only records whose prefix matches one of these.
    pub prefixes: Vec<String>,
    /// Drop records whose prefix matches one of these.
    pub exclude_prefixes: Vec<String>,
    pub since: Option<TimeBound>,
    pub until: Option<TimeBound>,
    /// Case-insensitive substring of message and inspected arguments.
    pub search: Option<String>,
    /// Only records carrying a source location.
    pub with_location: bool,
    pub errors_only: bool,
    pub first: Option<usize>,
    pub last: Option<usize>,
}

impl LogFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: Level) -> Self {
        self.levels.push(level);
        self
    }

    pub fn levels(mut self, levels: impl IntoIterator<Item = Level>) -> Self {
        self.levels.extend(levels);
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefixes.push(prefix.into());
        self
    }

    pub fn exclude_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.exclude_prefixes.push(prefix.into());
        self
    }

    pub fn since(mut self, bound: TimeBound) -> Self {
        self.since = Some(bound);
        self
    }

    pub fn until(mut self, bound: TimeBound) -> Self {
        self.until = Some(bound);
        self
    }

    /// Parse and set `since`.
    pub fn since_expr(self, expr: &str) -> Result<Self, FilterError> {
        Ok(self.since(TimeBound::parse(expr)?))
    }

    /// Parse and set `until`.
    pub fn until_expr(self, expr: &str) -> Result<Self, FilterError> {
        Ok(self.until(TimeBound::parse(expr)?))
    }

    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    pub fn with_location(mut self) -> Self {
        self.with_location = true;
        self
    }

    pub fn errors_only(mut self) -> Self {
        self.errors_only = true;
        self
    }

    pub fn first(mut self, n: usize) -> Self {
        self.first = Some(n);
        self
    }

    pub fn last(mut self, n: usize) -> Self {
        self.last = Some(n);
        self
    }

    /// Whether this filter passes everything through.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Predicate check against `now` for relative bounds.
    #[must_use]
    pub fn matches_at(&self, record: &LogRecord, now: DateTime<Utc>) -> bool {
        Matcher::new(self, now).matches(record)
    }

    /// Filter then slice.
    #[must_use]
    pub fn apply_at<'a>(
        &self,
        records: impl IntoIterator<Item = &'a Arc<LogRecord>>,
        now: DateTime<Utc>,
    ) -> Vec<Arc<LogRecord>> {
        let matcher = Matcher::new(self, now);
        let mut out: Vec<Arc<LogRecord>> = records
            .into_iter()
            .filter(|r| matcher.matches(r))
            .cloned()
            .collect();
        if let Some(n) = self.first {
            out.truncate(n);
        }
        if let Some(n) = self.last {
            let skip = out.len().saturating_sub(n);
            out.drain(..skip);
        }
        out
    }
}

fn prefix_matches(pattern: &str, prefix: &str) -> bool {
    // Scoped prefixes join with ':'; a parent pattern covers its children.
    prefix == pattern
        || prefix
            .strip_prefix(pattern)
            .is_some_and(|rest| rest.starts_with(':'))
}

/// A filter with its time bounds and search needle resolved once.
struct Matcher<'a> {
    filter: &'a LogFilter,
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
    needle: Option<String>,
}

impl<'a> Matcher<'a> {
    fn new(filter: &'a LogFilter, now: DateTime<Utc>) -> Self {
        Self {
            filter,
            since: filter.since.map(|b| b.resolve(now)),
            until: filter.until.map(|b| b.resolve(now)),
            needle: filter
                .search
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(str::to_lowercase),
        }
    }

    fn matches(&self, record: &LogRecord) -> bool {
        let f = self.filter;
        if f.errors_only && !record.level.is_error() {
            return false;
        }
        if !f.levels.is_empty() && !f.levels.contains(&record.level) {
            return false;
        }
        if !f.prefixes.is_empty() {
            let Some(prefix) = record.prefix.as_deref() else {
                return false;
            };
            if !f.prefixes.iter().any(|p| prefix_matches(p, prefix)) {
                return false;
            }
        }
        if let Some(prefix) = record.prefix.as_deref() {
            if f.exclude_prefixes.iter().any(|p| prefix_matches(p, prefix)) {
                return false;
            }
        }
        if self.since.is_some_and(|since| record.timestamp < since) {
            return false;
        }
        if self.until.is_some_and(|until| record.timestamp > until) {
            return false;
        }
        if f.with_location && record.location.is_none() {
            return false;
        }
        if let Some(needle) = &self.needle {
            if !record.searchable_text().to_lowercase().contains(needle) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tintlog_core::{SourceLocation, Value};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn rec(level: Level, message: &str, mins_ago: i64) -> Arc<LogRecord> {
        Arc::new(
            LogRecord::new(level, message)
                .with_timestamp(now() - TimeDelta::try_minutes(mins_ago).unwrap()),
        )
    }

    #[test]
    fn test_parse_relative() {
        assert_eq!(
            TimeBound::parse("30m").unwrap(),
            TimeBound::Ago(TimeDelta::try_minutes(30).unwrap())
        );
        assert_eq!(
            TimeBound::parse("2h").unwrap().resolve(now()),
            Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap()
        );
        assert_eq!(
            TimeBound::parse("1w").unwrap(),
            TimeBound::Ago(TimeDelta::try_days(7).unwrap())
        );
    }

    #[test]
    fn test_parse_absolute_forms() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 5, 8, 30, 0).unwrap();
        assert_eq!(TimeBound::parse("2024-03-05T08:30:00Z").unwrap(), TimeBound::At(expected));
        assert_eq!(
            TimeBound::parse("2024-03-05T10:30:00+02:00").unwrap(),
            TimeBound::At(expected)
        );
        assert_eq!(TimeBound::parse("2024-03-05 08:30:00").unwrap(), TimeBound::At(expected));
        assert_eq!(
            TimeBound::parse("2024-03-05").unwrap(),
            TimeBound::At(Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap())
        );
        assert_eq!(
            TimeBound::parse(&expected.timestamp_millis().to_string()).unwrap(),
            TimeBound::At(expected)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for input in ["", "soon", "5x", "m", "-5m", "2024-13-01", "yesterday"] {
            let err = TimeBound::parse(input).unwrap_err();
            assert_eq!(
                err,
                FilterError::InvalidTime {
                    input: input.to_string()
                }
            );
        }
    }

    #[test]
    fn test_errors_only() {
        let records = vec![
            rec(Level::Info, "a", 5),
            rec(Level::Error, "b", 4),
            rec(Level::Warn, "c", 3),
            rec(Level::Critical, "d", 2),
        ];
        let out = LogFilter::new().errors_only().apply_at(&records, now());
        let messages: Vec<_> = out.iter().map(|r| r.message.as_str()).collect();
        assert_eq!(messages, ["b", "d"]);
    }

    #[test]
    fn test_last_applies_after_predicates() {
        let records: Vec<_> = (0..10)
            .map(|i| rec(if i % 2 == 0 { Level::Error } else { Level::Info }, &i.to_string(), 20 - i))
            .collect();
        let out = LogFilter::new().errors_only().last(2).apply_at(&records, now());
        let messages: Vec<_> = out.iter().map(|r| r.message.as_str()).collect();
        assert_eq!(messages, ["6", "8"]);
    }

    #[test]
    fn test_first_then_last() {
        let records: Vec<_> = (0..6).map(|i| rec(Level::Info, &i.to_string(), 10 - i)).collect();
        let out = LogFilter::new().first(4).last(2).apply_at(&records, now());
        let messages: Vec<_> = out.iter().map(|r| r.message.as_str()).collect();
        assert_eq!(messages, ["2", "3"]);
    }

    #[test]
    fn test_since_relative() {
        let records = vec![rec(Level::Info, "old", 90), rec(Level::Info, "new", 10)];
        let out = LogFilter::new().since_expr("1h").unwrap().apply_at(&records, now());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].message, "new");
    }

    #[test]
    fn test_until_absolute() {
        let records = vec![rec(Level::Info, "old", 90), rec(Level::Info, "new", 10)];
        let cutoff = (now() - TimeDelta::try_minutes(30).unwrap()).to_rfc3339();
        let out = LogFilter::new().until_expr(&cutoff).unwrap().apply_at(&records, now());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].message, "old");
    }

    #[test]
    fn test_prefix_allow_and_deny() {
        let mk = |p: Option<&str>| {
            let r = LogRecord::new(Level::Info, "m");
            Arc::new(match p {
                Some(p) => r.with_prefix(p),
                None => r,
            })
        };
        let records = vec![mk(Some("api")), mk(Some("api:auth")), mk(Some("db")), mk(None)];

        let allowed = LogFilter::new().prefix("api").apply_at(&records, now());
        assert_eq!(allowed.len(), 2);

        let denied = LogFilter::new().exclude_prefix("api").apply_at(&records, now());
        let prefixes: Vec<_> = denied.iter().map(|r| r.prefix.clone()).collect();
        assert_eq!(prefixes, [Some("db".to_string()), None]);

        let both = LogFilter::new()
            .prefix("api")
            .exclude_prefix("api:auth")
            .apply_at(&records, now());
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].prefix.as_deref(), Some("api"));
    }

    #[test]
    fn test_prefix_match_is_segment_aware() {
        assert!(prefix_matches("api", "api:v2"));
        assert!(!prefix_matches("api", "apiserver"));
    }

    #[test]
    fn test_search_covers_args_case_insensitive() {
        let records = vec![
            Arc::new(
                LogRecord::new(Level::Info, "login")
                    .with_arg(Value::object([("user", Value::from("Alice"))])),
            ),
            Arc::new(LogRecord::new(Level::Info, "logout")),
        ];
        let out = LogFilter::new().search("alice").apply_at(&records, now());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].message, "login");
    }

    #[test]
    fn test_with_location_and_levels_compose() {
        let records = vec![
            Arc::new(
                LogRecord::new(Level::Warn, "a").with_location(SourceLocation::new("x.rs", 1, 1)),
            ),
            Arc::new(LogRecord::new(Level::Warn, "b")),
            Arc::new(
                LogRecord::new(Level::Debug, "c").with_location(SourceLocation::new("y.rs", 2, 1)),
            ),
        ];
        let out = LogFilter::new()
            .with_location()
            .level(Level::Warn)
            .apply_at(&records, now());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].message, "a");
    }

    #[test]
    fn test_empty_filter_passes_everything() {
        let filter = LogFilter::new();
        assert!(filter.is_empty());
        let records = vec![rec(Level::Debug, "x", 1)];
        assert_eq!(filter.apply_at(&records, now()).len(), 1);
    }
}
