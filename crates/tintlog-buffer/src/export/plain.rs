use std::fmt::Write as _;
use std::sync::Arc;

use tintlog_console::color::{self, ColorCapability};
use tintlog_console::style::RESET;
use tintlog_core::LogRecord;

use super::{Exporter, timestamp};

pub(super) fn render(records: &[Arc<LogRecord>], ctx: &Exporter<'_>) -> String {
    let theme = ctx.theme;
    let mut out = String::new();
    for record in records {
        let level = format!("{:<8}", record.level.label());
        let _ = write!(out, "{} ", timestamp(&record.timestamp));
        if ctx.options.styled {
            let code = color::fg(&theme.style(record.level).color, ColorCapability::Basic);
            let _ = write!(out, "{code}{level}{RESET}");
        } else {
            out.push_str(&level);
        }
        if let Some(prefix) = &record.prefix {
            let _ = write!(out, " [{prefix}]");
        }
        let _ = write!(out, " {}", record.message);
        if !ctx.options.minimal {
            if let Some(loc) = &record.location {
                let _ = write!(out, " ({loc})");
            }
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::super::{ExportFormat, ExportOptions, export};
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;
    use tintlog_console::Theme;
    use tintlog_core::{Level, LogRecord, SourceLocation};

    fn record() -> Arc<LogRecord> {
        Arc::new(
            LogRecord::new(Level::Warn, "retrying")
                .with_timestamp(Utc.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).unwrap())
                .with_prefix("net")
                .with_location(SourceLocation::new("src/net.rs", 40, 9)),
        )
    }

    #[test]
    fn test_fixed_width_level_and_location() {
        let out = export(&[record()], ExportFormat::Plain, &ExportOptions::default()).unwrap();
        assert_eq!(
            out,
            "2024-02-03T04:05:06.000Z WARN     [net] retrying (src/net.rs:40:9)\n"
        );
    }

    #[test]
    fn test_minimal_drops_location() {
        let out = export(&[record()], ExportFormat::Plain, &ExportOptions::new().minimal(true)).unwrap();
        assert!(!out.contains("src/net.rs"));
    }

    #[test]
    fn test_styled_uses_configured_theme() {
        let mut theme = Theme::default();
        theme.levels.warn.color = "#ff0000".into();
        let options = ExportOptions::new().styled(true).theme(theme);
        let out = export(&[record()], ExportFormat::Plain, &options).unwrap();
        assert!(out.contains("\x1b[31mWARN"));
    }

    #[test]
    fn test_styled_colors_level_only() {
        let out = export(&[record()], ExportFormat::Plain, &ExportOptions::new().styled(true)).unwrap();
        assert!(out.contains("\x1b["));
        assert!(out.contains("WARN    \x1b[0m [net] retrying"));
    }
}
