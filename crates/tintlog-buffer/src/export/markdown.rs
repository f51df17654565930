use std::fmt::Write as _;
use std::sync::Arc;

use tintlog_console::Theme;
use tintlog_core::{Level, LogRecord};

use super::{Exporter, GroupBy, timestamp};
use crate::stats::LevelCounts;

// Inline text must not open code spans or break the bullet onto a new line.
fn inline(text: &str) -> String {
    text.replace('\n', " ").replace('`', "'")
}

fn bullet(out: &mut String, record: &LogRecord, styled: bool, theme: &Theme) {
    out.push_str("- ");
    if styled {
        out.push_str(&theme.style(record.level).icon);
        out.push(' ');
    }
    let _ = write!(
        out,
        "`{}` **{}**",
        timestamp(&record.timestamp),
        record.level.label()
    );
    if let Some(prefix) = &record.prefix {
        let _ = write!(out, " [{}]", inline(prefix));
    }
    let _ = write!(out, " {}", inline(&record.message));
    if let Some(loc) = &record.location {
        let _ = write!(out, " (`{}`)", inline(&loc.to_string()));
    }
    out.push('\n');
}

fn summary(out: &mut String, records: &[Arc<LogRecord>]) {
    let counts = LevelCounts::tally(records.iter().map(AsRef::as_ref));
    let _ = writeln!(out, "- **Total records:** {}", records.len());
    let _ = writeln!(out, "- **Errors:** {}", counts.errors());
    let _ = writeln!(out, "- **Warnings:** {}", counts.warn);
    let oldest = records.iter().map(|r| r.timestamp).min();
    let newest = records.iter().map(|r| r.timestamp).max();
    if let (Some(oldest), Some(newest)) = (oldest, newest) {
        let _ = writeln!(
            out,
            "- **Time range:** {} to {}",
            timestamp(&oldest),
            timestamp(&newest)
        );
    }
    out.push('\n');
}

fn section(
    out: &mut String,
    title: &str,
    group: &[&Arc<LogRecord>],
    first: &mut bool,
    styled: bool,
    theme: &Theme,
) {
    if !*first {
        out.push('\n');
    }
    *first = false;
    let _ = writeln!(out, "## {} ({})\n", title, group.len());
    for record in group {
        bullet(out, record, styled, theme);
    }
}

pub(super) fn render(records: &[Arc<LogRecord>], ctx: &Exporter<'_>) -> String {
    let theme = ctx.theme;
    let styled = ctx.options.styled;
    let mut out = String::from("# Log Export\n\n");
    if ctx.options.summary {
        summary(&mut out, records);
    }

    if records.is_empty() {
        out.push_str("_No records._\n");
        return out;
    }

    match ctx.options.group_by {
        None => {
            out.push_str("## Records\n\n");
            for record in records {
                bullet(&mut out, record, styled, theme);
            }
        }
        Some(GroupBy::Level) => {
            let mut first = true;
            for level in Level::ALL {
                let group: Vec<_> = records.iter().filter(|r| r.level == level).collect();
                if !group.is_empty() {
                    section(&mut out, level.label(), &group, &mut first, styled, theme);
                }
            }
        }
        Some(GroupBy::Prefix) => {
            // Sections in order of first appearance.
            let mut order: Vec<Option<&str>> = Vec::new();
            for record in records {
                let prefix = record.prefix.as_deref();
                if !order.contains(&prefix) {
                    order.push(prefix);
                }
            }
            let mut first = true;
            for prefix in order {
                let group: Vec<_> = records
                    .iter()
                    .filter(|r| r.prefix.as_deref() == prefix)
                    .collect();
                let title = prefix.map_or_else(|| "(none)".to_string(), inline);
                section(&mut out, &title, &group, &mut first, styled, theme);
            }
        }
    }
    out
}
