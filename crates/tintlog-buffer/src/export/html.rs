use std::fmt::Write as _;
use std::sync::Arc;

use tintlog_console::Theme;
use tintlog_console::color;
use tintlog_core::{Level, LogRecord};

use super::{Exporter, timestamp};

/// Escape text for element content and attribute values.
pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn stylesheet(theme: &Theme) -> String {
    let mut css = String::from(
        "body { font-family: ui-monospace, monospace; background: #1e1e1e; color: #ddd; margin: 1.5em; }\n\
         .log { padding: 2px 6px; border-left: 3px solid transparent; white-space: pre-wrap; }\n\
         .time, .location { color: #888; }\n\
         .prefix { color: #9cdcfe; }\n\
         .level { display: inline-block; min-width: 6em; font-weight: bold; }\n",
    );
    for level in Level::ALL {
        let hex = color::to_hex(&theme.style(level).color);
        let _ = writeln!(
            css,
            ".level-{name} {{ border-left-color: {hex}; }}\n.level-{name} .level {{ color: {hex}; }}",
            name = level.as_str(),
        );
    }
    css
}

pub(super) fn render(records: &[Arc<LogRecord>], ctx: &Exporter<'_>) -> String {
    let theme = ctx.theme;
    let mut out = String::from(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>Log Export</title>\n<style>\n",
    );
    out.push_str(&stylesheet(theme));
    out.push_str("</style>\n</head>\n<body>\n");
    let _ = writeln!(out, "<h1>Log Export ({} records)</h1>", records.len());
    out.push_str("<div class=\"logs\">\n");

    for record in records {
        let _ = write!(
            out,
            "<div class=\"log level-{}\"><span class=\"time\">{}</span> <span class=\"level\">{}</span>",
            record.level.as_str(),
            timestamp(&record.timestamp),
            record.level.label()
        );
        if let Some(prefix) = &record.prefix {
            let _ = write!(out, " <span class=\"prefix\">[{}]</span>", escape(prefix));
        }
        let _ = write!(out, " <span class=\"message\">{}</span>", escape(&record.message));
        if !ctx.options.minimal {
            if let Some(loc) = &record.location {
                let _ = write!(
                    out,
                    " <span class=\"location\">{}</span>",
                    escape(&loc.to_string())
                );
            }
        }
        out.push_str("</div>\n");
    }

    out.push_str("</div>\n</body>\n</html>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::super::{ExportFormat, ExportOptions, export};
    use super::escape;
    use std::sync::Arc;
    use tintlog_core::{Level, LogRecord, SourceLocation};

    #[test]
    fn test_escape_all_special_chars() {
        assert_eq!(escape(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn test_message_and_location_are_escaped() {
        let recs = vec![Arc::new(
            LogRecord::new(Level::Error, "<script>alert(1)</script>")
                .with_location(SourceLocation::new("<src>/a.rs", 1, 1)),
        )];
        let out = export(&recs, ExportFormat::Html, &ExportOptions::default()).unwrap();
        assert!(!out.contains("<script>"));
        assert!(out.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(out.contains("&lt;src&gt;/a.rs:1:1"));
        assert!(out.contains("class=\"log level-error\""));
    }

    #[test]
    fn test_stylesheet_has_every_level_class() {
        let out = export(&[], ExportFormat::Html, &ExportOptions::default()).unwrap();
        for level in Level::ALL {
            assert!(out.contains(&format!(".level-{} {{", level.as_str())));
        }
        assert!(out.contains("(0 records)"));
    }
}
