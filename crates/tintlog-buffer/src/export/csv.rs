use std::sync::Arc;

use tintlog_core::LogRecord;

use super::{Exporter, timestamp};
use crate::error::ExportError;

const HEADER: &str = "timestamp,level,prefix,message,location,args";
const MINIMAL_HEADER: &str = "timestamp,level,prefix,message";

/// Wrap in double quotes, doubling embedded quotes.
fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

pub(super) fn render(records: &[Arc<LogRecord>], ctx: &Exporter<'_>) -> Result<String, ExportError> {
    let minimal = ctx.options.minimal;
    let mut out = String::from(if minimal { MINIMAL_HEADER } else { HEADER });
    out.push('\n');

    for record in records {
        let mut fields = vec![
            timestamp(&record.timestamp),
            record.level.as_str().to_string(),
            quote(record.prefix.as_deref().unwrap_or_default()),
            quote(&record.message),
        ];
        if !minimal {
            let location = record
                .location
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default();
            fields.push(quote(&location));
            let args = if record.args.is_empty() {
                String::new()
            } else {
                serde_json::to_string(&ctx.args_json(record)?)?
            };
            fields.push(quote(&args));
        }
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    Ok(out)
}
