use std::sync::Arc;

use serde_json::{Map, Value as Json, json};
use tintlog_core::LogRecord;

use super::{Exporter, timestamp};
use crate::error::ExportError;

pub(super) fn render(records: &[Arc<LogRecord>], ctx: &Exporter<'_>) -> Result<String, ExportError> {
    let items = records
        .iter()
        .map(|r| project(r, ctx))
        .collect::<Result<Vec<_>, _>>()?;
    let array = Json::Array(items);
    let out = if ctx.options.compact {
        serde_json::to_string(&array)?
    } else {
        serde_json::to_string_pretty(&array)?
    };
    Ok(out)
}

pub(super) fn project(record: &LogRecord, ctx: &Exporter<'_>) -> Result<Json, ExportError> {
    let mut obj = Map::new();
    if !ctx.options.minimal {
        obj.insert("id".into(), json!(record.id.to_string()));
    }
    obj.insert("timestamp".into(), json!(timestamp(&record.timestamp)));
    obj.insert("level".into(), json!(record.level.as_str()));
    if let Some(prefix) = &record.prefix {
        obj.insert("prefix".into(), json!(prefix));
    }
    obj.insert("message".into(), json!(record.message));
    if ctx.options.minimal {
        return Ok(Json::Object(obj));
    }

    if !record.args.is_empty() {
        obj.insert("args".into(), ctx.args_json(record)?);
    }
    if let Some(loc) = &record.location {
        let mut l = Map::new();
        l.insert("file".into(), json!(loc.file));
        l.insert("line".into(), json!(loc.line));
        l.insert("column".into(), json!(loc.column));
        if let Some(function) = &loc.function {
            l.insert("function".into(), json!(function));
        }
        obj.insert("location".into(), Json::Object(l));
    }
    if let Some(group) = &record.group {
        let mut g = Map::new();
        g.insert("depth".into(), json!(group.depth));
        if let Some(name) = &group.name {
            g.insert("name".into(), json!(name));
        }
        obj.insert("group".into(), Json::Object(g));
    }
    Ok(Json::Object(obj))
}
