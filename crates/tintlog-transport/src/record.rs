//! Wire shape of a record sent to transports.

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use tintlog_core::{GroupInfo, Level, LogRecord, SerializerOptions, SerializerRegistry, SourceLocation};

/// A log record projected for external sinks.
///
/// Arguments are already serialized, so the record is plain data that can be
/// queued, transformed and retried freely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportRecord {
    pub id: String,
    /// RFC 3339, UTC, millisecond precision.
    pub timestamp: String,
    pub level: Level,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default)]
    pub args: Vec<Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<GroupInfo>,
    /// Free-form fields added by transforms.
    #[serde(default)]
    pub metadata: Map<String, Json>,
}

impl TransportRecord {
    /// Project a record, serializing its arguments through `registry`.
    ///
    /// A serializer failure does not drop the record: the arguments are
    /// replaced by the error text under `metadata.serializeError`.
    #[must_use]
    pub fn from_record(
        record: &LogRecord,
        registry: &SerializerRegistry,
        options: &SerializerOptions,
    ) -> Self {
        let mut metadata = Map::new();
        let args = match registry.serialize_args(&record.args, options) {
            Ok(args) => args,
            Err(err) => {
                metadata.insert("serializeError".into(), Json::String(err.to_string()));
                Vec::new()
            }
        };
        Self {
            id: record.id.to_string(),
            timestamp: record.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            level: record.level,
            message: record.message.clone(),
            prefix: record.prefix.clone(),
            args,
            location: record.location.clone(),
            group: record.group.clone(),
            metadata,
        }
    }

    /// Attach a metadata field.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Json>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl From<&LogRecord> for TransportRecord {
    fn from(record: &LogRecord) -> Self {
        Self::from_record(record, &SerializerRegistry::new(), &SerializerOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tintlog_core::{CircularPolicy, Value};

    #[test]
    fn test_wire_shape() {
        let record = LogRecord::new(Level::Warn, "disk")
            .with_prefix("fs")
            .with_arg(Value::from(90));
        let wire = TransportRecord::from(&record);
        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(json["id"], record.id.to_string());
        assert_eq!(json["level"], "warn");
        assert_eq!(json["prefix"], "fs");
        assert_eq!(json["args"], serde_json::json!([90]));
        assert!(json.get("location").is_none());
        assert_eq!(json["metadata"], serde_json::json!({}));
        assert!(json["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_serializer_failure_keeps_record() {
        let obj = Value::object::<&str>([]);
        obj.insert("me", obj.clone());
        let record = LogRecord::new(Level::Info, "loop").with_arg(obj);
        let wire = TransportRecord::from_record(
            &record,
            &SerializerRegistry::new(),
            &SerializerOptions::default().with_circular(CircularPolicy::Error),
        );
        assert!(wire.args.is_empty());
        assert!(wire.metadata["serializeError"].as_str().unwrap().contains("circular"));
    }

    #[test]
    fn test_deserializes_without_optional_fields() {
        let wire: TransportRecord = serde_json::from_str(
            r#"{"id":"log-1","timestamp":"2024-01-01T00:00:00.000Z","level":"info","message":"m"}"#,
        )
        .unwrap();
        assert!(wire.args.is_empty());
        assert!(wire.prefix.is_none());
    }
}
