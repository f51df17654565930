//! Error types for filtering and export.

use std::fmt;

use tintlog_core::SerializeError;

/// A filter could not be built from its inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// A `since`/`until` expression was not a recognized time.
    InvalidTime { input: String },
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTime { input } => write!(
                f,
                "invalid time expression '{input}' (expected e.g. 30m, 2h, 1d, RFC 3339, YYYY-MM-DD or epoch millis)"
            ),
        }
    }
}

impl std::error::Error for FilterError {}

/// Export failures.
#[derive(Debug)]
pub enum ExportError {
    /// The requested format name is not one we produce.
    UnsupportedFormat(String),
    /// An argument graph could not be serialized.
    Serialize(SerializeError),
    /// JSON encoding failed.
    Json(serde_json::Error),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedFormat(name) => write!(f, "unsupported export format: {name}"),
            Self::Serialize(e) => write!(f, "failed to serialize record arguments: {e}"),
            Self::Json(e) => write!(f, "JSON encoding error: {e}"),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Serialize(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::UnsupportedFormat(_) => None,
        }
    }
}

impl From<SerializeError> for ExportError {
    fn from(err: SerializeError) -> Self {
        Self::Serialize(err)
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}
