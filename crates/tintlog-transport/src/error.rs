//! Transport error types.

use std::fmt;

/// Errors from delivering records to an external sink.
#[derive(Debug)]
pub enum TransportError {
    /// The endpoint answered with a non-success status.
    Status { status: u16, body: String },
    /// The HTTP request could not be completed.
    Request(reqwest::Error),
    /// File I/O failed.
    Io(std::io::Error),
    /// Record encoding failed.
    Json(serde_json::Error),
    /// A configured header name or value is not valid HTTP.
    InvalidHeader { name: String },
    /// The transport was closed and accepts no more records.
    Closed,
    /// A transform or write panicked.
    Panicked { name: String },
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status { status, body } => {
                write!(f, "endpoint returned HTTP {status}")?;
                if !body.is_empty() {
                    write!(f, ": {body}")?;
                }
                Ok(())
            }
            Self::Request(e) => write!(f, "HTTP request failed: {e}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Json(e) => write!(f, "JSON error: {e}"),
            Self::InvalidHeader { name } => write!(f, "invalid HTTP header: {name}"),
            Self::Closed => write!(f, "transport closed"),
            Self::Panicked { name } => write!(f, "transport '{name}' panicked"),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Request(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::Request(err)
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}
