//! Error types for tintlog-core.

use std::fmt;

/// Errors raised while serializing an argument graph.
///
/// The default configuration never produces these; they appear only under
/// [`CircularPolicy::Error`](crate::CircularPolicy::Error) or when a custom
/// serializer reports a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerializeError {
    /// A reference cycle was found at the given dotted path.
    Circular { path: String },
    /// A registered serializer rejected its input.
    Serializer { name: String, message: String },
}

impl SerializeError {
    /// Convenience constructor for custom serializers.
    #[must_use]
    pub fn serializer(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Serializer {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SerializeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Circular { path } => write!(f, "circular reference detected at {path}"),
            Self::Serializer { name, message } => {
                write!(f, "serializer '{name}' failed: {message}")
            }
        }
    }
}

impl std::error::Error for SerializeError {}
