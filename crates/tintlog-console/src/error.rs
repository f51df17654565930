//! Rendering errors.
//!
//! These never reach logging callers: the renderer catches them and drops to
//! the plain composer for the offending call.

use std::fmt;

/// Why a style could not be compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// A CSS declaration was malformed.
    InvalidStyle { declaration: String, reason: String },
}

impl RenderError {
    pub(crate) fn invalid_style(declaration: &str, reason: &str) -> Self {
        Self::InvalidStyle {
            declaration: declaration.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidStyle {
                declaration,
                reason,
            } => write!(f, "invalid style declaration '{declaration}': {reason}"),
        }
    }
}

impl std::error::Error for RenderError {}
