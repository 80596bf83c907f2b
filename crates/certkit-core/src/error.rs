//! # Error Types
//!
//! Errors raised while parsing or applying path expressions. Uses
//! `thiserror` for derive-based `Display` and `Error` implementations.

use thiserror::Error;

/// Error raised by path parsing and field injection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The path is malformed, or uses syntax the fallback walk cannot
    /// follow (wildcards, filters, indices) when nothing matched.
    #[error("invalid path {path}: {reason}")]
    Invalid {
        /// The path expression as written by the caller.
        path: String,
        /// Why the path was rejected.
        reason: String,
    },

    /// The fallback walk reached a missing component that is not the last
    /// one. Intermediate structure is never created.
    #[error("path is not valid: {path} (missing intermediate field `{missing}`)")]
    Ambiguous {
        /// The path expression as written by the caller.
        path: String,
        /// The first component that does not exist in the document.
        missing: String,
    },
}

impl PathError {
    pub(crate) fn invalid(path: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}
