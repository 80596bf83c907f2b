//! # Credential Error Types
//!
//! Every failure in template building or batch instantiation. The batch
//! is fail-fast, so each variant carries enough context (file path, uid,
//! column name) to act on without rerunning.

use std::path::PathBuf;

use certkit_core::PathError;
use certkit_schema::SchemaValidationError;
use thiserror::Error;

/// Errors from template building and batch instantiation.
#[derive(Error, Debug)]
pub enum CredentialError {
    /// A field injection path was invalid or ambiguous.
    #[error("field injection failed: {0}")]
    Path(#[from] PathError),

    /// Roster columns and per-recipient field configuration disagree.
    #[error("missing fields: {0}")]
    MissingFields(String),

    /// An instantiated document failed schema validation.
    #[error("certificate {uid} failed validation: {source}")]
    Validation {
        /// The uid of the rejected certificate.
        uid: String,
        /// The validator's report.
        #[source]
        source: SchemaValidationError,
    },

    /// A schema could not be loaded.
    #[error("schema error: {0}")]
    Schema(#[source] SchemaValidationError),

    /// Reading or writing a file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// The file or directory involved.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed or serialized.
    #[error("JSON error in {path}: {source}")]
    Json {
        /// The file involved.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// The roster file is malformed.
    #[error("roster {path}: {reason}")]
    Roster {
        /// The roster file.
        path: PathBuf,
        /// What is wrong with it.
        reason: String,
    },

    /// The configuration file could not be parsed.
    #[error("failed to parse configuration {path}: {detail}")]
    ConfigParse {
        /// The configuration file.
        path: PathBuf,
        /// Parser message.
        detail: String,
    },

    /// A required configuration value is missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),

    /// The template does not have the shape its schema version requires.
    #[error("template does not match {version} layout: {reason}")]
    Template {
        /// The schema version being instantiated.
        version: String,
        /// What is missing.
        reason: String,
    },
}

impl CredentialError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}
