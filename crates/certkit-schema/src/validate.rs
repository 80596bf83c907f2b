//! # Runtime Schema Validation
//!
//! Validates unsigned certificate documents against the JSON Schema
//! (Draft 7) for their [`SchemaVersion`].
//!
//! ## Design
//!
//! [`SchemaValidator`] compiles one validator per version at construction
//! time, so validating a batch of recipients never recompiles a schema.
//! Validation errors carry the schema identity, the JSON Pointer to the
//! violating field, and a human-readable message.

use std::collections::HashMap;
use std::path::Path;

use certkit_core::SchemaVersion;
use serde_json::Value;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// One schema violation.
#[derive(Debug, Clone)]
pub struct SchemaValidationDetail {
    /// The schema that was violated.
    pub schema_id: String,
    /// JSON Pointer to the violating field.
    pub instance_path: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl std::fmt::Display for SchemaValidationDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let path = if self.instance_path.is_empty() {
            "/"
        } else {
            self.instance_path.as_str()
        };
        write!(f, "{path}: {}", self.message)
    }
}

/// Errors returned by schema loading and validation.
#[derive(Error, Debug)]
pub enum SchemaValidationError {
    /// A schema file could not be read or parsed.
    #[error("failed to load schema {path}: {reason}")]
    SchemaLoadError {
        /// Path or identifier of the schema that failed to load.
        path: String,
        /// Human-readable reason for the failure.
        reason: String,
    },

    /// A schema could not be compiled into a validator.
    #[error("failed to compile schema {schema_id}: {reason}")]
    SchemaCompileError {
        /// The schema identity.
        schema_id: String,
        /// Human-readable reason.
        reason: String,
    },

    /// The document failed validation.
    #[error("{count} validation error(s) against {schema_id}: {}", summarize(.details))]
    ValidationFailed {
        /// The schema that was violated.
        schema_id: String,
        /// Number of violations found.
        count: usize,
        /// Individual violation details.
        details: Vec<SchemaValidationDetail>,
    },

    /// No schema is registered for the requested version.
    #[error("no schema registered for {0}")]
    SchemaNotFound(SchemaVersion),

    /// I/O error while reading a schema directory.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn summarize(details: &[SchemaValidationDetail]) -> String {
    details
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// ---------------------------------------------------------------------------
// Validator seam
// ---------------------------------------------------------------------------

/// Validates a finished document for one schema version.
pub trait DocumentValidator {
    /// Return `Ok(())` if `document` is a valid unsigned certificate.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaValidationError::ValidationFailed`] with every
    /// violation, or [`SchemaValidationError::SchemaNotFound`].
    fn validate(&self, document: &Value, version: SchemaVersion) -> Result<(), SchemaValidationError>;
}

// ---------------------------------------------------------------------------
// SchemaValidator
// ---------------------------------------------------------------------------

const BUNDLED: [(SchemaVersion, &str); 3] = [
    (
        SchemaVersion::V1_2,
        include_str!("../schemas/blockcerts-v1.2.schema.json"),
    ),
    (
        SchemaVersion::V2,
        include_str!("../schemas/blockcerts-v2.schema.json"),
    ),
    (
        SchemaVersion::V3,
        include_str!("../schemas/blockcerts-v3.schema.json"),
    ),
];

/// Compiled JSON Schema validators, one per [`SchemaVersion`].
pub struct SchemaValidator {
    validators: HashMap<SchemaVersion, jsonschema::Validator>,
    /// Where each schema came from: `bundled:<file>` or a filesystem path.
    sources: HashMap<SchemaVersion, String>,
}

impl std::fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("sources", &self.sources)
            .finish()
    }
}

impl SchemaValidator {
    /// Compile the schemas bundled with the crate.
    ///
    /// # Errors
    ///
    /// Returns an error only if a bundled schema is malformed.
    pub fn bundled() -> Result<Self, SchemaValidationError> {
        let mut validator = Self {
            validators: HashMap::new(),
            sources: HashMap::new(),
        };
        for (version, source) in BUNDLED {
            let label = format!("bundled:{}", version.schema_file_name());
            let schema: Value = serde_json::from_str(source).map_err(|e| {
                SchemaValidationError::SchemaLoadError {
                    path: label.clone(),
                    reason: e.to_string(),
                }
            })?;
            validator.register(version, label, &schema)?;
        }
        Ok(validator)
    }

    /// Start from the bundled schemas and replace every version whose
    /// `blockcerts-<version>.schema.json` exists in `schema_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaValidationError::SchemaLoadError`] if a schema file
    /// cannot be read or parsed, or [`SchemaValidationError::SchemaCompileError`]
    /// if it is not a valid schema.
    pub fn from_dir(schema_dir: &Path) -> Result<Self, SchemaValidationError> {
        let mut validator = Self::bundled()?;
        if !schema_dir.is_dir() {
            return Err(SchemaValidationError::SchemaLoadError {
                path: schema_dir.display().to_string(),
                reason: "not a directory".to_string(),
            });
        }

        for version in SchemaVersion::ALL {
            let path = schema_dir.join(version.schema_file_name());
            if !path.is_file() {
                continue;
            }
            let content = std::fs::read_to_string(&path).map_err(|e| {
                SchemaValidationError::SchemaLoadError {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                }
            })?;
            let schema: Value = serde_json::from_str(&content).map_err(|e| {
                SchemaValidationError::SchemaLoadError {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                }
            })?;
            tracing::debug!(%version, path = %path.display(), "using schema override");
            validator.register(version, path.display().to_string(), &schema)?;
        }
        Ok(validator)
    }

    /// Where the schema for `version` was loaded from.
    pub fn source(&self, version: SchemaVersion) -> Option<&str> {
        self.sources.get(&version).map(String::as_str)
    }

    fn register(
        &mut self,
        version: SchemaVersion,
        source: String,
        schema: &Value,
    ) -> Result<(), SchemaValidationError> {
        let compiled = jsonschema::options()
            .with_draft(jsonschema::Draft::Draft7)
            .build(schema)
            .map_err(|e| SchemaValidationError::SchemaCompileError {
                schema_id: source.clone(),
                reason: e.to_string(),
            })?;
        self.validators.insert(version, compiled);
        self.sources.insert(version, source);
        Ok(())
    }
}

impl DocumentValidator for SchemaValidator {
    fn validate(&self, document: &Value, version: SchemaVersion) -> Result<(), SchemaValidationError> {
        let validator = self
            .validators
            .get(&version)
            .ok_or(SchemaValidationError::SchemaNotFound(version))?;
        let schema_id = self.source(version).unwrap_or(version.as_str()).to_string();

        let details: Vec<SchemaValidationDetail> = validator
            .iter_errors(document)
            .map(|err| SchemaValidationDetail {
                schema_id: schema_id.clone(),
                instance_path: err.instance_path.to_string(),
                message: err.to_string(),
            })
            .collect();

        if details.is_empty() {
            Ok(())
        } else {
            Err(SchemaValidationError::ValidationFailed {
                schema_id,
                count: details.len(),
                details,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
