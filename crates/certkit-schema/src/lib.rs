//! # certkit-schema — Unsigned Document Validation
//!
//! Every instantiated certificate is validated before it is written. This
//! crate provides the [`DocumentValidator`] seam used by the batch
//! instantiator and its JSON Schema implementation, [`SchemaValidator`].
//!
//! ## Schemas
//!
//! Draft-07 schemas for the three unsigned document shapes are compiled
//! into the crate (`schemas/blockcerts-<version>.schema.json`). A schema
//! directory holding files with the same names replaces them at runtime.
//!
//! Validation errors carry the JSON Pointer of each violating field.

pub mod validate;

// Re-export primary types.
pub use validate::{DocumentValidator, SchemaValidationDetail, SchemaValidationError, SchemaValidator};
