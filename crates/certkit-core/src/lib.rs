//! # certkit-core — Foundational Types for certkit
//!
//! The leaf crate of the workspace. Everything that both the template
//! builder and the batch instantiator need lives here:
//!
//! 1. **Path expressions.** [`PathExpression`] parses the dotted/bracket
//!    syntax (`$.assertion.evidence[0]`) into typed [`PathStep`]s.
//!
//! 2. **Field injection.** [`FieldInjector`] resolves a path with a
//!    [`PathMatcher`] (full JSONPath query first, plain chain walk as the
//!    fallback) and writes a value at every matched location, creating the
//!    final key when the path does not yet resolve.
//!
//! 3. **Field specs.** [`FieldSpec`] is one caller-declared injection,
//!    either global or resolved per recipient from a roster column.
//!
//! 4. **Recipient hashing.** [`hash_and_salt_identity`] produces the
//!    `sha256$<hex>` identity form used when emails are hashed.
//!
//! 5. **Certificate ids and versions.** [`CertUid`] and [`SchemaVersion`].
//!
//! ## Crate Policy
//!
//! - No dependencies on other `certkit-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod digest;
pub mod error;
pub mod field;
pub mod identity;
pub mod inject;
pub mod path;
pub mod temporal;
pub mod version;

// Re-export primary types for ergonomic imports.
pub use digest::{
    base62_encode, generate_salt, hash_and_salt_identity, verify_salted_hash, SALTED_HASH_PREFIX,
};
pub use error::PathError;
pub use field::{FieldSpec, FieldSpecList};
pub use identity::{CertUid, FilenameFormat, URN_UUID_PREFIX};
pub use inject::{set_field, ChainMatcher, FieldInjector, Location, PathMatcher, QueryMatcher};
pub use path::{PathExpression, PathStep};
pub use temporal::{format_issuance, issuance_timestamp};
pub use version::SchemaVersion;
