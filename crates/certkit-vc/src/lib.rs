//! # certkit-vc — Certificate Templates and Batch Issuance
//!
//! Two pipeline stages over in-memory JSON documents:
//!
//! - **Template building** ([`create_certificate_template`]): assembles the
//!   sections of a certificate for the configured [`SchemaVersion`],
//!   leaving merge tags (`*|EMAIL|*`, `*|CERTUID|*`, ...) where
//!   per-recipient data goes, then applies the configured additional
//!   fields.
//! - **Batch instantiation** ([`instantiate_batch`]): clones the template
//!   for every roster row, fills in assertion and recipient data, applies
//!   per-recipient fields, validates, and writes `<uid>.json`.
//!
//! Version differences are data: each version has a [`Layout`] describing
//! where its assertion, recipient and key fields live.
//!
//! All work is synchronous and sequential. Any error aborts the run.
//!
//! [`SchemaVersion`]: certkit_core::SchemaVersion

pub mod config;
pub mod error;
pub mod image;
pub mod instantiate;
pub mod layout;
pub mod links;
pub mod roster;
pub mod template;

// Re-export primary types.
pub use config::{Config, SignatureLine};
pub use error::CredentialError;
pub use image::{encode_image, TemplateImages};
pub use instantiate::{
    certificate_uid, create_unsigned_certificates, instantiate_batch, BatchReport, Instantiation,
};
pub use layout::{IdForm, Layout, NameFields, PUBKEY_PREFIX};
pub use links::{extract_links, write_links, CertificateLink};
pub use roster::{parse_roster, read_roster, Recipient, RecipientName};
pub use template::{create_certificate_template, write_certificate_template};
