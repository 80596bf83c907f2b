//! # Template Builder
//!
//! Builds the certificate template for the configured schema version.
//! The template is a complete document except for merge tags, which the
//! batch instantiator replaces for each recipient:
//!
//! | Tag | Replaced with |
//! |-----|---------------|
//! | `*|DATE|*` | issuance timestamp |
//! | `*|CERTUID|*` | certificate uid |
//! | `*|EMAIL|*` | recipient identity |
//! | `*|NAME|*`, `*|FNAME|*`, `*|LNAME|*` | recipient name |
//! | `*|PUBKEY|*` | recipient public key |
//!
//! Once the version's sections are assembled, every configured global
//! field and then every per-recipient field (with its placeholder value)
//! is injected.

use std::path::PathBuf;

use certkit_core::{FieldInjector, SchemaVersion, URN_UUID_PREFIX};
use serde_json::{json, Map, Value};
use url::Url;
use uuid::Uuid;

use crate::config::Config;
use crate::error::CredentialError;
use crate::image::TemplateImages;
use crate::layout::PUBKEY_PREFIX;

pub const BLOCKCERTS_V1_CONTEXT: &str = "https://w3id.org/blockcerts/v1";
pub const OPEN_BADGES_V2_CONTEXT: &str = "https://w3id.org/openbadges/v2";
pub const BLOCKCERTS_V2_CONTEXT: &str = "https://w3id.org/blockcerts/v2";
pub const VERIFIABLE_CREDENTIAL_V1_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";
pub const BLOCKCERTS_V3_CONTEXT: &str = "https://w3id.org/blockcerts/v3";
pub const CREDENTIAL_EXAMPLES_CONTEXT: &str = "https://www.w3.org/2018/credentials/examples/v1";

/// Build the template document for `config.schema_version`.
///
/// # Errors
///
/// - [`CredentialError::Config`] if a value the version needs is missing.
/// - [`CredentialError::Path`] if a configured field cannot be injected.
pub fn create_certificate_template(
    config: &Config,
    images: &TemplateImages,
) -> Result<Value, CredentialError> {
    let mut template = match config.schema_version {
        SchemaVersion::V1_2 => v1_2::document(config, images)?,
        SchemaVersion::V2 => v2::document(config, images)?,
        SchemaVersion::V3 => v3::document(config)?,
    };

    let injector = FieldInjector::new();
    injector.apply_all(&mut template, config.additional_global_fields.specs())?;
    injector.apply_all(&mut template, config.additional_per_recipient_fields.specs())?;
    Ok(template)
}

/// Build the template and write it to [`Config::template_path`].
///
/// Returns the path written.
///
/// # Errors
///
/// Any error from image loading, [`create_certificate_template`], or
/// writing the file.
pub fn write_certificate_template(config: &Config) -> Result<PathBuf, CredentialError> {
    let images = TemplateImages::load(config)?;
    let template = create_certificate_template(config, &images)?;

    let path = config.template_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| CredentialError::io(parent, e))?;
    }
    let body = serde_json::to_string_pretty(&template).map_err(|e| CredentialError::json(&path, e))?;
    std::fs::write(&path, body).map_err(|e| CredentialError::io(&path, e))?;

    tracing::info!(
        version = %config.schema_version,
        path = %path.display(),
        "wrote certificate template"
    );
    Ok(path)
}

/// Insert `value` under `key` only when it is present.
fn insert_some(object: &mut Map<String, Value>, key: &str, value: Option<&String>) {
    if let Some(value) = value {
        object.insert(key.to_string(), Value::String(value.clone()));
    }
}

/// `base` joined with `tail` as a relative reference.
pub(crate) fn join_url(base: &str, tail: &str) -> Result<String, CredentialError> {
    let base = Url::parse(base)
        .map_err(|e| CredentialError::Config(format!("issuer_certs_url `{base}`: {e}")))?;
    base.join(tail)
        .map(String::from)
        .map_err(|e| CredentialError::Config(format!("cannot join `{tail}` onto `{base}`: {e}")))
}

mod v1_2 {
    use super::*;

    pub(super) fn document(config: &Config, images: &TemplateImages) -> Result<Value, CredentialError> {
        Ok(json!({
            "@context": BLOCKCERTS_V1_CONTEXT,
            "type": "CertificateDocument",
            "recipient": recipient(config),
            "assertion": assertion(config, images)?,
            "certificate": certificate(config, images)?,
            "verify": {
                "attribute-signed": "uid",
                "type": "ECDSA(secp256k1)"
            }
        }))
    }

    fn recipient(config: &Config) -> Value {
        json!({
            "type": "email",
            "familyName": "*|LNAME|*",
            "givenName": "*|FNAME|*",
            "publicKey": "*|PUBKEY|*",
            "identity": "*|EMAIL|*",
            "hashed": config.hash_emails
        })
    }

    fn assertion(config: &Config, images: &TemplateImages) -> Result<Value, CredentialError> {
        let certs_url = config.require(&config.issuer_certs_url, "issuer_certs_url")?;
        let mut assertion = json!({
            "type": "Assertion",
            "issuedOn": "*|DATE|*",
            "uid": "*|CERTUID|*",
            "id": join_url(certs_url, "*|CERTUID|*")?
        });
        if let Some(object) = assertion.as_object_mut() {
            insert_some(object, "image:signature", images.issuer_signature.as_ref());
        }
        Ok(assertion)
    }

    fn certificate(config: &Config, images: &TemplateImages) -> Result<Value, CredentialError> {
        let mut issuer = json!({
            "type": "Issuer",
            "url": config.issuer_url,
            "email": config.issuer_email,
            "name": config.require(&config.issuer_name, "issuer_name")?,
            "id": config.require(&config.issuer_id, "issuer_id")?
        });
        if let Some(object) = issuer.as_object_mut() {
            insert_some(object, "image", images.issuer_logo.as_ref());
        }

        let mut certificate = json!({
            "type": "Certificate",
            "name": config.require(&config.certificate_title, "certificate_title")?,
            "description": config.certificate_description,
            "language": config.certificate_language,
            "issuer": issuer
        });
        if let Some(object) = certificate.as_object_mut() {
            insert_some(object, "image", images.certificate.as_ref());
        }
        Ok(certificate)
    }
}

mod v2 {
    use super::*;

    pub(super) fn document(config: &Config, images: &TemplateImages) -> Result<Value, CredentialError> {
        let mut document = json!({
            "@context": [
                OPEN_BADGES_V2_CONTEXT,
                BLOCKCERTS_V2_CONTEXT,
                {"displayHtml": {"@id": "schema:description"}}
            ],
            "type": "Assertion",
            "issuedOn": "*|DATE|*",
            "id": format!("{URN_UUID_PREFIX}*|CERTUID|*"),
            "recipient": {
                "type": "email",
                "identity": "*|EMAIL|*",
                "hashed": config.hash_emails
            },
            "recipientProfile": {
                "type": ["RecipientProfile", "Extension"],
                "name": "*|NAME|*",
                "publicKey": format!("{PUBKEY_PREFIX}*|PUBKEY|*")
            },
            "badge": badge(config, images)?,
            "verification": {
                "type": ["MerkleProofVerification2017", "Extension"],
                "publicKey": config.issuer_public_key
            }
        });
        if let Some(object) = document.as_object_mut() {
            insert_some(object, "displayHtml", config.display_html.as_ref());
        }
        Ok(document)
    }

    fn badge(config: &Config, images: &TemplateImages) -> Result<Value, CredentialError> {
        let badge_id = match &config.badge_id {
            Some(id) => id.clone(),
            None => {
                let generated = Uuid::new_v4().to_string();
                tracing::info!(badge_id = %generated, "generated badge id");
                generated
            }
        };

        let mut issuer = json!({
            "id": config.require(&config.issuer_id, "issuer_id")?,
            "type": "Profile",
            "name": config.require(&config.issuer_name, "issuer_name")?,
            "url": config.issuer_url,
            "email": config.issuer_email,
            "revocationList": config.revocation_list
        });
        if let Some(object) = issuer.as_object_mut() {
            insert_some(object, "image", images.issuer_logo.as_ref());
        }

        let mut criteria = Map::new();
        insert_some(&mut criteria, "narrative", config.criteria_narrative.as_ref());

        let mut badge = json!({
            "type": "BadgeClass",
            "id": format!("{URN_UUID_PREFIX}{badge_id}"),
            "name": config.require(&config.certificate_title, "certificate_title")?,
            "description": config.certificate_description,
            "criteria": criteria,
            "issuer": issuer
        });
        if let Some(object) = badge.as_object_mut() {
            insert_some(object, "image", images.certificate.as_ref());
            if !config.issuer_signature_lines.is_empty() {
                object.insert("signatureLines".to_string(), signature_lines(config, images)?);
            }
        }
        Ok(badge)
    }

    fn signature_lines(config: &Config, images: &TemplateImages) -> Result<Value, CredentialError> {
        if images.signature_lines.len() != config.issuer_signature_lines.len() {
            return Err(CredentialError::Config(format!(
                "{} signature lines configured but {} signature images loaded",
                config.issuer_signature_lines.len(),
                images.signature_lines.len()
            )));
        }
        let lines = config
            .issuer_signature_lines
            .iter()
            .zip(&images.signature_lines)
            .map(|(line, image)| {
                json!({
                    "type": ["SignatureLine", "Extension"],
                    "jobTitle": line.job_title,
                    "image": image,
                    "name": line.name
                })
            })
            .collect();
        Ok(Value::Array(lines))
    }
}

mod v3 {
    use super::*;

    pub(super) fn document(config: &Config) -> Result<Value, CredentialError> {
        let mut document = assertion(config)?;
        if let Some(object) = document.as_object_mut() {
            object.insert("credentialSubject".to_string(), credential_subject(config));
        }
        Ok(document)
    }

    pub(super) fn assertion(config: &Config) -> Result<Value, CredentialError> {
        Ok(json!({
            "@context": [
                VERIFIABLE_CREDENTIAL_V1_CONTEXT,
                BLOCKCERTS_V3_CONTEXT,
                CREDENTIAL_EXAMPLES_CONTEXT
            ],
            "type": ["VerifiableCredential", "BlockcertsCredential"],
            "issuer": config.require(&config.issuer_id, "issuer_id")?,
            "issuanceDate": "*|DATE|*",
            "id": format!("{URN_UUID_PREFIX}*|CERTUID|*")
        }))
    }

    /// Example subject for configurations that do not override it.
    fn credential_subject(config: &Config) -> Value {
        json!({
            "id": format!("{PUBKEY_PREFIX}*|PUBKEY|*"),
            "alumniOf": {"id": config.issuer_url}
        })
    }
}
