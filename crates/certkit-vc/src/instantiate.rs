//! # Batch Instantiator
//!
//! Turns a template plus a roster into one unsigned certificate per
//! recipient. For every recipient, strictly in roster order:
//!
//! 1. Deep-copy the template.
//! 2. Pick the certificate uid ([`certificate_uid`]).
//! 3. With `no_clobber`, skip the recipient if `<uid>.json` already exists.
//! 4. Fill in the assertion (issuance date, id) and the recipient
//!    (identity, optional salted hash, name, public key).
//! 5. Inject per-recipient fields from the recipient's extra columns.
//! 6. Validate against the version's schema.
//! 7. Write `<unsigned_certificates_dir>/<uid>.json`.
//!
//! The first error aborts the batch. Files already written stay on disk.

use std::path::{Path, PathBuf};

use certkit_core::{
    generate_salt, hash_and_salt_identity, issuance_timestamp, CertUid, FieldInjector,
    FilenameFormat,
};
use certkit_schema::{DocumentValidator, SchemaValidator};
use serde_json::{json, Value};

use crate::config::Config;
use crate::error::CredentialError;
use crate::layout::{IdForm, Layout, NameFields};
use crate::roster::{read_roster, Recipient, RecipientName};
use crate::template::join_url;

/// Outcome of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Certificates written, in roster order.
    pub written: Vec<PathBuf>,
    /// Existing certificates left untouched because of `no_clobber`.
    pub skipped: Vec<PathBuf>,
}

/// The uid for one recipient's certificate.
///
/// # Errors
///
/// [`CredentialError::Config`] if a derived uid would be empty.
pub fn certificate_uid(
    format: FilenameFormat,
    layout: &Layout,
    template: &Value,
    identity: &str,
) -> Result<CertUid, CredentialError> {
    match format {
        FilenameFormat::Uuid => Ok(CertUid::random()),
        FilenameFormat::CertnameIdentity => {
            CertUid::derived(layout.stable_name(template), identity).ok_or_else(|| {
                CredentialError::Config(format!(
                    "certname_identity uid for `{identity}` has no alphanumeric characters"
                ))
            })
        }
    }
}

/// Per-batch instantiation state: one issuance timestamp shared by every
/// certificate in the run.
#[derive(Debug, Clone)]
pub struct Instantiation<'a> {
    config: &'a Config,
    layout: &'static Layout,
    issued_on: String,
    injector: FieldInjector,
}

impl<'a> Instantiation<'a> {
    /// Start a batch issued now.
    pub fn new(config: &'a Config) -> Self {
        Self::issued_at(config, issuance_timestamp())
    }

    /// Start a batch with a fixed issuance timestamp.
    pub fn issued_at(config: &'a Config, issued_on: impl Into<String>) -> Self {
        Self {
            config,
            layout: Layout::for_version(config.schema_version),
            issued_on: issued_on.into(),
            injector: FieldInjector::new(),
        }
    }

    pub fn issued_on(&self) -> &str {
        &self.issued_on
    }

    pub fn layout(&self) -> &'static Layout {
        self.layout
    }

    /// Build one recipient's certificate from `template`. Does not validate.
    ///
    /// # Errors
    ///
    /// - [`CredentialError::Template`] if the template lacks a section the
    ///   version needs.
    /// - [`CredentialError::MissingFields`] if roster columns and
    ///   per-recipient field configuration disagree.
    /// - [`CredentialError::Path`] if a per-recipient field cannot be set.
    pub fn instantiate(
        &self,
        template: &Value,
        recipient: &Recipient,
        uid: &CertUid,
    ) -> Result<Value, CredentialError> {
        let mut certificate = template.clone();
        self.instantiate_assertion(&mut certificate, uid)?;
        self.instantiate_recipient(&mut certificate, recipient)?;
        self.apply_recipient_fields(&mut certificate, recipient)?;
        Ok(certificate)
    }

    fn instantiate_assertion(&self, certificate: &mut Value, uid: &CertUid) -> Result<(), CredentialError> {
        let layout = self.layout;
        let id = match layout.id_form {
            IdForm::Urn => uid.to_urn(),
            IdForm::Url => {
                let base = self
                    .config
                    .require(&self.config.issuer_certs_url, "issuer_certs_url")?;
                join_url(base, uid.as_str())?
            }
        };

        let assertion = layout.object_at(certificate, layout.assertion)?;
        assertion.insert(layout.issued_on_key.to_string(), json!(self.issued_on));
        if let Some(key) = layout.uid_key {
            assertion.insert(key.to_string(), json!(uid.as_str()));
        }
        assertion.insert("id".to_string(), json!(id));
        Ok(())
    }

    fn instantiate_recipient(&self, certificate: &mut Value, recipient: &Recipient) -> Result<(), CredentialError> {
        let layout = self.layout;

        if let Some(pointer) = layout.recipient {
            let block = layout.object_at(certificate, pointer)?;
            if self.config.hash_emails {
                let salt = generate_salt();
                block.insert(
                    "identity".to_string(),
                    json!(hash_and_salt_identity(&recipient.identity, &salt)),
                );
                block.insert("salt".to_string(), json!(salt));
                block.insert("hashed".to_string(), json!(true));
            } else {
                block.insert("identity".to_string(), json!(recipient.identity));
                block.insert("hashed".to_string(), json!(false));
                block.remove("salt");
            }
        }

        if let Some(pointer) = layout.profile {
            layout.put(
                certificate,
                pointer,
                json!({"type": ["RecipientProfile", "Extension"]}),
            )?;
        }

        match (layout.names, &recipient.name) {
            (NameFields::GivenFamily, RecipientName::GivenFamily { given, family }) => {
                let pointer = layout.recipient.unwrap_or_default();
                let block = layout.object_at(certificate, pointer)?;
                block.insert("givenName".to_string(), json!(given));
                block.insert("familyName".to_string(), json!(family));
            }
            (NameFields::Single(pointer), name) => {
                let block = layout.object_at(certificate, pointer)?;
                block.insert("name".to_string(), json!(name.display_name()));
            }
            (NameFields::GivenFamily, RecipientName::Full(_)) => {
                return Err(CredentialError::MissingFields(format!(
                    "{} certificates need givenName and familyName for `{}`",
                    layout.version, recipient.identity
                )));
            }
            (NameFields::None, _) => {}
        }

        layout.put(
            certificate,
            layout.public_key,
            json!(layout.format_public_key(&recipient.pubkey)),
        )
    }

    fn apply_recipient_fields(&self, certificate: &mut Value, recipient: &Recipient) -> Result<(), CredentialError> {
        let specs = &self.config.additional_per_recipient_fields;
        let extra = &recipient.additional_fields;

        if specs.is_empty() {
            if !extra.is_empty() {
                let columns: Vec<&str> = extra.keys().map(String::as_str).collect();
                return Err(CredentialError::MissingFields(format!(
                    "roster columns [{}] are not used by additional_per_recipient_fields",
                    columns.join(", ")
                )));
            }
            return Ok(());
        }
        if extra.is_empty() {
            return Err(CredentialError::MissingFields(format!(
                "expected additional recipient fields for `{}` but the roster row has none",
                recipient.identity
            )));
        }

        for spec in specs {
            let column = spec.csv_column.as_deref().ok_or_else(|| {
                CredentialError::MissingFields(format!(
                    "per-recipient field `{}` names no csv_column",
                    spec.path
                ))
            })?;
            let value = extra.get(column).ok_or_else(|| {
                CredentialError::MissingFields(format!(
                    "roster has no column `{column}` for field `{}`",
                    spec.path
                ))
            })?;
            self.injector
                .set_field(certificate, &spec.path, Value::String(value.clone()))?;
        }
        Ok(())
    }
}

/// Instantiate, validate and write a certificate for every recipient.
///
/// # Errors
///
/// The first failure aborts the batch; see [`Instantiation::instantiate`].
/// Validation failures are [`CredentialError::Validation`].
pub fn instantiate_batch(
    config: &Config,
    template: &Value,
    recipients: &[Recipient],
    validator: &dyn DocumentValidator,
) -> Result<BatchReport, CredentialError> {
    let batch = Instantiation::new(config);
    let output_dir = config.output_dir();
    std::fs::create_dir_all(&output_dir).map_err(|e| CredentialError::io(&output_dir, e))?;

    tracing::info!(
        version = %config.schema_version,
        recipients = recipients.len(),
        output = %output_dir.display(),
        "instantiating batch"
    );

    let mut report = BatchReport::default();
    for recipient in recipients {
        let uid = certificate_uid(
            config.filename_format,
            batch.layout(),
            template,
            &recipient.identity,
        )?;
        let path = output_dir.join(uid.file_name());

        if config.no_clobber && path.is_file() {
            tracing::debug!(%uid, path = %path.display(), "certificate exists, skipping");
            report.skipped.push(path);
            continue;
        }

        let certificate = batch.instantiate(template, recipient, &uid)?;
        validator
            .validate(&certificate, config.schema_version)
            .map_err(|source| CredentialError::Validation {
                uid: uid.to_string(),
                source,
            })?;
        write_certificate(&path, &certificate)?;

        tracing::debug!(%uid, identity = %recipient.identity, "wrote certificate");
        report.written.push(path);
    }

    tracing::info!(
        written = report.written.len(),
        skipped = report.skipped.len(),
        "batch complete"
    );
    Ok(report)
}

/// Read the template and roster named by `config`, validate with the
/// configured schemas, and instantiate the batch.
///
/// # Errors
///
/// Any error from reading inputs, loading schemas, or [`instantiate_batch`].
pub fn create_unsigned_certificates(config: &Config) -> Result<BatchReport, CredentialError> {
    let template = read_template(&config.template_path())?;
    let recipients = read_roster(&config.roster_path(), config.schema_version)?;
    let validator = match config.schema_dir_path() {
        Some(dir) => SchemaValidator::from_dir(&dir),
        None => SchemaValidator::bundled(),
    }
    .map_err(CredentialError::Schema)?;

    instantiate_batch(config, &template, &recipients, &validator)
}

fn read_template(path: &Path) -> Result<Value, CredentialError> {
    let content = std::fs::read_to_string(path).map_err(|e| CredentialError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| CredentialError::json(path, e))
}

fn write_certificate(path: &Path, certificate: &Value) -> Result<(), CredentialError> {
    let body = serde_json::to_string(certificate).map_err(|e| CredentialError::json(path, e))?;
    std::fs::write(path, body).map_err(|e| CredentialError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use certkit_core::{verify_salted_hash, FieldSpec, SchemaVersion};

    fn recipient(extra: &[(&str, &str)]) -> Recipient {
        Recipient {
            name: RecipientName::Full("Jane Doe".into()),
            pubkey: "1AbC".into(),
            identity: "jane@example.org".into(),
            additional_fields: extra
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn v2_template() -> Value {
        json!({
            "type": "Assertion",
            "issuedOn": "*|DATE|*",
            "id": "urn:uuid:*|CERTUID|*",
            "recipient": {"type": "email", "identity": "*|EMAIL|*", "hashed": false},
            "recipientProfile": {"name": "*|NAME|*", "publicKey": "*|PUBKEY|*"},
            "badge": {"name": "Master of Puppets"}
        })
    }

    fn config(version: SchemaVersion) -> Config {
        Config {
            schema_version: version,
            issuer_certs_url: Some("https://certs.example.org/".into()),
            ..Config::default()
        }
    }

    #[test]
    fn uuid_uids_are_random() {
        let layout = Layout::for_version(SchemaVersion::V2);
        let a = certificate_uid(FilenameFormat::Uuid, layout, &v2_template(), "x").unwrap();
        let b = certificate_uid(FilenameFormat::Uuid, layout, &v2_template(), "x").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn derived_uid_uses_stable_name_per_version() {
        let template = v2_template();
        let v2 = certificate_uid(
            FilenameFormat::CertnameIdentity,
            Layout::for_version(SchemaVersion::V2),
            &template,
            "a.b@c.com",
        )
        .unwrap();
        assert_eq!(v2.as_str(), "MasterofPuppetsabccom");

        let v3 = certificate_uid(
            FilenameFormat::CertnameIdentity,
            Layout::for_version(SchemaVersion::V3),
            &template,
            "a.b@c.com",
        )
        .unwrap();
        assert_eq!(v3.as_str(), "abccom");
    }

    #[test]
    fn empty_derived_uid_is_config_error() {
        let err = certificate_uid(
            FilenameFormat::CertnameIdentity,
            Layout::for_version(SchemaVersion::V3),
            &json!({}),
            "@.",
        )
        .unwrap_err();
        assert!(matches!(err, CredentialError::Config(_)));
    }

    #[test]
    fn v2_plaintext_identity_and_prefixed_key() {
        let config = config(SchemaVersion::V2);
        let batch = Instantiation::issued_at(&config, "2026-01-15T12:00:00.000000+00:00");
        let uid = CertUid::derived(None, "abc").unwrap();

        let cert = batch.instantiate(&v2_template(), &recipient(&[]), &uid).unwrap();
        assert_eq!(cert["issuedOn"], "2026-01-15T12:00:00.000000+00:00");
        assert_eq!(cert["id"], "urn:uuid:abc");
        assert_eq!(cert["recipient"]["identity"], "jane@example.org");
        assert_eq!(cert["recipient"]["hashed"], false);
        assert_eq!(
            cert["recipientProfile"],
            json!({
                "type": ["RecipientProfile", "Extension"],
                "name": "Jane Doe",
                "publicKey": "ecdsa-koblitz-pubkey:1AbC"
            })
        );
    }

    #[test]
    fn hashed_identity_is_reproducible_from_salt() {
        let config = Config {
            hash_emails: true,
            ..config(SchemaVersion::V2)
        };
        let batch = Instantiation::new(&config);
        let cert = batch
            .instantiate(&v2_template(), &recipient(&[]), &CertUid::random())
            .unwrap();

        let stored = cert["recipient"]["identity"].as_str().unwrap();
        let salt = cert["recipient"]["salt"].as_str().unwrap();
        assert_eq!(cert["recipient"]["hashed"], true);
        assert!(stored.starts_with("sha256$"));
        assert_eq!(stored.len(), "sha256$".len() + 64);
        assert!(verify_salted_hash("jane@example.org", salt, stored));
    }

    #[test]
    fn v1_2_assertion_id_joins_certs_url() {
        let config = config(SchemaVersion::V1_2);
        let batch = Instantiation::issued_at(&config, "now");
        let template = json!({
            "recipient": {"identity": "*|EMAIL|*", "hashed": false},
            "assertion": {"uid": "*|CERTUID|*", "id": "*|CERTUID|*"}
        });
        let person = Recipient {
            name: RecipientName::GivenFamily {
                given: "Jane".into(),
                family: "Doe".into(),
            },
            ..recipient(&[])
        };
        let uid = CertUid::derived(None, "u1").unwrap();

        let cert = batch.instantiate(&template, &person, &uid).unwrap();
        assert_eq!(cert["assertion"]["id"], "https://certs.example.org/u1");
        assert_eq!(cert["assertion"]["uid"], "u1");
        assert_eq!(cert["assertion"]["issuedOn"], "now");
        assert_eq!(cert["recipient"]["givenName"], "Jane");
        assert_eq!(cert["recipient"]["publicKey"], "1AbC");
    }

    #[test]
    fn v3_sets_subject_id_without_recipient_block() {
        let config = Config {
            hash_emails: true,
            ..config(SchemaVersion::V3)
        };
        let batch = Instantiation::issued_at(&config, "now");
        let template = json!({"credentialSubject": {"id": "*|PUBKEY|*"}});
        let cert = batch
            .instantiate(&template, &recipient(&[]), &CertUid::derived(None, "u").unwrap())
            .unwrap();
        assert_eq!(cert["issuanceDate"], "now");
        assert_eq!(cert["credentialSubject"]["id"], "ecdsa-koblitz-pubkey:1AbC");
        assert!(cert.get("recipient").is_none());
    }

    #[test]
    fn per_recipient_fields_come_from_columns() {
        let config = Config {
            additional_per_recipient_fields: vec![FieldSpec::per_recipient(
                "$.badge.evidence",
                "*|EVIDENCE|*",
                "evidence",
            )]
            .into(),
            ..config(SchemaVersion::V2)
        };
        let batch = Instantiation::new(&config);
        let cert = batch
            .instantiate(&v2_template(), &recipient(&[("evidence", "thesis.pdf")]), &CertUid::random())
            .unwrap();
        assert_eq!(cert["badge"]["evidence"], "thesis.pdf");
    }

    #[test]
    fn specs_without_columns_are_missing_fields() {
        let config = Config {
            additional_per_recipient_fields: vec![FieldSpec::per_recipient(
                "$.badge.evidence",
                "*|EVIDENCE|*",
                "evidence",
            )]
            .into(),
            ..config(SchemaVersion::V2)
        };
        let batch = Instantiation::new(&config);
        let err = batch
            .instantiate(&v2_template(), &recipient(&[]), &CertUid::random())
            .unwrap_err();
        assert!(matches!(err, CredentialError::MissingFields(_)));

        let err = batch
            .instantiate(&v2_template(), &recipient(&[("other", "x")]), &CertUid::random())
            .unwrap_err();
        assert!(err.to_string().contains("evidence"));
    }

    #[test]
    fn columns_without_specs_are_missing_fields() {
        let config = config(SchemaVersion::V2);
        let batch = Instantiation::new(&config);
        let err = batch
            .instantiate(&v2_template(), &recipient(&[("evidence", "x")]), &CertUid::random())
            .unwrap_err();
        let CredentialError::MissingFields(message) = err else {
            panic!("expected MissingFields, got {err:?}");
        };
        assert!(message.contains("evidence"));
    }

    #[test]
    fn template_missing_section_is_reported() {
        let config = config(SchemaVersion::V2);
        let batch = Instantiation::new(&config);
        let err = batch
            .instantiate(&json!({"id": "x"}), &recipient(&[]), &CertUid::random())
            .unwrap_err();
        assert!(matches!(err, CredentialError::Template { .. }));
    }
}
