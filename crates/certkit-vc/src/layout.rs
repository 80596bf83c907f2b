//! # Per-Version Document Layout
//!
//! The three certificate shapes differ in where they keep the same
//! information. A [`Layout`] records those locations as JSON Pointers so
//! the instantiator and link extractor are written once.

use certkit_core::SchemaVersion;
use serde_json::{Map, Value};

use crate::error::CredentialError;

/// Prefix marking a Bitcoin public key in v2 and v3 documents.
pub const PUBKEY_PREFIX: &str = "ecdsa-koblitz-pubkey:";

/// How the assertion `id` is formed from the certificate uid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdForm {
    /// `issuer_certs_url` joined with the uid.
    Url,
    /// `urn:uuid:<uid>`.
    Urn,
}

/// How recipient names are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameFields {
    /// `givenName` and `familyName` inside the recipient block.
    GivenFamily,
    /// A single `name` inside the block at the given pointer.
    Single(&'static str),
    None,
}

/// Where one schema version keeps assertion and recipient data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub version: SchemaVersion,
    /// Pointer to the object holding the issuance date and id.
    pub assertion: &'static str,
    pub issued_on_key: &'static str,
    /// Key for the raw uid, if the version stores it.
    pub uid_key: Option<&'static str>,
    pub id_form: IdForm,
    /// Pointer to the `{type, identity, hashed}` block, if any.
    pub recipient: Option<&'static str>,
    /// Pointer to the recipient profile extension, rebuilt per recipient.
    pub profile: Option<&'static str>,
    pub names: NameFields,
    /// Pointer to the recipient public key.
    pub public_key: &'static str,
    pub public_key_prefix: Option<&'static str>,
    /// Pointer to the certificate name used in derived uids.
    pub stable_name: Option<&'static str>,
    /// Roster columns every row must provide.
    pub required_columns: &'static [&'static str],
}

const V1_2: Layout = Layout {
    version: SchemaVersion::V1_2,
    assertion: "/assertion",
    issued_on_key: "issuedOn",
    uid_key: Some("uid"),
    id_form: IdForm::Url,
    recipient: Some("/recipient"),
    profile: None,
    names: NameFields::GivenFamily,
    public_key: "/recipient/publicKey",
    public_key_prefix: None,
    stable_name: Some("/certificate/name"),
    required_columns: &["familyName", "givenName", "pubkey", "identity"],
};

const V2: Layout = Layout {
    version: SchemaVersion::V2,
    assertion: "",
    issued_on_key: "issuedOn",
    uid_key: None,
    id_form: IdForm::Urn,
    recipient: Some("/recipient"),
    profile: Some("/recipientProfile"),
    names: NameFields::Single("/recipientProfile"),
    public_key: "/recipientProfile/publicKey",
    public_key_prefix: Some(PUBKEY_PREFIX),
    stable_name: Some("/badge/name"),
    required_columns: &["name", "pubkey", "identity"],
};

const V3: Layout = Layout {
    version: SchemaVersion::V3,
    assertion: "",
    issued_on_key: "issuanceDate",
    uid_key: None,
    id_form: IdForm::Urn,
    recipient: None,
    profile: None,
    names: NameFields::None,
    public_key: "/credentialSubject/id",
    public_key_prefix: Some(PUBKEY_PREFIX),
    stable_name: None,
    required_columns: &["name", "pubkey", "identity"],
};

impl Layout {
    pub fn for_version(version: SchemaVersion) -> &'static Layout {
        match version {
            SchemaVersion::V1_2 => &V1_2,
            SchemaVersion::V2 => &V2,
            SchemaVersion::V3 => &V3,
        }
    }

    /// The public key as it is written into the document.
    pub fn format_public_key(&self, pubkey: &str) -> String {
        match self.public_key_prefix {
            Some(prefix) if !pubkey.starts_with(prefix) => format!("{prefix}{pubkey}"),
            _ => pubkey.to_string(),
        }
    }

    /// The stable certificate name of `template`, if this version has one.
    pub fn stable_name<'a>(&self, template: &'a Value) -> Option<&'a str> {
        self.stable_name
            .and_then(|ptr| template.pointer(ptr))
            .and_then(Value::as_str)
    }

    /// The object at `pointer`, which the template must contain.
    pub(crate) fn object_at<'a>(
        &self,
        document: &'a mut Value,
        pointer: &str,
    ) -> Result<&'a mut Map<String, Value>, CredentialError> {
        document
            .pointer_mut(pointer)
            .and_then(Value::as_object_mut)
            .ok_or_else(|| CredentialError::Template {
                version: self.version.to_string(),
                reason: format!("no object at `{}`", display_pointer(pointer)),
            })
    }

    /// Set the value at `pointer`, creating only the final key.
    pub(crate) fn put(
        &self,
        document: &mut Value,
        pointer: &str,
        value: Value,
    ) -> Result<(), CredentialError> {
        let (parent, key) = pointer.rsplit_once('/').unwrap_or(("", pointer));
        self.object_at(document, parent)?.insert(key.to_string(), value);
        Ok(())
    }
}

fn display_pointer(pointer: &str) -> &str {
    if pointer.is_empty() {
        "/"
    } else {
        pointer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_version_has_a_layout() {
        for version in SchemaVersion::ALL {
            assert_eq!(Layout::for_version(version).version, version);
        }
    }

    #[test]
    fn public_key_prefix_is_applied_once() {
        let v2 = Layout::for_version(SchemaVersion::V2);
        assert_eq!(v2.format_public_key("1AbC"), "ecdsa-koblitz-pubkey:1AbC");
        assert_eq!(
            v2.format_public_key("ecdsa-koblitz-pubkey:1AbC"),
            "ecdsa-koblitz-pubkey:1AbC"
        );
        let v1 = Layout::for_version(SchemaVersion::V1_2);
        assert_eq!(v1.format_public_key("1AbC"), "1AbC");
    }

    #[test]
    fn stable_name_per_version() {
        let doc = json!({"certificate": {"name": "Cert"}, "badge": {"name": "Badge"}});
        assert_eq!(Layout::for_version(SchemaVersion::V1_2).stable_name(&doc), Some("Cert"));
        assert_eq!(Layout::for_version(SchemaVersion::V2).stable_name(&doc), Some("Badge"));
        assert_eq!(Layout::for_version(SchemaVersion::V3).stable_name(&doc), None);
    }

    #[test]
    fn put_creates_final_key_only() {
        let layout = Layout::for_version(SchemaVersion::V2);
        let mut doc = json!({"recipientProfile": {}});
        layout
            .put(&mut doc, "/recipientProfile/publicKey", json!("k"))
            .unwrap();
        assert_eq!(doc["recipientProfile"]["publicKey"], "k");

        let err = layout
            .put(&mut doc, "/credentialSubject/id", json!("k"))
            .unwrap_err();
        assert!(matches!(err, CredentialError::Template { .. }));
    }

    #[test]
    fn put_at_root() {
        let layout = Layout::for_version(SchemaVersion::V3);
        let mut doc = json!({});
        layout.put(&mut doc, "/issuanceDate", json!("now")).unwrap();
        assert_eq!(doc, json!({"issuanceDate": "now"}));
    }
}
