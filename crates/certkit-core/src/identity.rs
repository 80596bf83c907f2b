//! # Certificate Identifiers
//!
//! Every issued document carries a unique id that is embedded in the
//! assertion and used as its output filename (`<uid>.json`). The id is
//! either a random UUID or, for human-readable filenames, derived from a
//! stable certificate name plus the recipient identity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix used when a uid is embedded as a URN.
pub const URN_UUID_PREFIX: &str = "urn:uuid:";

/// How instance uids (and so output filenames) are formed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilenameFormat {
    /// Random UUID v4.
    #[default]
    Uuid,
    /// Certificate name followed by recipient identity, alphanumerics only.
    CertnameIdentity,
}

impl FromStr for FilenameFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uuid" => Ok(Self::Uuid),
            "certname_identity" => Ok(Self::CertnameIdentity),
            other => Err(format!(
                "unknown filename format `{other}` (expected `uuid` or `certname_identity`)"
            )),
        }
    }
}

/// Unique id of one issued certificate. Always filename-safe.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CertUid(String);

impl CertUid {
    /// Generate a random UUID v4 uid.
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Derive a uid from a stable name and the recipient identity.
    ///
    /// Every non-alphanumeric character is dropped. Returns `None` when
    /// nothing is left.
    pub fn derived(stable_name: Option<&str>, identity: &str) -> Option<Self> {
        let uid: String = stable_name
            .unwrap_or_default()
            .chars()
            .chain(identity.chars())
            .filter(|c| c.is_alphanumeric())
            .collect();
        (!uid.is_empty()).then_some(Self(uid))
    }

    /// The raw uid string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The uid as `urn:uuid:<uid>`.
    pub fn to_urn(&self) -> String {
        format!("{URN_UUID_PREFIX}{}", self.0)
    }

    /// The output filename for this uid.
    pub fn file_name(&self) -> String {
        format!("{}.json", self.0)
    }
}

impl fmt::Display for CertUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_uids_are_uuids() {
        let uid = CertUid::random();
        assert!(Uuid::parse_str(uid.as_str()).is_ok());
        assert_ne!(uid, CertUid::random());
    }

    #[test]
    fn derived_strips_non_alphanumerics() {
        let uid = CertUid::derived(Some("Master of Puppets"), "a.b-c@d.com").unwrap();
        assert_eq!(uid.as_str(), "MasterofPuppetsabcdcom");
        assert_eq!(uid.file_name(), "MasterofPuppetsabcdcom.json");
    }

    #[test]
    fn derived_without_stable_name_uses_identity() {
        let uid = CertUid::derived(None, "holder@example.org").unwrap();
        assert_eq!(uid.as_str(), "holderexampleorg");
    }

    #[test]
    fn derived_rejects_empty_result() {
        assert!(CertUid::derived(Some("--"), "@.").is_none());
    }

    #[test]
    fn urn_form() {
        let uid = CertUid::derived(None, "abc").unwrap();
        assert_eq!(uid.to_urn(), "urn:uuid:abc");
    }

    #[test]
    fn filename_format_parses() {
        assert_eq!("uuid".parse::<FilenameFormat>().unwrap(), FilenameFormat::Uuid);
        assert_eq!(
            "certname_identity".parse::<FilenameFormat>().unwrap(),
            FilenameFormat::CertnameIdentity
        );
        assert!("name".parse::<FilenameFormat>().is_err());
    }
}
