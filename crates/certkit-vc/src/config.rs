//! # Run Configuration
//!
//! One flat [`Config`] drives both the template builder and the batch
//! instantiator. It is read from a YAML (or JSON) file and then adjusted
//! by command-line overrides; every entry point takes it explicitly.
//!
//! Relative file paths resolve against `data_dir`.

use std::path::{Path, PathBuf};

use certkit_core::{FieldSpecList, FilenameFormat, SchemaVersion};
use serde::{Deserialize, Serialize};

use crate::error::CredentialError;

/// One signature line shown on a v2 badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureLine {
    pub job_title: String,
    /// Image file, relative to `data_dir`.
    pub signature_image: PathBuf,
    pub name: String,
}

/// Settings for template creation and batch instantiation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub schema_version: SchemaVersion,
    /// Base directory for every relative path below.
    pub data_dir: PathBuf,

    // -- Issuer --
    pub issuer_id: Option<String>,
    pub issuer_name: Option<String>,
    pub issuer_url: Option<String>,
    pub issuer_email: Option<String>,
    pub issuer_public_key: Option<String>,
    /// Base URL that v1.2 assertion ids are joined onto.
    pub issuer_certs_url: Option<String>,
    pub revocation_list: Option<String>,
    pub issuer_logo_file: Option<PathBuf>,
    pub issuer_signature_file: Option<PathBuf>,
    pub issuer_signature_lines: Vec<SignatureLine>,

    // -- Certificate --
    pub certificate_title: Option<String>,
    pub certificate_description: Option<String>,
    pub certificate_language: Option<String>,
    pub cert_image_file: Option<PathBuf>,
    pub criteria_narrative: Option<String>,
    /// v2 badge id. Generated when absent.
    pub badge_id: Option<String>,
    pub display_html: Option<String>,

    // -- Files --
    pub template_dir: PathBuf,
    pub template_file_name: String,
    pub unsigned_certificates_dir: PathBuf,
    pub roster: PathBuf,
    /// Directory of schema overrides.
    pub schema_dir: Option<PathBuf>,

    // -- Instantiation --
    pub hash_emails: bool,
    pub filename_format: FilenameFormat,
    pub no_clobber: bool,
    pub additional_global_fields: FieldSpecList,
    pub additional_per_recipient_fields: FieldSpecList,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SchemaVersion::default(),
            data_dir: PathBuf::from("."),
            issuer_id: None,
            issuer_name: None,
            issuer_url: None,
            issuer_email: None,
            issuer_public_key: None,
            issuer_certs_url: None,
            revocation_list: None,
            issuer_logo_file: None,
            issuer_signature_file: None,
            issuer_signature_lines: Vec::new(),
            certificate_title: None,
            certificate_description: None,
            certificate_language: None,
            cert_image_file: None,
            criteria_narrative: None,
            badge_id: None,
            display_html: None,
            template_dir: PathBuf::from("."),
            template_file_name: "template.json".to_string(),
            unsigned_certificates_dir: PathBuf::from("unsigned_certificates"),
            roster: PathBuf::from("roster.csv"),
            schema_dir: None,
            hash_emails: false,
            filename_format: FilenameFormat::default(),
            no_clobber: false,
            additional_global_fields: FieldSpecList::default(),
            additional_per_recipient_fields: FieldSpecList::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML or JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Io`] if the file cannot be read and
    /// [`CredentialError::ConfigParse`] if it does not deserialize.
    pub fn load(path: &Path) -> Result<Self, CredentialError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| CredentialError::io(path, e))?;
        Self::from_yaml_str(&content).map_err(|detail| CredentialError::ConfigParse {
            path: path.to_path_buf(),
            detail,
        })
    }

    /// Parse configuration text. JSON is accepted as a YAML subset.
    pub fn from_yaml_str(content: &str) -> Result<Self, String> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| e.to_string())
    }

    /// Resolve `path` against `data_dir`. Absolute paths are returned as-is.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        self.data_dir.join(path)
    }

    /// Where the template is written and read back from.
    pub fn template_path(&self) -> PathBuf {
        self.resolve(&self.template_dir).join(&self.template_file_name)
    }

    pub fn roster_path(&self) -> PathBuf {
        self.resolve(&self.roster)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.unsigned_certificates_dir)
    }

    pub fn schema_dir_path(&self) -> Option<PathBuf> {
        self.schema_dir.as_ref().map(|dir| self.resolve(dir))
    }

    /// A required string setting, or a [`CredentialError::Config`] naming it.
    pub(crate) fn require<'a>(
        &self,
        value: &'a Option<String>,
        name: &str,
    ) -> Result<&'a str, CredentialError> {
        value.as_deref().ok_or_else(|| {
            CredentialError::Config(format!(
                "`{name}` is required for {} certificates",
                self.schema_version
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_missing_keys() {
        let config = Config::from_yaml_str("issuer_name: Example University\n").unwrap();
        assert_eq!(config.issuer_name.as_deref(), Some("Example University"));
        assert_eq!(config.schema_version, SchemaVersion::V2);
        assert_eq!(config.template_file_name, "template.json");
        assert_eq!(config.filename_format, FilenameFormat::Uuid);
        assert!(!config.hash_emails);
        assert!(config.additional_per_recipient_fields.is_empty());
    }

    #[test]
    fn empty_file_is_default_config() {
        assert_eq!(Config::from_yaml_str("  \n").unwrap(), Config::default());
    }

    #[test]
    fn parses_field_specs_and_versions() {
        let yaml = r#"
schema_version: v1.2
filename_format: certname_identity
additional_global_fields:
  fields:
    - path: $.certificate.subtitle
      value: custom
additional_per_recipient_fields:
  - path: $.assertion.evidence
    value: "*|EVIDENCE|*"
    csv_column: evidence
"#;
        let config = Config::from_yaml_str(yaml).unwrap();
        assert_eq!(config.schema_version, SchemaVersion::V1_2);
        assert_eq!(config.filename_format, FilenameFormat::CertnameIdentity);
        assert_eq!(config.additional_global_fields.len(), 1);
        let spec = &config.additional_per_recipient_fields.specs()[0];
        assert_eq!(spec.csv_column.as_deref(), Some("evidence"));
    }

    #[test]
    fn json_is_accepted() {
        let config = Config::from_yaml_str(r#"{"schema_version": "v3", "no_clobber": true}"#).unwrap();
        assert_eq!(config.schema_version, SchemaVersion::V3);
        assert!(config.no_clobber);
    }

    #[test]
    fn unknown_version_is_rejected() {
        assert!(Config::from_yaml_str("schema_version: v9\n").is_err());
    }

    #[test]
    fn paths_resolve_against_data_dir() {
        let config = Config {
            data_dir: PathBuf::from("/srv/certs"),
            template_dir: PathBuf::from("templates"),
            ..Config::default()
        };
        assert_eq!(
            config.template_path(),
            PathBuf::from("/srv/certs/templates/template.json")
        );
        assert_eq!(config.roster_path(), PathBuf::from("/srv/certs/roster.csv"));
        assert_eq!(
            config.resolve("/abs/logo.png"),
            PathBuf::from("/abs/logo.png")
        );
    }

    #[test]
    fn missing_required_value_names_the_key() {
        let config = Config::default();
        let err = config.require(&config.issuer_id, "issuer_id").unwrap_err();
        assert!(err.to_string().contains("issuer_id"));
    }
}
