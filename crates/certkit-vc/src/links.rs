//! # Certificate Links
//!
//! Lists issued certificates as `<recipient name> : <url_prefix>/<uid>`
//! lines, sorted by recipient name, for mailing out to recipients.

use std::path::Path;

use certkit_core::{SchemaVersion, URN_UUID_PREFIX};
use serde_json::Value;

use crate::error::CredentialError;

/// One issued certificate.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CertificateLink {
    pub name: String,
    pub uid: String,
}

impl CertificateLink {
    /// Read the recipient name and uid from a certificate document.
    ///
    /// Returns `None` if the document has no uid. v3 documents without a
    /// `credentialSubject.name` are listed under their uid.
    pub fn from_document(document: &Value, version: SchemaVersion) -> Option<Self> {
        let text = |pointer: &str| document.pointer(pointer).and_then(Value::as_str);
        let urn_uid = || {
            text("/id").map(|id| id.strip_prefix(URN_UUID_PREFIX).unwrap_or(id).to_string())
        };

        let (uid, name) = match version {
            SchemaVersion::V1_2 => {
                let uid = text("/assertion/uid")?.to_string();
                let name = match (text("/recipient/givenName"), text("/recipient/familyName")) {
                    (Some(given), Some(family)) => format!("{given} {family}"),
                    (Some(one), None) | (None, Some(one)) => one.to_string(),
                    (None, None) => uid.clone(),
                };
                (uid, name)
            }
            SchemaVersion::V2 => {
                let uid = urn_uid()?;
                let name = text("/recipientProfile/name").map_or_else(|| uid.clone(), str::to_string);
                (uid, name)
            }
            SchemaVersion::V3 => {
                let uid = urn_uid()?;
                let name = text("/credentialSubject/name").map_or_else(|| uid.clone(), str::to_string);
                (uid, name)
            }
        };
        Some(Self { name, uid })
    }

    /// `<name> : <url_prefix>/<uid>`.
    pub fn format(&self, url_prefix: &str) -> String {
        format!("{} : {}/{}", self.name, url_prefix.trim_end_matches('/'), self.uid)
    }
}

/// Collect links for every `*.json` certificate in `dir`, sorted by name.
///
/// # Errors
///
/// - [`CredentialError::Io`] if the directory or a file cannot be read.
/// - [`CredentialError::Json`] if a file is not JSON.
/// - [`CredentialError::Template`] if a certificate has no uid.
pub fn extract_links(dir: &Path, version: SchemaVersion) -> Result<Vec<CertificateLink>, CredentialError> {
    let entries = std::fs::read_dir(dir).map_err(|e| CredentialError::io(dir, e))?;

    let mut links = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| CredentialError::io(dir, e))?.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }

        let content = std::fs::read_to_string(&path).map_err(|e| CredentialError::io(&path, e))?;
        let document: Value =
            serde_json::from_str(&content).map_err(|e| CredentialError::json(&path, e))?;
        let link = CertificateLink::from_document(&document, version).ok_or_else(|| {
            CredentialError::Template {
                version: version.to_string(),
                reason: format!("{} has no certificate uid", path.display()),
            }
        })?;
        links.push(link);
    }

    links.sort();
    tracing::debug!(dir = %dir.display(), count = links.len(), "extracted certificate links");
    Ok(links)
}

/// Write one formatted line per link to `output`.
///
/// # Errors
///
/// [`CredentialError::Io`] if the file cannot be written.
pub fn write_links(links: &[CertificateLink], url_prefix: &str, output: &Path) -> Result<(), CredentialError> {
    let mut body = String::new();
    for link in links {
        body.push_str(&link.format(url_prefix));
        body.push('\n');
    }
    std::fs::write(output, body).map_err(|e| CredentialError::io(output, e))
}
