//! # Recipient Roster
//!
//! Reads the roster CSV (header row required). Each row yields a
//! [`Recipient`]: the fixed identity columns for the schema version, plus
//! every other column in `additional_fields`, which feed per-recipient
//! field specs.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use certkit_core::SchemaVersion;

use crate::error::CredentialError;
use crate::layout::Layout;

/// How the recipient's name was given in the roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipientName {
    GivenFamily { given: String, family: String },
    Full(String),
}

impl RecipientName {
    /// The name as one display string.
    pub fn display_name(&self) -> String {
        match self {
            Self::GivenFamily { given, family } => format!("{given} {family}"),
            Self::Full(name) => name.clone(),
        }
    }
}

/// One roster row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub name: RecipientName,
    pub pubkey: String,
    /// Usually an email address.
    pub identity: String,
    /// Every column that is not a fixed identity column.
    pub additional_fields: BTreeMap<String, String>,
}

impl Recipient {
    /// Split a row into fixed columns and additional fields.
    ///
    /// Returns the name of the first required column the row lacks.
    pub fn from_row(
        version: SchemaVersion,
        mut row: BTreeMap<String, String>,
    ) -> Result<Self, String> {
        let mut take = |column: &str| row.remove(column).ok_or_else(|| column.to_string());
        let name = match version {
            SchemaVersion::V1_2 => RecipientName::GivenFamily {
                given: take("givenName")?,
                family: take("familyName")?,
            },
            SchemaVersion::V2 | SchemaVersion::V3 => RecipientName::Full(take("name")?),
        };
        let pubkey = take("pubkey")?;
        let identity = take("identity")?;
        Ok(Self {
            name,
            pubkey,
            identity,
            additional_fields: row,
        })
    }
}

/// Parse roster CSV from `reader`. `source` names the input in errors.
///
/// # Errors
///
/// [`CredentialError::Roster`] if the CSV is malformed or lacks a column
/// the version requires.
pub fn parse_roster<R: Read>(
    reader: R,
    version: SchemaVersion,
    source: &Path,
) -> Result<Vec<Recipient>, CredentialError> {
    let roster_error = |reason: String| CredentialError::Roster {
        path: source.to_path_buf(),
        reason,
    };

    let mut rows = csv::Reader::from_reader(reader);
    let headers = rows
        .headers()
        .map_err(|e| roster_error(e.to_string()))?
        .clone();

    let layout = Layout::for_version(version);
    let missing: Vec<&str> = layout
        .required_columns
        .iter()
        .copied()
        .filter(|column| !headers.iter().any(|h| h == *column))
        .collect();
    if !missing.is_empty() {
        return Err(roster_error(format!(
            "missing required column(s) for {version}: {}",
            missing.join(", ")
        )));
    }

    let mut recipients = Vec::new();
    for (index, record) in rows.records().enumerate() {
        let record = record.map_err(|e| roster_error(e.to_string()))?;
        let row: BTreeMap<String, String> = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.to_string(), v.to_string()))
            .collect();
        let recipient = Recipient::from_row(version, row)
            .map_err(|column| roster_error(format!("row {}: missing `{column}`", index + 1)))?;
        recipients.push(recipient);
    }

    tracing::debug!(path = %source.display(), count = recipients.len(), "read roster");
    Ok(recipients)
}

/// Read the roster file at `path`.
///
/// # Errors
///
/// [`CredentialError::Io`] if the file cannot be opened, otherwise see
/// [`parse_roster`].
pub fn read_roster(path: &Path, version: SchemaVersion) -> Result<Vec<Recipient>, CredentialError> {
    let file = std::fs::File::open(path).map_err(|e| CredentialError::io(path, e))?;
    parse_roster(file, version, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(csv: &str, version: SchemaVersion) -> Result<Vec<Recipient>, CredentialError> {
        parse_roster(csv.as_bytes(), version, Path::new("roster.csv"))
    }

    #[test]
    fn v2_rows_split_fixed_and_additional_columns() {
        let csv = "name,pubkey,identity,evidence\nJane Doe,1AbC,jane@example.org,thesis.pdf\n";
        let recipients = parse(csv, SchemaVersion::V2).unwrap();
        assert_eq!(recipients.len(), 1);
        let r = &recipients[0];
        assert_eq!(r.name, RecipientName::Full("Jane Doe".into()));
        assert_eq!(r.pubkey, "1AbC");
        assert_eq!(r.identity, "jane@example.org");
        assert_eq!(r.additional_fields.get("evidence").map(String::as_str), Some("thesis.pdf"));
        assert_eq!(r.additional_fields.len(), 1);
    }

    #[test]
    fn v1_2_rows_use_given_and_family_names() {
        let csv = "familyName,givenName,pubkey,identity\nDoe,Jane,1AbC,jane@example.org\n";
        let recipients = parse(csv, SchemaVersion::V1_2).unwrap();
        assert_eq!(recipients[0].name.display_name(), "Jane Doe");
        assert!(recipients[0].additional_fields.is_empty());
    }

    #[test]
    fn missing_required_column_is_reported() {
        let csv = "name,identity\nJane,jane@example.org\n";
        let err = parse(csv, SchemaVersion::V2).unwrap_err();
        let CredentialError::Roster { reason, .. } = err else {
            panic!("expected roster error, got {err:?}");
        };
        assert!(reason.contains("pubkey"), "{reason}");
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let csv = "name,pubkey,identity\nJane,1AbC\n";
        assert!(matches!(
            parse(csv, SchemaVersion::V3),
            Err(CredentialError::Roster { .. })
        ));
    }

    #[test]
    fn quoted_values_keep_commas() {
        let csv = "name,pubkey,identity\n\"Doe, Jane\",1AbC,jane@example.org\n";
        let recipients = parse(csv, SchemaVersion::V3).unwrap();
        assert_eq!(recipients[0].name, RecipientName::Full("Doe, Jane".into()));
    }

    #[test]
    fn empty_roster_has_no_recipients() {
        let recipients = parse("name,pubkey,identity\n", SchemaVersion::V2).unwrap();
        assert!(recipients.is_empty());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_roster(Path::new("/nonexistent/roster.csv"), SchemaVersion::V2).unwrap_err();
        assert!(matches!(err, CredentialError::Io { .. }));
    }
}
