//! # Field Specs
//!
//! A [`FieldSpec`] declares one additional field to inject into a document.
//! Global specs carry a literal value; per-recipient specs carry a merge
//! tag placeholder for the template and name the roster column whose value
//! replaces it for each recipient.
//!
//! Configuration accepts either a bare list of specs or the legacy wrapper
//! object `{"fields": [...]}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One caller-declared path/value injection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Path expression, e.g. `$.certificate.subtitle`.
    pub path: String,
    /// Literal value, or merge tag placeholder for per-recipient specs.
    #[serde(default)]
    pub value: Value,
    /// Roster column supplying the per-recipient value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv_column: Option<String>,
}

impl FieldSpec {
    /// A global spec: the same literal value for every document.
    pub fn global(path: impl Into<String>, value: Value) -> Self {
        Self {
            path: path.into(),
            value,
            csv_column: None,
        }
    }

    /// A per-recipient spec: `placeholder` in the template, the value of
    /// `csv_column` in each instance.
    pub fn per_recipient(
        path: impl Into<String>,
        placeholder: impl Into<String>,
        csv_column: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            value: Value::String(placeholder.into()),
            csv_column: Some(csv_column.into()),
        }
    }
}

/// Ordered list of field specs as read from configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "FieldSpecListRepr")]
pub struct FieldSpecList(Vec<FieldSpec>);

#[derive(Deserialize)]
#[serde(untagged)]
enum FieldSpecListRepr {
    Bare(Vec<FieldSpec>),
    Wrapped { fields: Vec<FieldSpec> },
}

impl From<FieldSpecListRepr> for FieldSpecList {
    fn from(repr: FieldSpecListRepr) -> Self {
        match repr {
            FieldSpecListRepr::Bare(fields) | FieldSpecListRepr::Wrapped { fields } => Self(fields),
        }
    }
}

impl FieldSpecList {
    /// Parse a JSON list or `{"fields": [...]}` object.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error for malformed input.
    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }

    /// The specs, in declaration order.
    pub fn specs(&self) -> &[FieldSpec] {
        &self.0
    }

    /// Returns `true` if no specs are declared.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of declared specs.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over the specs in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, FieldSpec> {
        self.0.iter()
    }
}

impl From<Vec<FieldSpec>> for FieldSpecList {
    fn from(specs: Vec<FieldSpec>) -> Self {
        Self(specs)
    }
}

impl std::str::FromStr for FieldSpecList {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_json(s)
    }
}

impl<'a> IntoIterator for &'a FieldSpecList {
    type Item = &'a FieldSpec;
    type IntoIter = std::slice::Iter<'a, FieldSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_wrapped_fields() {
        let list = FieldSpecList::from_json(
            r#"{"fields": [{"path": "$.certificate.subtitle", "value": "custom"}]}"#,
        )
        .unwrap();
        assert_eq!(
            list.specs(),
            &[FieldSpec::global("$.certificate.subtitle", json!("custom"))]
        );
    }

    #[test]
    fn parses_bare_list_with_columns() {
        let list: FieldSpecList = r#"[{"path": "$.evidence", "value": "*|EVIDENCE|*", "csv_column": "evidence"}]"#
            .parse()
            .unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(
            list.specs()[0],
            FieldSpec::per_recipient("$.evidence", "*|EVIDENCE|*", "evidence")
        );
    }

    #[test]
    fn value_defaults_to_null() {
        let list = FieldSpecList::from_json(r#"[{"path": "$.a"}]"#).unwrap();
        assert_eq!(list.specs()[0].value, Value::Null);
    }

    #[test]
    fn rejects_missing_path() {
        assert!(FieldSpecList::from_json(r#"[{"value": 1}]"#).is_err());
    }

    #[test]
    fn structured_values_survive() {
        let list = FieldSpecList::from_json(
            r#"[{"path": "$.badge.tags", "value": ["a", {"b": 1}]}]"#,
        )
        .unwrap();
        assert_eq!(list.specs()[0].value, json!(["a", {"b": 1}]));
    }
}
