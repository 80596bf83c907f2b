//! # Schema Versions
//!
//! The three certificate document shapes. Every version-specific decision
//! in the workspace is an exhaustive `match` on [`SchemaVersion`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Certificate document shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SchemaVersion {
    /// Legacy flat `CertificateDocument` (Blockcerts v1.2).
    #[serde(rename = "v1.2", alias = "1.2")]
    V1_2,
    /// Open Badges `Assertion` with nested badge (Blockcerts v2).
    #[default]
    #[serde(rename = "v2", alias = "2")]
    V2,
    /// W3C Verifiable Credential (Blockcerts v3).
    #[serde(rename = "v3", alias = "3")]
    V3,
}

impl SchemaVersion {
    /// All versions, oldest first.
    pub const ALL: [SchemaVersion; 3] = [Self::V1_2, Self::V2, Self::V3];

    /// Returns the version tag, e.g. `v1.2`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V1_2 => "v1.2",
            Self::V2 => "v2",
            Self::V3 => "v3",
        }
    }

    /// File name of the unsigned-document schema for this version.
    pub fn schema_file_name(&self) -> String {
        format!("blockcerts-{}.schema.json", self.as_str())
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_start_matches('v') {
            "1.2" => Ok(Self::V1_2),
            "2" | "2.0" => Ok(Self::V2),
            "3" | "3.0" => Ok(Self::V3),
            _ => Err(format!("unknown schema version `{s}` (expected v1.2, v2 or v3)")),
        }
    }
}
