//! # certkit-cli — CLI Tool for certkit
//!
//! Provides the `certkit` command-line interface.
//!
//! ## Subcommands
//!
//! - `certkit template` — build the certificate template.
//! - `certkit instantiate` — create one unsigned certificate per roster row.
//! - `certkit links` — list recipient names with certificate URLs.
//!
//! Every subcommand reads the same configuration file (`--config`, or
//! `conf.yaml` in the working directory when present) and accepts flag
//! overrides for the settings most often changed per run:
//!
//! ```bash
//! certkit --config conf.yaml template
//! certkit instantiate --hash-emails --no-clobber
//! certkit links --url-prefix https://certs.example.org
//! ```

pub mod instantiate;
pub mod links;
pub mod template;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use certkit_core::{FilenameFormat, SchemaVersion};
use certkit_vc::Config;

/// Configuration file read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "conf.yaml";

/// Resolve a path that may be relative to `base`.
///
/// Absolute paths are returned as-is.
pub fn resolve_path(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Load configuration from `path`, or from [`DEFAULT_CONFIG_FILE`] in
/// `cwd` when it exists, or fall back to defaults.
///
/// `data_dir` is made absolute against `cwd`.
pub fn load_config(path: Option<&Path>, cwd: &Path) -> Result<Config> {
    let default_path = cwd.join(DEFAULT_CONFIG_FILE);
    let source = match path {
        Some(path) => Some(resolve_path(path, cwd)),
        None if default_path.is_file() => Some(default_path),
        None => None,
    };

    let mut config = match &source {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load configuration: {}", path.display()))?,
        None => {
            tracing::debug!("no configuration file, using defaults");
            Config::default()
        }
    };
    config.data_dir = resolve_path(&config.data_dir, cwd);
    tracing::debug!(data_dir = %config.data_dir.display(), "resolved data directory");
    Ok(config)
}

/// Flags that override configuration file values.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Base directory for relative paths.
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Certificate schema version (v1.2, v2, v3).
    #[arg(long)]
    pub schema_version: Option<SchemaVersion>,

    /// Hash recipient emails with a per-recipient salt.
    #[arg(long)]
    pub hash_emails: bool,

    /// Keep certificates that already exist in the output directory.
    #[arg(long)]
    pub no_clobber: bool,

    /// How certificate filenames are formed (uuid, certname_identity).
    #[arg(long)]
    pub filename_format: Option<FilenameFormat>,

    /// Roster CSV, relative to the data directory.
    #[arg(long)]
    pub roster: Option<PathBuf>,
}

impl ConfigOverrides {
    /// Apply every flag that was given. `cwd` anchors a relative `--data-dir`.
    pub fn apply(&self, config: &mut Config, cwd: &Path) {
        if let Some(dir) = &self.data_dir {
            config.data_dir = resolve_path(dir, cwd);
        }
        if let Some(version) = self.schema_version {
            config.schema_version = version;
        }
        if self.hash_emails {
            config.hash_emails = true;
        }
        if self.no_clobber {
            config.no_clobber = true;
        }
        if let Some(format) = self.filename_format {
            config.filename_format = format;
        }
        if let Some(roster) = &self.roster {
            config.roster = roster.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_path_keeps_absolute_paths() {
        assert_eq!(
            resolve_path(Path::new("/abs/conf.yaml"), Path::new("/cwd")),
            PathBuf::from("/abs/conf.yaml")
        );
        assert_eq!(
            resolve_path(Path::new("data"), Path::new("/cwd")),
            PathBuf::from("/cwd/data")
        );
    }

    #[test]
    fn load_config_without_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(None, dir.path()).unwrap();
        assert_eq!(config.data_dir, dir.path().join("."));
        assert_eq!(config.schema_version, SchemaVersion::V2);
    }

    #[test]
    fn load_config_reads_default_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            "schema_version: v3\ndata_dir: certs\n",
        )
        .unwrap();
        let config = load_config(None, dir.path()).unwrap();
        assert_eq!(config.schema_version, SchemaVersion::V3);
        assert_eq!(config.data_dir, dir.path().join("certs"));
    }

    #[test]
    fn load_config_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(Path::new("absent.yaml")), dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("absent.yaml"));
    }

    #[test]
    fn overrides_replace_only_given_values() {
        let mut config = Config {
            hash_emails: true,
            ..Config::default()
        };
        let overrides = ConfigOverrides {
            schema_version: Some(SchemaVersion::V1_2),
            roster: Some(PathBuf::from("other.csv")),
            ..ConfigOverrides::default()
        };
        overrides.apply(&mut config, Path::new("/cwd"));

        assert_eq!(config.schema_version, SchemaVersion::V1_2);
        assert_eq!(config.roster, PathBuf::from("other.csv"));
        assert!(config.hash_emails);
        assert!(!config.no_clobber);
        assert_eq!(config.filename_format, FilenameFormat::Uuid);
    }
}
