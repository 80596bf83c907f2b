//! # Template Subcommand
//!
//! Builds the certificate template for the configured schema version and
//! writes it to `<data_dir>/<template_dir>/<template_file_name>`.

use anyhow::{Context, Result};
use clap::Args;

use certkit_vc::{write_certificate_template, Config};

use crate::ConfigOverrides;

/// Arguments for `certkit template`.
#[derive(Args, Debug, Clone, Default)]
pub struct TemplateArgs {
    #[command(flatten)]
    pub overrides: ConfigOverrides,
}

/// Execute the template subcommand.
pub fn run_template(config: &Config) -> Result<u8> {
    let path = write_certificate_template(config).context("failed to create certificate template")?;
    println!("OK: wrote {} template to {}", config.schema_version, path.display());
    Ok(0)
}
