//! # Instantiate Subcommand
//!
//! Merges the template with every roster row and writes the unsigned
//! certificates. The batch stops at the first failing recipient.

use anyhow::{Context, Result};
use clap::Args;

use certkit_vc::{create_unsigned_certificates, Config};

use crate::ConfigOverrides;

/// Arguments for `certkit instantiate`.
#[derive(Args, Debug, Clone, Default)]
pub struct InstantiateArgs {
    #[command(flatten)]
    pub overrides: ConfigOverrides,
}

/// Execute the instantiate subcommand.
pub fn run_instantiate(config: &Config) -> Result<u8> {
    let report =
        create_unsigned_certificates(config).context("failed to instantiate certificate batch")?;

    println!(
        "OK: wrote {} certificate(s) to {}",
        report.written.len(),
        config.output_dir().display()
    );
    if !report.skipped.is_empty() {
        println!("  Skipped {} existing certificate(s)", report.skipped.len());
    }
    Ok(0)
}
