//! # Links Subcommand
//!
//! Lists `<recipient name> : <url_prefix>/<uid>` for every certificate in
//! a directory, sorted by name.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use certkit_vc::{extract_links, write_links, Config};

use crate::{resolve_path, ConfigOverrides};

/// Arguments for `certkit links`.
#[derive(Args, Debug, Clone)]
pub struct LinksArgs {
    /// Directory of certificates (default: the unsigned certificates directory).
    #[arg(long, short = 'p')]
    pub cert_path: Option<PathBuf>,

    /// URL prefix the uid is appended to.
    #[arg(long, short = 'u')]
    pub url_prefix: String,

    /// Output file (default: standard output).
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: ConfigOverrides,
}

/// Execute the links subcommand.
pub fn run_links(args: &LinksArgs, config: &Config, cwd: &Path) -> Result<u8> {
    let dir = match &args.cert_path {
        Some(path) => resolve_path(path, cwd),
        None => config.output_dir(),
    };
    let links = extract_links(&dir, config.schema_version)
        .with_context(|| format!("failed to read certificates in {}", dir.display()))?;

    match &args.output {
        Some(output) => {
            let output = resolve_path(output, cwd);
            write_links(&links, &args.url_prefix, &output)
                .with_context(|| format!("failed to write links: {}", output.display()))?;
            println!("OK: wrote {} link(s) to {}", links.len(), output.display());
        }
        None => {
            for link in &links {
                println!("{}", link.format(&args.url_prefix));
            }
        }
    }
    Ok(0)
}
