//! # certkit CLI entry point
//!
//! Parses command-line arguments, loads configuration, and dispatches to
//! subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use certkit_cli::instantiate::{run_instantiate, InstantiateArgs};
use certkit_cli::links::{run_links, LinksArgs};
use certkit_cli::template::{run_template, TemplateArgs};
use certkit_cli::{load_config, ConfigOverrides};

/// Blockcerts certificate tooling.
///
/// Builds certificate templates, instantiates one unsigned certificate per
/// roster row, and lists certificate links.
#[derive(Parser, Debug)]
#[command(name = "certkit", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to configuration file (YAML or JSON).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a certificate template with merge tags.
    Template(TemplateArgs),

    /// Create unsigned certificates from the template and roster.
    Instantiate(InstantiateArgs),

    /// List recipient names with certificate URLs.
    Links(LinksArgs),
}

impl Commands {
    fn overrides(&self) -> &ConfigOverrides {
        match self {
            Self::Template(args) => &args.overrides,
            Self::Instantiate(args) => &args.overrides,
            Self::Links(args) => &args.overrides,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "certkit starting");

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let result = load_config(cli.config.as_deref(), &cwd).and_then(|mut config| {
        cli.command.overrides().apply(&mut config, &cwd);
        match &cli.command {
            Commands::Template(_) => run_template(&config),
            Commands::Instantiate(_) => run_instantiate(&config),
            Commands::Links(args) => run_links(args, &config, &cwd),
        }
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
