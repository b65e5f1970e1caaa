//! # shelf-cli
//!
//! Command line front end of the shelf package store.
//!
//! Parses commands, loads and layers configuration, sets up logging and
//! dispatches to the command handlers. Errors are reported through the
//! `ErrorFormatter` with a help line where one applies.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use shelf_core::error::ShelfError;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error};

mod commands;
mod output;

use commands::CommandContext;
use output::errors::ErrorFormatter;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (built ",
    env!("BUILD_DATE"),
    ", ",
    env!("RUSTC_VERSION"),
    ")"
);

/// Content-addressed package store and repository publisher
#[derive(Parser)]
#[command(name = "shelf", version, long_version = LONG_VERSION, about = "Content-addressed package store")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Options shared by every command
#[derive(clap::Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Configuration file to use instead of discovery
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Storage root holding packages/ and repos/
    #[arg(long, global = true, value_name = "DIR")]
    pub storage_root: Option<Utf8PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

/// A package identity given on the command line
#[derive(clap::Args, Debug, Clone)]
pub struct PackageArgs {
    pub name: String,
    pub version: String,
    pub release: String,
    pub arch: String,
    pub filename: String,

    /// Single package digest
    #[arg(long, conflicts_with = "checksum", required_unless_present = "checksum")]
    pub digest: Option<String>,

    /// Digest per algorithm as ALG=DIGEST, repeatable
    #[arg(long, value_name = "ALG=DIGEST")]
    pub checksum: Vec<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute file checksums
    Checksum {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Digest algorithm (md5, sha/sha1, sha224, sha256, sha384, sha512)
        #[arg(short = 't', long = "type", default_value = "sha256")]
        hashtype: String,
    },
    /// Print the canonical store path of a package
    Path {
        #[command(flatten)]
        package: PackageArgs,
    },
    /// Check whether a file holds the expected content
    Exists {
        path: Utf8PathBuf,
        #[arg(long)]
        digest: String,
        #[arg(short = 't', long = "type", default_value = "sha256")]
        hashtype: String,
        /// Report absent even when the content matches
        #[arg(long)]
        force: bool,
    },
    /// Link a repository path to a source file
    Publish { source: Utf8PathBuf, link: Utf8PathBuf },
    /// Publish a stored package into a repository
    Link {
        #[command(flatten)]
        package: PackageArgs,
        /// Repository path relative to the repositories root
        #[arg(long)]
        repo: String,
    },
    /// Regenerate repository metadata
    Createrepo {
        dir: Utf8PathBuf,
        /// Comps/group file passed to createrepo
        #[arg(short, long)]
        groups: Option<Utf8PathBuf>,
    },
    /// Add a file to repository metadata
    Modifyrepo { dir: Utf8PathBuf, file: Utf8PathBuf },
    /// Look a package up in a repository
    Find { repo_dir: Utf8PathBuf, relative_path: String },
    /// Print the effective configuration
    Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.global.verbose);
    setup_panic_handler();

    debug!("Starting shelf v{}", env!("CARGO_PKG_VERSION"));

    match run_cli(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e);
            ExitCode::FAILURE
        },
    }
}

fn run_cli(cli: Cli) -> anyhow::Result<()> {
    let rt = tokio::runtime::Runtime::new().map_err(|e| ShelfError::Io {
        message: "Failed to create async runtime".to_string(),
        source: e,
    })?;

    rt.block_on(async {
        let ctx = CommandContext::new(&cli.global).await?;
        commands::dispatch_command(cli.command, &ctx).await
    })
}

fn report_error(e: &anyhow::Error) {
    let formatter = ErrorFormatter::new();
    match e.downcast_ref::<ShelfError>() {
        Some(shelf_error) => {
            let contexts: Vec<String> = e
                .chain()
                .take_while(|cause| cause.downcast_ref::<ShelfError>().is_none())
                .map(|cause| cause.to_string())
                .collect();
            for context in contexts {
                eprintln!("{}", formatter.format_simple(&context));
            }
            eprintln!("{}", formatter.format_error(shelf_error));
        },
        None => eprintln!("{}", formatter.format_chain(e)),
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let default_filter = format!("shelf={level},shelf_core={level},shelf_store={level},shelf_config={level}");

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("shelf encountered an unexpected error: {}", panic_info);
        eprintln!("shelf crashed! This is a bug.");
        eprintln!("Error: {}", panic_info);
    }));
}
