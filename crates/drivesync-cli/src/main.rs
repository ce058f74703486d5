//! drivesync CLI - Command-line interface for drivesync
//!
//! Provides commands for:
//! - Fetching the files listed in the manifest from Google Drive
//! - Managing the stored OAuth credential
//! - Inspecting and initializing the manifest

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};

use drivesync_core::config::Config;

mod commands;
mod logging;
mod output;

use commands::{auth::AuthCommand, manifest::ManifestCommand, sync::SyncCommand};
use output::{get_formatter, OutputFormat};

#[derive(Debug, Parser)]
#[command(
    name = "drivesync",
    version,
    about = "Fetch the files listed in a manifest from Google Drive"
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory that relative paths are resolved against
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    /// Minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Download every manifest entry (default)
    Sync(SyncCommand),
    /// Authentication commands
    #[command(subcommand)]
    Auth(AuthCommand),
    /// Inspect or create the manifest
    #[command(subcommand)]
    Manifest(ManifestCommand),
}

impl Cli {
    fn format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }

    /// Loads the configuration and applies command-line overrides
    fn load_config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => Config::load_or_default(&Config::default_path()),
        };

        if let Some(base_dir) = &self.base_dir {
            config.paths.base_dir = base_dir.clone();
        }
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let format = cli.format();
    let fmt = get_formatter(cli.json);

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            fmt.error(&format!("{e:#}"));
            return ExitCode::FAILURE;
        }
    };

    let errors = config.validate();
    if !errors.is_empty() {
        for error in &errors {
            fmt.error(&error.to_string());
        }
        return ExitCode::FAILURE;
    }

    let _logging = match logging::init(&config.logging, cli.verbose, cli.quiet) {
        Ok(guard) => guard,
        Err(e) => {
            fmt.error(&format!("{e:#}"));
            return ExitCode::FAILURE;
        }
    };

    let command = cli
        .command
        .unwrap_or_else(|| Commands::Sync(SyncCommand::default()));

    let result = tokio::select! {
        result = async {
            match command {
                Commands::Sync(cmd) => cmd.execute(&config, format).await,
                Commands::Auth(cmd) => cmd.execute(&config, format).await,
                Commands::Manifest(cmd) => cmd.execute(&config, format).await,
            }
        } => result,
        _ = tokio::signal::ctrl_c() => {
            println!("\nThank you for using.");
            return ExitCode::SUCCESS;
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            fmt.error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
