//! Sync command - Fetch every manifest entry from Google Drive
//!
//! Provides the `drivesync sync` CLI command (also the default) which:
//! 1. Checks for the OAuth client registration
//! 2. Obtains a credential, authorizing interactively when needed
//! 3. Loads the manifest, creating an empty one if absent
//! 4. Runs the reconciliation and reports what was fetched
//!
//! A failure during the run itself is logged and does not change the exit
//! status; only a missing client registration does.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tracing::{error, info};

use drivesync_core::config::Config;
use drivesync_core::domain::Manifest;
use drivesync_core::usecases::{
    AcquireCredentialUseCase, FetchContentUseCase, ReconcileManifestUseCase, ReconcileSummary,
    ResolveRemoteIdUseCase,
};
use drivesync_drive::client::DriveClient;
use drivesync_drive::provider::GoogleDriveProvider;

use super::credential_use_case;
use crate::output::{get_formatter, OutputFormat};

#[derive(Debug, Default, Args)]
pub struct SyncCommand {}

impl SyncCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(matches!(format, OutputFormat::Json));

        let credentials = credential_use_case(config)?;

        match run(config, &credentials).await {
            Ok(summary) => {
                if matches!(format, OutputFormat::Json) {
                    formatter.print_json(&serde_json::json!({
                        "success": true,
                        "fetched": summary.fetched,
                        "skipped": summary.skipped,
                    }));
                } else {
                    formatter.success(&format!(
                        "Fetched {} file(s), skipped {}",
                        summary.fetched, summary.skipped
                    ));
                    formatter.info(&format!("Output directory: {}", config.output_dir().display()));
                }
            }
            Err(e) => {
                error!("Synchronization aborted: {e:#}");
                if matches!(format, OutputFormat::Json) {
                    formatter.print_json(&serde_json::json!({
                        "success": false,
                        "error": format!("{e:#}"),
                    }));
                }
            }
        }

        Ok(())
    }
}

async fn run(config: &Config, credentials: &AcquireCredentialUseCase) -> Result<ReconcileSummary> {
    let tokens = credentials.acquire().await?;

    let manifest_path = config.manifest_path();
    let manifest = Manifest::load_or_create(&manifest_path)
        .with_context(|| format!("Failed to load manifest {}", manifest_path.display()))?;
    info!(
        "Loaded {} manifest entries from {}",
        manifest.len(),
        manifest_path.display()
    );

    let provider = Arc::new(
        GoogleDriveProvider::new(DriveClient::new(tokens.access_token))
            .with_chunk_size(config.chunk_size_bytes()),
    );
    let reconcile = ReconcileManifestUseCase::new(
        ResolveRemoteIdUseCase::new(provider.clone()),
        FetchContentUseCase::new(provider, config.output_dir()),
    );

    reconcile.run(&manifest).await
}
