//! CLI subcommands and the wiring they share

pub mod auth;
pub mod manifest;
pub mod sync;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::error;

use drivesync_core::config::Config;
use drivesync_core::usecases::AcquireCredentialUseCase;
use drivesync_drive::auth::{ClientCredentials, FileTokenStorage, GoogleAuthenticator, OAuth2Config};

/// Conditions that stop a command before it talks to Google
#[derive(Debug, Error)]
pub enum StartupError {
    /// The OAuth client registration has not been downloaded yet
    #[error("client secret file {} not found", .0.display())]
    MissingClientSecret(PathBuf),
}

/// Loads the OAuth client registration
///
/// When the file is missing its directory is created, so the user only has
/// to drop the file in, and [`StartupError::MissingClientSecret`] is returned.
pub fn require_client_secret(config: &Config) -> Result<ClientCredentials> {
    let path = config.client_secret_path();
    if !path.is_file() {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        error!(
            "Cannot find {file_name} in directory {}. Please generate it via the Google Developer Console first.",
            dir.display()
        );
        error!("It can be found here: https://console.developers.google.com/");
        create_auth_dir(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
        return Err(StartupError::MissingClientSecret(path).into());
    }

    ClientCredentials::load(&path)
}

/// Builds the credential use case over the configured token file
pub fn credential_use_case(config: &Config) -> Result<AcquireCredentialUseCase> {
    let credentials = require_client_secret(config)?;
    let oauth = OAuth2Config::new(credentials)
        .with_scopes(config.auth.scopes.clone())
        .with_callback(config.auth.callback_host.clone(), config.auth.callback_port)
        .with_open_browser(config.auth.open_browser);

    Ok(AcquireCredentialUseCase::new(
        Arc::new(FileTokenStorage::new(config.token_path())),
        Arc::new(GoogleAuthenticator::new(oauth)),
    ))
}

fn create_auth_dir(dir: &Path) -> std::io::Result<()> {
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }
    builder.create(dir)
}
