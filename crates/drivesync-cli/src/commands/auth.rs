//! Auth commands - Login, Logout, and Status for the Google credential
//!
//! Provides the `drivesync auth` CLI subcommands which:
//! 1. `login`  - Runs the OAuth2 PKCE flow and stores the credential file.
//! 2. `logout` - Deletes the credential file.
//! 3. `status` - Reports whether the stored credential is usable.

use anyhow::Result;
use clap::Subcommand;
use tracing::info;

use drivesync_core::config::Config;
use drivesync_core::usecases::CredentialStatus;

use super::credential_use_case;
use crate::output::{get_formatter, OutputFormat, OutputFormatter};

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Authorize drivesync with Google, replacing any stored credential
    Login,
    /// Remove the stored credential
    Logout,
    /// Check authentication status
    Status,
}

impl AuthCommand {
    pub async fn execute(&self, config: &Config, format: OutputFormat) -> Result<()> {
        let fmt = get_formatter(format == OutputFormat::Json);
        match self {
            AuthCommand::Login => execute_login(config, &*fmt, format).await,
            AuthCommand::Logout => execute_logout(config, &*fmt),
            AuthCommand::Status => execute_status(config, &*fmt, format),
        }
    }
}

async fn execute_login(
    config: &Config,
    fmt: &dyn OutputFormatter,
    format: OutputFormat,
) -> Result<()> {
    let use_case = credential_use_case(config)?;

    fmt.info("Opening browser for Google login...");
    let tokens = use_case.login().await?;

    if matches!(format, OutputFormat::Json) {
        fmt.print_json(&serde_json::json!({
            "success": true,
            "token_path": config.token_path().display().to_string(),
            "expires_at": tokens.expires_at.to_rfc3339(),
            "refreshable": tokens.can_refresh(),
        }));
    } else {
        fmt.success("Logged in successfully");
        fmt.info(&format!("Credential stored in {}", config.token_path().display()));
    }
    Ok(())
}

fn execute_logout(config: &Config, fmt: &dyn OutputFormatter) -> Result<()> {
    let use_case = credential_use_case(config)?;
    use_case.logout()?;
    info!(path = %config.token_path().display(), "Removed stored credential");

    fmt.success("Logged out successfully");
    fmt.info(&format!("Removed {}", config.token_path().display()));
    Ok(())
}

fn execute_status(config: &Config, fmt: &dyn OutputFormatter, format: OutputFormat) -> Result<()> {
    let status = credential_use_case(config)?.status();

    if matches!(format, OutputFormat::Json) {
        fmt.print_json(&status_json(&status));
        return Ok(());
    }

    match status {
        CredentialStatus::NotFound => {
            fmt.info("Authentication status: Not configured");
            fmt.info("Run 'drivesync auth login' to authenticate");
        }
        CredentialStatus::Unreadable(reason) => {
            fmt.warn(&format!("Stored credential cannot be read: {reason}"));
            fmt.info("It will be replaced on the next login");
        }
        CredentialStatus::Stored {
            valid,
            refreshable,
            expires_at,
        } => {
            if valid {
                fmt.success("Authenticated");
            } else {
                fmt.warn("Stored credential has expired");
            }
            fmt.field("Token status", token_label(valid));
            fmt.field("Refreshable", if refreshable { "yes" } else { "no" });
            fmt.field(
                "Expires",
                &expires_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            );
            fmt.field("Token file", &config.token_path().display().to_string());
        }
    }
    Ok(())
}

fn token_label(valid: bool) -> &'static str {
    if valid {
        "Valid"
    } else {
        "Expired"
    }
}

fn status_json(status: &CredentialStatus) -> serde_json::Value {
    match status {
        CredentialStatus::NotFound => serde_json::json!({
            "authenticated": false,
            "token_status": "Not found",
        }),
        CredentialStatus::Unreadable(reason) => serde_json::json!({
            "authenticated": false,
            "token_status": "Unreadable",
            "error": reason,
        }),
        CredentialStatus::Stored {
            valid,
            refreshable,
            expires_at,
        } => serde_json::json!({
            "authenticated": *valid || *refreshable,
            "token_status": token_label(*valid),
            "refreshable": refreshable,
            "expires_at": expires_at.to_rfc3339(),
        }),
    }
}
