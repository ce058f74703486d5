//! Credential acquisition use case
//!
//! Produces a usable OAuth credential for the run. The stored credential is
//! reused while valid, refreshed when it has expired and carries a refresh
//! token, and replaced through the interactive flow otherwise. Whatever is
//! obtained is persisted again before it is returned.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::ports::{IAuthenticator, ITokenStorage, Tokens};

/// What is currently persisted, as reported by `auth status`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialStatus {
    /// Nothing is stored
    NotFound,
    /// Storage exists but could not be decoded
    Unreadable(String),
    /// A credential is stored
    Stored {
        /// Whether the access token can be used right now
        valid: bool,
        /// Whether a refresh token is available
        refreshable: bool,
        /// Expiry of the access token
        expires_at: DateTime<Utc>,
    },
}

/// Use case for obtaining the OAuth credential
pub struct AcquireCredentialUseCase {
    storage: Arc<dyn ITokenStorage>,
    authenticator: Arc<dyn IAuthenticator>,
}

impl AcquireCredentialUseCase {
    /// Creates a new AcquireCredentialUseCase
    ///
    /// # Arguments
    ///
    /// * `storage` - Where the credential is persisted between runs
    /// * `authenticator` - Interactive flow and token refresh
    pub fn new(storage: Arc<dyn ITokenStorage>, authenticator: Arc<dyn IAuthenticator>) -> Self {
        Self {
            storage,
            authenticator,
        }
    }

    /// Returns a usable credential, authorizing interactively if needed
    ///
    /// # Errors
    ///
    /// Returns an error if the interactive flow fails or the credential
    /// cannot be persisted. Unreadable storage and refresh failures are not
    /// errors; they fall through to the interactive flow.
    pub async fn acquire(&self) -> Result<Tokens> {
        let tokens = match self.load_stored() {
            Some(stored) => self.revive(stored).await,
            None => None,
        };

        let tokens = match tokens {
            Some(tokens) => tokens,
            None => {
                info!("No usable credential, starting authorization");
                self.authenticator
                    .authorize()
                    .await
                    .context("Failed to complete OAuth2 authorization")?
            }
        };

        self.storage
            .store(&tokens)
            .context("Failed to persist credential")?;
        debug!("Saved credential for next use");

        info!("Logged in successfully.");
        Ok(tokens)
    }

    /// Runs the interactive flow unconditionally and persists the result
    pub async fn login(&self) -> Result<Tokens> {
        let tokens = self
            .authenticator
            .authorize()
            .await
            .context("Failed to complete OAuth2 authorization")?;
        self.storage
            .store(&tokens)
            .context("Failed to persist credential")?;
        info!("Credential stored");
        Ok(tokens)
    }

    /// Reports on the stored credential without touching the network
    pub fn status(&self) -> CredentialStatus {
        match self.storage.load() {
            Ok(None) => CredentialStatus::NotFound,
            Ok(Some(tokens)) => CredentialStatus::Stored {
                valid: tokens.is_valid(),
                refreshable: tokens.can_refresh(),
                expires_at: tokens.expires_at,
            },
            Err(e) => CredentialStatus::Unreadable(format!("{e:#}")),
        }
    }

    /// Deletes the stored credential
    pub fn logout(&self) -> Result<()> {
        self.storage
            .clear()
            .context("Failed to remove stored credential")?;
        info!("Credential removed");
        Ok(())
    }

    fn load_stored(&self) -> Option<Tokens> {
        match self.storage.load() {
            Ok(tokens) => tokens,
            Err(e) => {
                error!("Error while loading credential: {e:#}");
                None
            }
        }
    }

    /// Turns a stored credential into a usable one, if possible
    async fn revive(&self, stored: Tokens) -> Option<Tokens> {
        if stored.is_valid() {
            debug!("Using stored credential");
            return Some(stored);
        }

        let Some(refresh_token) = stored.refresh_token.as_deref().filter(|t| !t.is_empty()) else {
            debug!("Stored credential expired and has no refresh token");
            return None;
        };

        debug!("Refreshing expired credential");
        match self.authenticator.refresh(refresh_token).await {
            Ok(mut refreshed) => {
                // Google omits the refresh token from refresh responses
                if refreshed.refresh_token.is_none() {
                    refreshed.refresh_token = stored.refresh_token.clone();
                }
                Some(refreshed)
            }
            Err(e) => {
                warn!("Failed to refresh credential: {e:#}");
                None
            }
        }
    }
}
