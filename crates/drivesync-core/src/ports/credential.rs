//! Credential ports (driven/secondary ports)
//!
//! Two seams surround the credential lifecycle:
//!
//! - [`ITokenStorage`] persists the credential between runs.
//! - [`IAuthenticator`] obtains a brand-new credential interactively and
//!   refreshes expired ones.
//!
//! ## Design Notes
//!
//! - `ITokenStorage::load` returns `Ok(None)` for "nothing stored"; errors are
//!   reserved for unreadable or corrupt storage, and the use case decides what
//!   to do with them.
//! - Storage is synchronous: it is a single small file read at startup.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Seconds before `expires_at` at which a token is already considered invalid
const EXPIRY_SKEW_SECONDS: i64 = 10;

// ============================================================================
// Tokens
// ============================================================================

/// OAuth tokens received from the identity provider
///
/// Contains the access token for API requests, an optional refresh token
/// for obtaining new access tokens, and the expiration time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tokens {
    /// Bearer token for authenticating API requests
    pub access_token: String,
    /// Token for refreshing the access token without user interaction
    pub refresh_token: Option<String>,
    /// When the access token expires
    pub expires_at: DateTime<Utc>,
}

impl Tokens {
    /// Returns true if the access token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Returns true if the access token will expire within the given duration
    pub fn expires_within(&self, duration: Duration) -> bool {
        Utc::now() + duration >= self.expires_at
    }

    /// Returns true if the token can be used for API calls right now
    pub fn is_valid(&self) -> bool {
        !self.access_token.is_empty() && !self.expires_within(Duration::seconds(EXPIRY_SKEW_SECONDS))
    }

    /// Returns true if a refresh token is available
    pub fn can_refresh(&self) -> bool {
        self.refresh_token
            .as_deref()
            .is_some_and(|token| !token.is_empty())
    }
}

// ============================================================================
// ITokenStorage
// ============================================================================

/// Port trait for persisting the credential between runs
pub trait ITokenStorage: Send + Sync {
    /// Loads the stored credential
    ///
    /// # Returns
    /// `Ok(None)` when nothing is stored, `Err` when storage exists but
    /// cannot be read or decoded
    fn load(&self) -> anyhow::Result<Option<Tokens>>;

    /// Stores the credential, replacing any previous one
    fn store(&self, tokens: &Tokens) -> anyhow::Result<()>;

    /// Removes the stored credential; succeeds when nothing is stored
    fn clear(&self) -> anyhow::Result<()>;
}

// ============================================================================
// IAuthenticator
// ============================================================================

/// Port trait for obtaining and refreshing credentials
#[async_trait::async_trait]
pub trait IAuthenticator: Send + Sync {
    /// Runs the interactive authorization flow
    ///
    /// # Returns
    /// Fresh OAuth tokens on successful authorization
    async fn authorize(&self) -> anyhow::Result<Tokens>;

    /// Refreshes an expired access token using a refresh token
    ///
    /// # Returns
    /// New OAuth tokens with a fresh access token
    async fn refresh(&self, refresh_token: &str) -> anyhow::Result<Tokens>;
}
