//! drivesync Drive - Google Drive v3 API client
//!
//! Provides async client for:
//! - OAuth2 authentication (installed-app Authorization Code flow with PKCE)
//! - File-based persistence of the OAuth credential
//! - Exact-name file search via `files.list`
//! - Chunked download of raw files and Google Workspace exports
//!
//! ## Modules
//!
//! - [`auth`] - OAuth2 PKCE authentication flow components
//! - [`client`] - Google Drive v3 HTTP client
//! - [`download`] - Ranged chunked downloads
//! - [`provider`] - [`IDriveProvider`](drivesync_core::ports::IDriveProvider) implementation

pub mod auth;
pub mod client;
pub mod download;
pub mod provider;

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when communicating with the Google Drive API
#[derive(Debug, Error)]
pub enum DriveError {
    /// Authentication credentials are invalid or expired
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Insufficient permissions for the requested operation
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded
    #[error("Too many requests: {0}")]
    TooManyRequests(String),

    /// A server-side error occurred (5xx)
    #[error("Server error: {0}")]
    ServerError(String),

    /// Any other non-success status
    #[error("HTTP {status}: {message}")]
    Api {
        /// Response status code
        status: u16,
        /// Message from the error body
        message: String,
    },

    /// A network-level error occurred
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The API response could not be parsed or was malformed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The OAuth client configuration file is unusable
    #[error("Invalid client secret: {0}")]
    InvalidClientSecret(String),

    /// The consent page redirected back with an error
    #[error("Authorization denied: {0}")]
    AuthorizationDenied(String),

    /// The redirect carried a state that does not match the request
    #[error("OAuth state mismatch, possible CSRF attempt")]
    CsrfMismatch,
}

impl DriveError {
    /// Classifies a non-success HTTP status
    pub fn from_status(status: StatusCode, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized(message),
            StatusCode::FORBIDDEN => Self::Forbidden(message),
            StatusCode::NOT_FOUND => Self::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => Self::TooManyRequests(message),
            s if s.is_server_error() => Self::ServerError(message),
            s => Self::Api {
                status: s.as_u16(),
                message,
            },
        }
    }
}
