//! Google Drive v3 API client
//!
//! Provides a typed HTTP client for the Drive v3 REST API.
//! Handles authentication headers, JSON deserialization, endpoint
//! construction and classification of error responses.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use drivesync_drive::client::{name_query, DriveClient};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = DriveClient::new("access-token-here");
//! let page = client.list_files(&name_query("report.pdf"), None).await?;
//! println!("{} matches", page.files.len());
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use tracing::debug;

use crate::DriveError;

/// Base URL for the Google Drive v3 API
const DRIVE_BASE_URL: &str = "https://www.googleapis.com/drive/v3";

/// Partial response selector for name searches
const LIST_FIELDS: &str = "nextPageToken, files(id, name)";

// ============================================================================
// Drive API response types
// ============================================================================

/// Response from `GET /files`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileListResponse {
    /// Files on this page
    #[serde(default)]
    pub files: Vec<DriveFile>,
    /// Token for the next page, absent on the last page
    pub next_page_token: Option<String>,
}

/// File resource restricted to the requested fields
#[derive(Debug, Deserialize)]
pub struct DriveFile {
    /// Drive file ID
    pub id: String,
    /// File name
    #[serde(default)]
    pub name: String,
}

/// Error envelope returned by Google APIs
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

// ============================================================================
// DriveClient
// ============================================================================

/// HTTP client for Google Drive API calls
///
/// Wraps `reqwest::Client` with the bearer token and base URL. Cloning is
/// cheap; clones share the connection pool.
#[derive(Clone)]
pub struct DriveClient {
    /// The underlying HTTP client
    client: Client,
    /// Base URL for API requests
    base_url: String,
    /// Current OAuth2 access token
    access_token: String,
}

impl DriveClient {
    /// Creates a new DriveClient with the given access token
    ///
    /// # Arguments
    /// * `access_token` - A valid OAuth2 access token with a Drive scope
    pub fn new(access_token: impl Into<String>) -> Self {
        Self::with_base_url(access_token, DRIVE_BASE_URL)
    }

    /// Creates a new DriveClient with a custom base URL (useful for testing)
    ///
    /// # Arguments
    /// * `access_token` - A valid OAuth2 access token
    /// * `base_url` - Custom base URL for API requests
    pub fn with_base_url(access_token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    /// Creates an authenticated request builder for the given method and path
    ///
    /// Automatically prepends the base URL and adds the Authorization header.
    ///
    /// # Arguments
    /// * `method` - HTTP method
    /// * `path` - API path relative to base URL (e.g., "/files")
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .request(method, &url)
            .bearer_auth(&self.access_token)
    }

    /// Runs one page of a `files.list` search
    ///
    /// # Arguments
    /// * `query` - Drive search expression, see [`name_query`]
    /// * `page_token` - Token from the previous page (None for the first page)
    pub async fn list_files(
        &self,
        query: &str,
        page_token: Option<&str>,
    ) -> Result<FileListResponse> {
        debug!("Listing files: q={query}, page_token={page_token:?}");

        let mut request = self
            .request(Method::GET, "/files")
            .query(&[("q", query), ("fields", LIST_FIELDS)]);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = request
            .send()
            .await
            .context("Failed to send files.list request")?;
        let response = check_status(response)
            .await
            .context("files.list returned error status")?;

        let page: FileListResponse = response
            .json()
            .await
            .context("Failed to parse files.list response")?;

        debug!(
            "files.list returned {} file(s), more pages: {}",
            page.files.len(),
            page.next_page_token.is_some()
        );
        Ok(page)
    }
}

/// Builds a `files.list` query matching `name` exactly
///
/// Backslashes and single quotes are escaped as the Drive query language
/// requires.
pub fn name_query(name: &str) -> String {
    let escaped = name.replace('\\', "\\\\").replace('\'', "\\'");
    format!("name = '{escaped}'")
}

/// Passes successful responses through and converts the rest to [`DriveError`]
pub(crate) async fn check_status(response: Response) -> std::result::Result<Response, DriveError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|envelope| envelope.error.message)
        .unwrap_or(body);
    Err(DriveError::from_status(status, message))
}
