//! GoogleDriveProvider - IDriveProvider implementation for Google Drive v3
//!
//! Wraps the [`DriveClient`] and the [`download`](crate::download) module to
//! fulfil the [`IDriveProvider`] port contract.
//!
//! ## Design Notes
//!
//! - Authentication is handled separately by
//!   [`GoogleAuthenticator`](crate::auth::GoogleAuthenticator); this provider
//!   is built from an access token that is already valid.
//! - Downloads own a clone of the client so the cursor can outlive the call
//!   that opened it.

use anyhow::Result;
use tracing::debug;

use drivesync_core::ports::{FilePage, IDriveProvider, IMediaDownload, MediaRequest, RemoteFile};

use crate::client::{name_query, DriveClient};
use crate::download::RangeDownload;

/// Default size of each ranged download request (100 MiB)
pub const DEFAULT_CHUNK_SIZE: u64 = 100 * 1024 * 1024;

/// Drive provider implementation that delegates to the Google Drive v3 API
pub struct GoogleDriveProvider {
    client: DriveClient,
    chunk_size: u64,
}

impl GoogleDriveProvider {
    /// Creates a new `GoogleDriveProvider` wrapping the given [`DriveClient`]
    pub fn new(client: DriveClient) -> Self {
        Self {
            client,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Sets the size of each ranged download request
    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }
}

#[async_trait::async_trait]
impl IDriveProvider for GoogleDriveProvider {
    /// Searches for files named exactly `name`
    ///
    /// Delegates to [`DriveClient::list_files`].
    async fn list_files_by_name(&self, name: &str, page_token: Option<&str>) -> Result<FilePage> {
        debug!(name, has_token = page_token.is_some(), "GoogleDriveProvider::list_files_by_name");
        let response = self.client.list_files(&name_query(name), page_token).await?;

        Ok(FilePage {
            files: response
                .files
                .into_iter()
                .map(|file| RemoteFile {
                    id: file.id,
                    name: file.name,
                })
                .collect(),
            next_page_token: response.next_page_token.filter(|token| !token.is_empty()),
        })
    }

    /// Prepares a ranged download; no request is sent until the first chunk
    async fn open_download(&self, request: MediaRequest) -> Result<Box<dyn IMediaDownload>> {
        let client = self.client.clone();
        let download = match &request {
            MediaRequest::Raw { id } => {
                debug!(id = %id, "GoogleDriveProvider::open_download raw");
                RangeDownload::raw(client, id, self.chunk_size)
            }
            MediaRequest::Export { id, mime } => {
                debug!(id = %id, mime = %mime, "GoogleDriveProvider::open_download export");
                RangeDownload::export(client, id, mime, self.chunk_size)
            }
        };
        Ok(Box::new(download))
    }
}
