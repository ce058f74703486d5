//! Drive provider port (driven/secondary port)
//!
//! This module defines the interface for the remote file store. The
//! implementation targets Google Drive v3, but the trait only exposes what
//! reconciliation needs: a paginated exact-name search and chunked media
//! downloads.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because errors at port boundaries are adapter-specific
//!   and don't need domain-level classification.
//! - Uses `#[async_trait]` for async trait methods.
//! - [`RemoteFile`] and [`FilePage`] are port-level DTOs; IDs are validated
//!   into [`RemoteId`] by the use cases.
//! - A download is a cursor ([`IMediaDownload`]) so the chunk loop, and the
//!   local file it writes, stay in the core.

use crate::domain::newtypes::{MimeType, RemoteId};

// ============================================================================
// Listing DTOs
// ============================================================================

/// A file returned by a name search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    /// Provider-specific file identifier
    pub id: String,
    /// File name as shown in Drive
    pub name: String,
}

/// One page of search results
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilePage {
    /// Files matching the search on this page
    pub files: Vec<RemoteFile>,
    /// Token for the next page (None if this is the last page)
    pub next_page_token: Option<String>,
}

// ============================================================================
// Download DTOs
// ============================================================================

/// What content to download for a remote file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaRequest {
    /// The stored bytes of a regular file
    Raw {
        /// File to download
        id: RemoteId,
    },
    /// A Google Workspace document converted to another format
    Export {
        /// Document to export
        id: RemoteId,
        /// Target format
        mime: MimeType,
    },
}

impl MediaRequest {
    /// The remote file this request targets
    pub fn id(&self) -> &RemoteId {
        match self {
            Self::Raw { id } | Self::Export { id, .. } => id,
        }
    }
}

/// One step of a chunked download
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaChunk {
    /// Bytes received in this step
    pub data: Vec<u8>,
    /// Total bytes received so far, including this chunk
    pub progress: u64,
    /// Total size of the content, when the server reported it
    pub total: Option<u64>,
    /// Whether the transfer is complete
    pub done: bool,
}

// ============================================================================
// IMediaDownload
// ============================================================================

/// Cursor over a chunked download
#[async_trait::async_trait]
pub trait IMediaDownload: Send {
    /// Requests the next chunk
    ///
    /// Once a chunk with `done == true` has been returned, further calls
    /// return an empty chunk that is also `done`.
    async fn next_chunk(&mut self) -> anyhow::Result<MediaChunk>;
}

// ============================================================================
// IDriveProvider
// ============================================================================

/// Port trait for remote file store operations
#[async_trait::async_trait]
pub trait IDriveProvider: Send + Sync {
    /// Returns one page of files whose name equals `name` exactly
    ///
    /// # Arguments
    /// * `name` - The file name to match
    /// * `page_token` - Token from the previous page (None for the first page)
    async fn list_files_by_name(
        &self,
        name: &str,
        page_token: Option<&str>,
    ) -> anyhow::Result<FilePage>;

    /// Prepares a chunked download of the requested content
    ///
    /// No data is transferred until [`IMediaDownload::next_chunk`] is called.
    async fn open_download(
        &self,
        request: MediaRequest,
    ) -> anyhow::Result<Box<dyn IMediaDownload>>;
}
