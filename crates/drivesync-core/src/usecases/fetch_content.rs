//! Content fetch use case
//!
//! Streams a remote file, or an export of a Google Workspace document, into
//! the output directory in bounded chunks. The chunk size is applied by the
//! provider adapter; this use case owns the destination file and the loop.
//!
//! A failure mid-stream propagates and leaves the partial file in place.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::{
    domain::{LocalName, MimeType, RemoteId},
    ports::{IDriveProvider, MediaRequest},
};

/// Permissions of directories created for downloads
#[cfg(unix)]
const DIR_MODE: u32 = 0o755;

/// Use case for downloading content into the output directory
pub struct FetchContentUseCase {
    provider: Arc<dyn IDriveProvider>,
    output_dir: PathBuf,
}

impl FetchContentUseCase {
    /// Creates a new FetchContentUseCase writing below `output_dir`
    pub fn new(provider: Arc<dyn IDriveProvider>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            provider,
            output_dir: output_dir.into(),
        }
    }

    /// Downloads the stored bytes of `id` to `<output_dir>/<name>`
    ///
    /// # Returns
    ///
    /// The path of the written file
    pub async fn fetch_raw(&self, id: &RemoteId, name: &LocalName) -> Result<PathBuf> {
        info!("Downloading file {name}...");
        let destination = self.output_dir.join(name.as_path());
        self.download(MediaRequest::Raw { id: id.clone() }, destination)
            .await
    }

    /// Exports the document `id` as `mime` to `<output_dir>/<name>.<ext>`
    ///
    /// The extension guessed from `mime` is always appended, even when
    /// `name` already ends with it. Unknown MIME types append nothing.
    ///
    /// # Returns
    ///
    /// The path of the written file
    pub async fn fetch_exported(
        &self,
        id: &RemoteId,
        name: &LocalName,
        mime: &MimeType,
    ) -> Result<PathBuf> {
        let name = match mime.file_extension() {
            Some(ext) => name.with_appended_extension(ext),
            None => {
                warn!("No file extension known for {mime}, saving {name} as is");
                name.clone()
            }
        };

        info!("Downloading document {name}...");
        let destination = self.output_dir.join(name.as_path());
        self.download(
            MediaRequest::Export {
                id: id.clone(),
                mime: mime.clone(),
            },
            destination,
        )
        .await
    }

    async fn download(&self, request: MediaRequest, destination: PathBuf) -> Result<PathBuf> {
        create_dir_all(&self.output_dir).await?;
        if let Some(parent) = destination.parent() {
            create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::File::create(&destination)
            .await
            .with_context(|| format!("Failed to create {}", destination.display()))?;

        let mut transfer = self
            .provider
            .open_download(request)
            .await
            .context("Failed to start download")?;

        loop {
            let chunk = transfer
                .next_chunk()
                .await
                .with_context(|| format!("Failed to download {}", destination.display()))?;

            if chunk.data.is_empty() && !chunk.done {
                bail!(
                    "Download of {} stalled after {} bytes",
                    destination.display(),
                    chunk.progress
                );
            }

            file.write_all(&chunk.data)
                .await
                .with_context(|| format!("Failed to write {}", destination.display()))?;

            match chunk.total {
                Some(total) if total > 0 => {
                    debug!("Download {}%.", chunk.progress * 100 / total)
                }
                _ => debug!("Downloaded {} bytes.", chunk.progress),
            }

            if chunk.done {
                break;
            }
        }

        file.flush()
            .await
            .with_context(|| format!("Failed to write {}", destination.display()))?;
        Ok(destination)
    }
}

async fn create_dir_all(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() || path.is_dir() {
        return Ok(());
    }

    let mut builder = tokio::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(DIR_MODE);
    builder
        .create(path)
        .await
        .with_context(|| format!("Failed to create directory {}", path.display()))
}
