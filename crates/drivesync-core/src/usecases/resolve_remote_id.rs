//! Remote ID resolution use case
//!
//! Maps a display name to a Drive file ID by walking the pages of an
//! exact-name search. The first page with any match decides: its first file
//! wins and later pages are never requested.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, error, warn};

use crate::{domain::RemoteId, ports::IDriveProvider};

/// Use case for looking up file IDs by name
pub struct ResolveRemoteIdUseCase {
    provider: Arc<dyn IDriveProvider>,
}

impl ResolveRemoteIdUseCase {
    /// Creates a new ResolveRemoteIdUseCase
    pub fn new(provider: Arc<dyn IDriveProvider>) -> Self {
        Self { provider }
    }

    /// Returns the ID of the file named exactly `name`
    ///
    /// # Returns
    ///
    /// `Ok(None)` when no file has that name. When several do, the first
    /// match of the first non-empty page is returned and a warning logged.
    ///
    /// # Errors
    ///
    /// Returns an error if a search request fails or the server returns an
    /// ID that is not a valid Drive file ID.
    pub async fn resolve_by_name(&self, name: &str) -> Result<Option<RemoteId>> {
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .provider
                .list_files_by_name(name, page_token.as_deref())
                .await
                .with_context(|| format!("Failed to search Drive for '{name}'"))?;

            if let Some(first) = page.files.first() {
                if page.files.len() > 1 {
                    warn!("Found more than one file for {name}. Using only first one.");
                }
                let id = RemoteId::new(first.id.clone())
                    .with_context(|| format!("Drive returned an invalid ID for '{name}'"))?;
                debug!("Resolved {name} to {id}");
                return Ok(Some(id));
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => {
                    error!("File {name} not found on Google Drive.");
                    return Ok(None);
                }
            }
        }
    }
}
