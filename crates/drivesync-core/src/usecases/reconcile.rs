//! Manifest reconciliation use case
//!
//! Walks the manifest in document order. Each entry is identified (explicit
//! ID or name lookup), classified (raw download or document export) and then
//! fetched. Entries that cannot be identified or classified are skipped with
//! an error log; a failing fetch aborts the whole run.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::{
    domain::{DomainError, EntryDescriptor, EntryKind, FetchTarget, IdSource, Manifest},
    usecases::{FetchContentUseCase, ResolveRemoteIdUseCase},
};

/// Counts of entry outcomes for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    /// Entries whose fetch returned
    pub fetched: usize,
    /// Entries skipped because they could not be resolved or classified
    pub skipped: usize,
}

/// Use case for bringing the output directory in line with a manifest
pub struct ReconcileManifestUseCase {
    resolver: ResolveRemoteIdUseCase,
    fetcher: FetchContentUseCase,
}

impl ReconcileManifestUseCase {
    /// Creates a new ReconcileManifestUseCase
    pub fn new(resolver: ResolveRemoteIdUseCase, fetcher: FetchContentUseCase) -> Self {
        Self { resolver, fetcher }
    }

    /// Processes every manifest entry, strictly one after another
    ///
    /// # Errors
    ///
    /// Returns an error if a name lookup or a download fails. Entries
    /// already fetched stay on disk.
    pub async fn run(&self, manifest: &Manifest) -> Result<ReconcileSummary> {
        let mut summary = ReconcileSummary::default();

        for (name, entry) in manifest.entries() {
            if self.process(name, entry).await? {
                summary.fetched += 1;
            } else {
                summary.skipped += 1;
            }
        }

        info!(
            "Processed {} entries: {} fetched, {} skipped",
            manifest.len(),
            summary.fetched,
            summary.skipped
        );
        Ok(summary)
    }

    /// Returns whether the entry was fetched
    async fn process(&self, name: &str, entry: &EntryDescriptor) -> Result<bool> {
        let plan = match entry.plan(name) {
            Ok(plan) => plan,
            Err(e) => {
                error!("Skipping file {name}: {e}");
                return Ok(false);
            }
        };

        // Identify
        let id = match plan.id {
            IdSource::Explicit(id) => id,
            IdSource::Lookup => {
                debug!("ID not found in manifest for {name}. Trying to fetch based on filename.");
                match self.resolver.resolve_by_name(name).await? {
                    Some(id) => id,
                    None => {
                        error!("Skipping file {name} as no ID is retrieved.");
                        return Ok(false);
                    }
                }
            }
        };

        // Classify
        let target = match plan.target {
            Ok(target) => target,
            Err(DomainError::InvalidEntryType(_)) => {
                error!("Skipping file for wrong type. Only 'gapps' and 'other' allowed.");
                return Ok(false);
            }
            Err(e) => {
                error!("Skipping file {name}: {e}");
                return Ok(false);
            }
        };

        // Fetch
        debug!("Started download for {name}:{id} with type {}", kind_label(&target));
        match target {
            FetchTarget::Exported(mime) => {
                self.fetcher
                    .fetch_exported(&id, &plan.local_name, &mime)
                    .await
                    .with_context(|| format!("Failed to export {name}"))?;
            }
            FetchTarget::Raw => {
                self.fetcher
                    .fetch_raw(&id, &plan.local_name)
                    .await
                    .with_context(|| format!("Failed to download {name}"))?;
            }
        }
        Ok(true)
    }
}

fn kind_label(target: &FetchTarget) -> &'static str {
    match target {
        FetchTarget::Exported(_) => EntryKind::GoogleApps.as_str(),
        FetchTarget::Raw => EntryKind::Other.as_str(),
    }
}
