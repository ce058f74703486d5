//! Use cases (interactors) for drivesync
//!
//! This module contains the application use cases that orchestrate
//! domain entities and port interfaces. Use cases are thin coordinators
//! that delegate business rules to domain methods and I/O to ports.
//!
//! ## Use Cases
//!
//! - [`AcquireCredentialUseCase`] - Load, refresh or interactively obtain the OAuth credential
//! - [`ResolveRemoteIdUseCase`] - Map a file name to a Drive file ID
//! - [`FetchContentUseCase`] - Chunked download of raw files and document exports
//! - [`ReconcileManifestUseCase`] - Drive the resolver and fetcher over a manifest

pub mod acquire_credential;
pub mod fetch_content;
pub mod reconcile;
pub mod resolve_remote_id;

#[cfg(test)]
pub(crate) mod test_support;

pub use acquire_credential::{AcquireCredentialUseCase, CredentialStatus};
pub use fetch_content::FetchContentUseCase;
pub use reconcile::{ReconcileManifestUseCase, ReconcileSummary};
pub use resolve_remote_id::ResolveRemoteIdUseCase;
