//! Domain types and validation rules
//!
//! This module contains the core domain types for drivesync:
//! - Newtypes for remote identifiers, MIME types and local file names
//! - The manifest document and its entry descriptors
//! - Entry classification (raw download vs. document export)
//! - Domain-specific error types

pub mod entry;
pub mod errors;
pub mod manifest;
pub mod newtypes;

// Re-export commonly used types
pub use entry::{EntryDescriptor, EntryKind, EntryPlan, FetchTarget, IdSource};
pub use errors::DomainError;
pub use manifest::Manifest;
pub use newtypes::*;
