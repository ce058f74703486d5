//! Domain error types
//!
//! This module defines error types for domain validation: malformed
//! identifiers, unusable local names and invalid manifest entries.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid remote ID format
    #[error("Invalid remote ID: {0}")]
    InvalidRemoteId(String),

    /// Invalid MIME type string
    #[error("Invalid MIME type: {0}")]
    InvalidMimeType(String),

    /// Local file name that cannot be placed under the output directory
    #[error("Invalid local name: {0}")]
    InvalidLocalName(String),

    /// Entry `type` outside the supported set
    #[error("Invalid entry type '{0}'; only 'gapps' and 'other' are allowed")]
    InvalidEntryType(String),

    /// The manifest document could not be parsed
    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),
}
