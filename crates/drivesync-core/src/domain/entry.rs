//! Manifest entry descriptors and their classification
//!
//! An [`EntryDescriptor`] is the value side of one manifest mapping. It is
//! kept exactly as written in the document; defaults for `type` and `format`
//! are computed on read by [`EntryDescriptor::kind`] and
//! [`EntryDescriptor::target`].

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::{LocalName, MimeType, RemoteId};

/// Manifest value for `type` that selects a document export
pub const KIND_GAPPS: &str = "gapps";

/// Manifest value for `type` that selects a raw download
pub const KIND_OTHER: &str = "other";

/// One manifest entry as written in the document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDescriptor {
    /// Remote file ID; looked up by file name when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// `gapps` or `other`; `other` when absent
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Export MIME type, only used for `gapps` entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// How a remote file is stored in Drive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Native Google Workspace document that must be exported
    GoogleApps,
    /// Regular binary file downloaded as-is
    Other,
}

impl EntryKind {
    /// Parses the manifest `type` value, applying the `other` default
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidEntryType`] for values outside `{gapps, other}`
    pub fn parse(value: Option<&str>) -> Result<Self, DomainError> {
        match value {
            None | Some(KIND_OTHER) => Ok(Self::Other),
            Some(KIND_GAPPS) => Ok(Self::GoogleApps),
            Some(other) => Err(DomainError::InvalidEntryType(other.to_string())),
        }
    }

    /// The manifest spelling of this kind
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GoogleApps => KIND_GAPPS,
            Self::Other => KIND_OTHER,
        }
    }
}

impl Display for EntryKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the remote ID of an entry comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdSource {
    /// The manifest names the ID
    Explicit(RemoteId),
    /// The ID is looked up by file name
    Lookup,
}

/// The offline checks of one entry, in the order a sync applies them
///
/// Name and explicit ID are hard requirements, so [`EntryDescriptor::plan`]
/// fails on them. Classification only matters once the ID is known and is
/// kept as a result for the caller to inspect after identification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPlan {
    pub local_name: LocalName,
    pub id: IdSource,
    pub target: Result<FetchTarget, DomainError>,
}

/// What to download for an entry once its ID is known
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchTarget {
    /// Download the stored bytes
    Raw,
    /// Export a Google Workspace document in the given format
    Exported(MimeType),
}

impl EntryDescriptor {
    /// Creates a descriptor with an explicit remote ID
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Sets the `type` field
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Sets the `format` field
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// The effective kind, `other` when the field is absent
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidEntryType`] for unsupported values
    pub fn effective_kind(&self) -> Result<EntryKind, DomainError> {
        EntryKind::parse(self.kind.as_deref())
    }

    /// The effective export format, `application/pdf` when absent
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidMimeType`] for malformed values
    pub fn effective_format(&self) -> Result<MimeType, DomainError> {
        match &self.format {
            Some(format) => MimeType::new(format.clone()),
            None => Ok(MimeType::default_export()),
        }
    }

    /// Classifies the entry into a fetch target
    ///
    /// The format is only consulted for `gapps` entries, so a malformed
    /// `format` on an `other` entry is ignored.
    ///
    /// # Errors
    /// Returns an error for an invalid `type`, or an invalid `format` on a
    /// `gapps` entry
    pub fn target(&self) -> Result<FetchTarget, DomainError> {
        match self.effective_kind()? {
            EntryKind::GoogleApps => Ok(FetchTarget::Exported(self.effective_format()?)),
            EntryKind::Other => Ok(FetchTarget::Raw),
        }
    }

    /// Validates the entry stored under `name` without touching the network
    ///
    /// # Errors
    /// Returns an error when `name` is not a plain file name or the explicit
    /// ID is malformed
    pub fn plan(&self, name: &str) -> Result<EntryPlan, DomainError> {
        let local_name = LocalName::new(name)?;
        let id = match &self.id {
            Some(id) => IdSource::Explicit(RemoteId::new(id.clone())?),
            None => IdSource::Lookup,
        };
        Ok(EntryPlan {
            local_name,
            id,
            target: self.target(),
        })
    }
}
