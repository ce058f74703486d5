//! Domain newtypes with validation
//!
//! This module provides strongly-typed wrappers for domain identifiers and values.
//! Each newtype ensures data validity at construction time.

use std::fmt::{self, Display, Formatter};
use std::path::{Component, Path};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

// ============================================================================
// RemoteId
// ============================================================================

/// Google Drive file identifier
///
/// Drive IDs are URL-safe strings made of ASCII letters, digits, `-` and `_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RemoteId(String);

impl RemoteId {
    /// Create a new RemoteId
    ///
    /// # Errors
    /// Returns error if the ID is empty or contains characters outside `[A-Za-z0-9_-]`
    pub fn new(id: String) -> Result<Self, DomainError> {
        if id.is_empty() {
            return Err(DomainError::InvalidRemoteId(
                "Remote ID cannot be empty".to_string(),
            ));
        }

        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(DomainError::InvalidRemoteId(format!(
                "Remote ID contains invalid characters: {id}"
            )));
        }

        Ok(Self(id))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RemoteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RemoteId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for RemoteId {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RemoteId> for String {
    fn from(id: RemoteId) -> Self {
        id.0
    }
}

// ============================================================================
// MimeType
// ============================================================================

/// MIME type used when the manifest does not name an export format
pub const DEFAULT_EXPORT_MIME: &str = "application/pdf";

/// Preferred extensions for the export formats Google Drive offers.
///
/// `mime_guess` lists extensions alphabetically, which picks odd ones for
/// common types (`text/plain` -> `asc`), so these take precedence.
const PREFERRED_EXTENSIONS: &[(&str, &str)] = &[
    ("application/pdf", "pdf"),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "docx",
    ),
    (
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "xlsx",
    ),
    (
        "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "pptx",
    ),
    ("application/vnd.oasis.opendocument.text", "odt"),
    ("application/vnd.oasis.opendocument.spreadsheet", "ods"),
    ("application/vnd.oasis.opendocument.presentation", "odp"),
    ("application/rtf", "rtf"),
    ("application/epub+zip", "epub"),
    ("application/zip", "zip"),
    ("text/plain", "txt"),
    ("text/csv", "csv"),
    ("text/tab-separated-values", "tsv"),
    ("text/html", "html"),
    ("text/markdown", "md"),
    ("image/jpeg", "jpg"),
    ("image/png", "png"),
    ("image/svg+xml", "svg"),
];

/// A MIME type string such as `application/pdf`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MimeType(String);

impl MimeType {
    /// Create a new MimeType
    ///
    /// # Errors
    /// Returns error unless the value has the `type/subtype` shape
    pub fn new(mime: String) -> Result<Self, DomainError> {
        let mime = mime.trim().to_string();
        let valid = match mime.split_once('/') {
            Some((kind, subtype)) => {
                !kind.is_empty()
                    && !subtype.is_empty()
                    && !subtype.contains('/')
                    && !mime.chars().any(char::is_whitespace)
            }
            None => false,
        };

        if !valid {
            return Err(DomainError::InvalidMimeType(mime));
        }

        Ok(Self(mime))
    }

    /// The MIME type used for exports when none is configured
    #[must_use]
    pub fn default_export() -> Self {
        Self(DEFAULT_EXPORT_MIME.to_string())
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Guess the file extension (without the leading dot) for this MIME type
    #[must_use]
    pub fn file_extension(&self) -> Option<&'static str> {
        let essence = self
            .0
            .split(';')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();

        PREFERRED_EXTENSIONS
            .iter()
            .find(|(mime, _)| *mime == essence)
            .map(|(_, ext)| *ext)
            .or_else(|| {
                mime_guess::get_mime_extensions_str(&essence)
                    .and_then(|exts| exts.first())
                    .copied()
            })
    }
}

impl Display for MimeType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MimeType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for MimeType {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<MimeType> for String {
    fn from(mime: MimeType) -> Self {
        mime.0
    }
}

// ============================================================================
// LocalName
// ============================================================================

/// Relative file name of a downloaded item inside the output directory
///
/// May contain sub-directories, but never escapes the output directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocalName(String);

impl LocalName {
    /// Create a new LocalName
    ///
    /// # Errors
    /// Returns error if the name is empty, absolute, or contains `..`
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::InvalidLocalName(
                "Local name cannot be empty".to_string(),
            ));
        }

        let path = Path::new(&name);
        let mut has_file_part = false;
        for component in path.components() {
            match component {
                Component::Normal(_) => has_file_part = true,
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(DomainError::InvalidLocalName(format!(
                        "must be a relative path inside the output directory: {name}"
                    )));
                }
            }
        }

        if !has_file_part || name.ends_with('/') {
            return Err(DomainError::InvalidLocalName(format!(
                "does not name a file: {name}"
            )));
        }

        Ok(Self(name))
    }

    /// Returns a new name with `.{ext}` appended verbatim.
    ///
    /// The existing extension is never replaced: `report.pdf` becomes
    /// `report.pdf.pdf`.
    #[must_use]
    pub fn with_appended_extension(&self, ext: &str) -> Self {
        Self(format!("{}.{}", self.0, ext))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// View the name as a relative path
    #[must_use]
    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl Display for LocalName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LocalName {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
