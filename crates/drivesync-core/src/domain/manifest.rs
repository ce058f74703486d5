//! The manifest document
//!
//! A manifest is a JSON object mapping desired local file names to
//! [`EntryDescriptor`]s:
//!
//! ```json
//! {
//!     "report.pdf": {"id": "abc123", "type": "gapps"},
//!     "budget": {"type": "gapps", "format": "text/csv"},
//!     "photo.jpg": {}
//! }
//! ```
//!
//! Entries keep the order in which they appear in the document; that order is
//! the processing order. A repeated key keeps its first position and its last
//! value.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use super::entry::EntryDescriptor;
use super::errors::DomainError;

/// Ordered mapping of local file names to entry descriptors
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<(String, EntryDescriptor)>,
}

impl Manifest {
    /// Creates an empty manifest
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a manifest from its JSON text
    ///
    /// # Errors
    /// Returns [`DomainError::InvalidManifest`] when the text is not a JSON
    /// object of entry descriptors
    pub fn parse(json: &str) -> Result<Self, DomainError> {
        serde_json::from_str(json).map_err(|e| DomainError::InvalidManifest(e.to_string()))
    }

    /// Loads the manifest at `path`, creating an empty one first if the file
    /// does not exist.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if !path.is_file() {
            debug!("{} not found. Making a dummy.", path.display());
            Self::new().save(path)?;
        }

        debug!("Loading {}", path.display());
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        let manifest = Self::parse(&content)
            .with_context(|| format!("Failed to parse manifest {}", path.display()))?;
        Ok(manifest)
    }

    /// Writes the manifest to `path` as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create manifest directory {}", parent.display())
                })?;
            }
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize manifest")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write manifest {}", path.display()))?;
        Ok(())
    }

    /// Inserts or replaces an entry; a replaced entry keeps its position
    pub fn insert(&mut self, name: impl Into<String>, entry: EntryDescriptor) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = entry,
            None => self.entries.push((name, entry)),
        }
    }

    /// Looks up an entry by local name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&EntryDescriptor> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, entry)| entry)
    }

    /// Iterates entries in document order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &EntryDescriptor)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the manifest has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Manifest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, entry) in &self.entries {
            map.serialize_entry(name, entry)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Manifest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ManifestVisitor;

        impl<'de> Visitor<'de> for ManifestVisitor {
            type Value = Manifest;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping file names to entry descriptors")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Manifest, A::Error> {
                let mut manifest = Manifest::new();
                while let Some((name, entry)) =
                    access.next_entry::<String, EntryDescriptor>()?
                {
                    manifest.insert(name, entry);
                }
                Ok(manifest)
            }
        }

        deserializer.deserialize_map(ManifestVisitor)
    }
}
