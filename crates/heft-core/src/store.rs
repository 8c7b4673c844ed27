//! Collaborator contracts: metadata lookup and artifact storage.
//!
//! The resolver only sees these traits; the filesystem backends below make
//! the service runnable end to end without external infrastructure.

use crate::error::CostError;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// A stored package record as returned by the metadata store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageRecord {
    pub id: String,
    pub name: String,
    pub version: String,
    pub artifact_key: String,
}

/// Metadata lookup by package identifier.
pub trait MetadataStore: Send + Sync {
    /// Look up a stored package record.
    ///
    /// Absence is `Ok(None)`, not an error.
    fn lookup_by_id(&self, id: &str) -> Result<Option<PackageRecord>, CostError>;
}

/// Binary artifact storage.
pub trait ArtifactStore: Send + Sync {
    /// Content length of a stored artifact without fetching it.
    fn head_size(&self, key: &str) -> Result<Option<u64>, CostError>;

    /// Full artifact bytes.
    fn get_bytes(&self, key: &str) -> Result<Option<Bytes>, CostError>;
}

/// Normalize an artifact key to its stored form.
#[must_use]
pub fn normalize_artifact_key(key: &str) -> String {
    if key.ends_with(".zip") {
        key.to_string()
    } else {
        format!("{key}.zip")
    }
}

/// Check a query identifier against the allowed `[A-Za-z0-9-]+` alphabet.
#[must_use]
pub fn is_valid_package_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Filesystem-backed metadata store: a JSON index mapping id -> record.
#[derive(Debug, Clone)]
pub struct FsMetadataStore {
    records: HashMap<String, PackageRecord>,
}

impl FsMetadataStore {
    /// Load the index file.
    ///
    /// # Errors
    /// Returns `STORE_ERROR` if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, CostError> {
        let content = fs::read_to_string(path).map_err(|e| {
            CostError::store(format!("Failed to read index '{}': {e}", path.display()))
        })?;

        let records: HashMap<String, PackageRecord> = serde_json::from_str(&content)
            .map_err(|e| CostError::store(format!("Invalid index '{}': {e}", path.display())))?;

        Ok(Self { records })
    }

    /// Number of indexed packages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl MetadataStore for FsMetadataStore {
    fn lookup_by_id(&self, id: &str) -> Result<Option<PackageRecord>, CostError> {
        Ok(self.records.get(id).cloned())
    }
}

/// Filesystem-backed artifact store: one blob per normalized key.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    /// Create a store over the given blob directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn blob_path(&self, key: &str) -> Option<PathBuf> {
        // Keys are derived from package names; keep them inside the root.
        // `join` would replace the root entirely for an absolute key.
        let path = Path::new(key);
        if path.is_absolute() || path.components().any(|c| matches!(c, Component::ParentDir)) {
            return None;
        }
        Some(self.root.join(normalize_artifact_key(key)))
    }
}

impl ArtifactStore for FsArtifactStore {
    fn head_size(&self, key: &str) -> Result<Option<u64>, CostError> {
        let Some(path) = self.blob_path(key) else {
            return Ok(None);
        };

        match fs::metadata(&path) {
            Ok(meta) => Ok(Some(meta.len())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CostError::store(format!(
                "Failed to stat '{}': {e}",
                path.display()
            ))),
        }
    }

    fn get_bytes(&self, key: &str) -> Result<Option<Bytes>, CostError> {
        let Some(path) = self.blob_path(key) else {
            return Ok(None);
        };

        match fs::read(&path) {
            Ok(bytes) => Ok(Some(Bytes::from(bytes))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CostError::store(format!(
                "Failed to read '{}': {e}",
                path.display()
            ))),
        }
    }
}
