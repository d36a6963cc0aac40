//! Persistence backends for the account collection
//!
//! The collection is stored as one JSON document and is always read and
//! written whole. Backends only move raw text; (de)serialization
//! and revision fingerprints are shared by the trait's provided methods.

use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

use crate::core::models::{AccountRecord, AppError, AppResult};
use crate::utils::file_utils::write_atomic;

/// Whole-collection storage with read-whole / write-whole semantics
pub trait AccountStorage: Send + Sync {
    /// Raw stored document, `None` when nothing was ever written
    fn read_raw(&self) -> AppResult<Option<String>>;

    /// Replace the stored document
    fn write_raw(&self, contents: &str) -> AppResult<()>;

    /// Load the collection; `Ok(None)` is the first-run signal
    fn load(&self) -> AppResult<Option<Vec<AccountRecord>>> {
        match self.read_raw()? {
            Some(raw) => {
                let accounts = serde_json::from_str::<Vec<AccountRecord>>(&raw).map_err(|e| {
                    AppError::Storage(format!("Stored collection is not valid JSON: {}", e))
                })?;
                Ok(Some(accounts))
            }
            None => Ok(None),
        }
    }

    /// Serialize and persist the whole collection, returning the new revision
    fn save(&self, accounts: &[AccountRecord]) -> AppResult<String> {
        let contents = serde_json::to_string(accounts)?;
        self.write_raw(&contents)?;
        Ok(revision_of(&contents))
    }

    /// Fingerprint of the stored document, `None` when nothing is stored
    fn revision(&self) -> AppResult<Option<String>> {
        Ok(self.read_raw()?.as_deref().map(revision_of))
    }
}

/// SHA-256 hex digest of a stored document
pub fn revision_of(contents: &str) -> String {
    hex::encode(Sha256::digest(contents.as_bytes()))
}

/// JSON file backend shared by every process pointing at the same path
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AccountStorage for FileStorage {
    fn read_raw(&self) -> AppResult<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Storage(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn write_raw(&self, contents: &str) -> AppResult<()> {
        write_atomic(&self.path, contents.as_bytes()).map_err(|e| {
            AppError::Storage(format!("Failed to write {}: {}", self.path.display(), e))
        })?;
        debug!("Persisted {} bytes to {}", contents.len(), self.path.display());
        Ok(())
    }
}

/// In-process backend, mainly for tests; counts writes
#[derive(Debug, Default)]
pub struct MemoryStorage {
    contents: Mutex<Option<String>>,
    writes: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing raw document (possibly corrupt)
    pub fn with_raw(contents: impl Into<String>) -> Self {
        Self {
            contents: Mutex::new(Some(contents.into())),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.contents.lock().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl AccountStorage for MemoryStorage {
    fn read_raw(&self) -> AppResult<Option<String>> {
        Ok(self.contents.lock().clone())
    }

    fn write_raw(&self, contents: &str) -> AppResult<()> {
        *self.contents.lock() = Some(contents.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::seed::default_accounts;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_first_run() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("accounts.json"));

        assert!(storage.load().unwrap().is_none());
        assert!(storage.revision().unwrap().is_none());
    }

    #[test]
    fn test_file_save_and_load() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested").join("accounts.json"));
        let accounts = default_accounts();

        let revision = storage.save(&accounts).unwrap();

        assert_eq!(storage.load().unwrap(), Some(accounts));
        assert_eq!(storage.revision().unwrap(), Some(revision));
    }

    #[test]
    fn test_corrupt_document_is_storage_error() {
        let storage = MemoryStorage::with_raw("{not json");
        assert!(matches!(storage.load(), Err(AppError::Storage(_))));
    }

    #[test]
    fn test_revision_changes_with_contents() {
        let storage = MemoryStorage::new();
        let first = storage.save(&default_accounts()).unwrap();
        let second = storage.save(&default_accounts()[..2]).unwrap();

        assert_ne!(first, second);
        assert_eq!(storage.write_count(), 2);
    }
}
