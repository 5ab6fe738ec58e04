//! Artifact store abstraction for placeholder output files.

use crate::error::EnvError;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// The filesystem side effect of schedule generation.
///
/// Generated log actions reference plots and data tables that a real
/// pipeline would upload. The generator asks a store to materialise an
/// empty placeholder for each one.
///
/// # Implementations
///
/// - **Filesystem**: `FsArtifactStore` - creates directories and empty files
/// - **In-memory**: `MemoryArtifactStore` - records paths only (dry runs, tests)
///
/// Placeholders are created once, never modified and never deleted.
pub trait ArtifactStore: Send + Sync {
    /// Ensures `path`'s parent directory exists and creates an empty file.
    ///
    /// # Returns
    /// * `Ok(())` - Placeholder exists at `path`
    /// * `Err(EnvError::Io)` - Directory or file creation failed (not retried)
    fn create_placeholder(&self, path: &Path) -> Result<(), EnvError>;
}

/// Store that records requested placeholders without touching the disk.
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    created: Mutex<Vec<PathBuf>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every path requested so far, in request order.
    pub fn created(&self) -> Vec<PathBuf> {
        self.created
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Returns the number of placeholders requested so far.
    pub fn len(&self) -> usize {
        self.created
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn create_placeholder(&self, path: &Path) -> Result<(), EnvError> {
        self.created
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(path.to_path_buf());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_records_paths() {
        let store = MemoryArtifactStore::new();
        assert!(store.is_empty());

        store.create_placeholder(Path::new("a/b/c.json")).unwrap();
        store.create_placeholder(Path::new("a/b/d.png")).unwrap();

        assert_eq!(store.len(), 2);
        assert_eq!(store.created()[1], PathBuf::from("a/b/d.png"));
    }
}
