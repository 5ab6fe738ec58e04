//! Filesystem implementation of ArtifactStore.

use crate::error::EnvError;
use crate::ArtifactStore;
use std::fs;
use std::path::Path;

/// Store that writes real empty placeholder files.
///
/// This is the implementation used outside of dry runs. Directories are
/// created on demand.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsArtifactStore;

impl FsArtifactStore {
    pub fn new() -> Self {
        Self
    }
}

impl ArtifactStore for FsArtifactStore {
    fn create_placeholder(&self, path: &Path) -> Result<(), EnvError> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir).map_err(|e| EnvError::io(dir, e))?;
            }
        }
        fs::File::create(path).map_err(|e| EnvError::io(path, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_store_creates_empty_file() {
        let root = std::env::temp_dir().join(format!("vetsim-env-{}", uuid::Uuid::new_v4().simple()));
        let path = root.join("token").join("H1_idq_ovl-100-10.xml.gz");

        FsArtifactStore::new().create_placeholder(&path).unwrap();

        let meta = fs::metadata(&path).unwrap();
        assert!(meta.is_file());
        assert_eq!(meta.len(), 0);

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_fs_store_reports_path_on_failure() {
        let root = std::env::temp_dir().join(format!("vetsim-env-{}", uuid::Uuid::new_v4().simple()));
        fs::create_dir_all(&root).unwrap();
        // A regular file where a directory is expected
        let blocker = root.join("blocker");
        fs::File::create(&blocker).unwrap();

        let err = FsArtifactStore::new()
            .create_placeholder(&blocker.join("child.json"))
            .unwrap_err();

        assert_eq!(err.path(), blocker.as_path());

        fs::remove_dir_all(&root).unwrap();
    }
}
