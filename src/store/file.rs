//! File-tier storage, grounded on `content_saver::cache_check::get_mirror_path_sync`:
//! results are mirrored under `<root>/<fingerprint[0..2]>/<fingerprint>.json`
//! so a single directory never accumulates millions of entries.

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::StoreError;

pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let shard = key.get(0..2).unwrap_or(key);
        self.root.join(shard).join(format!("{key}.json"))
    }

    pub async fn store(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::FileIo(e.to_string()))?;
        }
        fs::write(&path, bytes)
            .await
            .map_err(|e| StoreError::FileIo(e.to_string()))
    }

    pub async fn load(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::FileIo(e.to_string())),
        }
    }

    pub async fn delete(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::FileIo(e.to_string())),
        }
    }

    pub async fn exists(&self, key: &str) -> bool {
        fs::metadata(self.path_for(key)).await.is_ok()
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.store("abcd1234", b"payload").await.unwrap();
        assert_eq!(store.load("abcd1234").await.unwrap(), Some(b"payload".to_vec()));
    }

    #[tokio::test]
    async fn missing_key_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        assert_eq!(store.load("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn delete_removes_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.store("k", b"v").await.unwrap();
        store.delete("k").await.unwrap();
        assert!(!store.exists("k").await);
    }
}
