use crate::{CacheEntry, CacheError, CacheKey, CacheStore};
use async_trait::async_trait;
use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Filesystem-backed cache store.
///
/// Entries live at `<root>/<provider>/<digest>.json`, one file per key, so
/// they remain valid cache hits after a restart. Reads and writes for
/// different keys touch different files and never block each other; the
/// last writer for a given key wins.
#[derive(Debug, Clone)]
pub struct FsCacheStore {
    root: PathBuf,
}

impl FsCacheStore {
    pub async fn new(root: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.root
            .join(key.provider())
            .join(format!("{}.json", key.digest()))
    }

    async fn clear_dir(dir: &Path) -> Result<u64, CacheError> {
        let mut removed = 0u64;
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            if entry.path().extension().is_some_and(|ext| ext == "json") {
                tokio::fs::remove_file(entry.path()).await?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[async_trait]
impl CacheStore for FsCacheStore {
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        let path = self.entry_path(key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let entry: CacheEntry = serde_json::from_slice(&bytes)
            .map_err(|e| CacheError::Deserialization(e.to_string()))?;

        if entry.is_expired(Utc::now()) {
            // Logically deleted already; reclaim the file while we are here.
            let _ = tokio::fs::remove_file(&path).await;
            return Ok(None);
        }

        Ok(Some(entry))
    }

    async fn set(&self, entry: CacheEntry) -> Result<(), CacheError> {
        let dir = self.root.join(&entry.provider);
        tokio::fs::create_dir_all(&dir).await?;

        let bytes = serde_json::to_vec(&entry)
            .map_err(|e| CacheError::Serialization(e.to_string()))?;
        let path = dir.join(format!("{}.json", entry.key));
        tokio::fs::write(&path, bytes).await?;

        debug!("cached response for key: {}:{}", entry.provider, entry.key);
        Ok(())
    }

    async fn clear(&self, scope: Option<&str>) -> Result<u64, CacheError> {
        match scope {
            Some(provider) => Self::clear_dir(&self.root.join(provider)).await,
            None => {
                let mut removed = 0u64;
                let mut dirs = tokio::fs::read_dir(&self.root).await?;
                while let Some(dir) = dirs.next_entry().await? {
                    if dir.file_type().await?.is_dir() {
                        removed += Self::clear_dir(&dir.path()).await?;
                    }
                }
                Ok(removed)
            }
        }
    }
}
