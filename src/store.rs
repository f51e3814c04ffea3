use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;
use log::{debug, warn};
use uuid::Uuid;

use crate::error::PipelineError;

/// Key to bytes store receiving rendered cards
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Store `value` under `key`, replacing any previous value. A reader
    /// sees either the old value or the complete new one.
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), PipelineError>;
}

/// Artifacts kept in memory, mostly for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryArtifactStore {
    artifacts: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.artifacts
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .artifacts
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), PipelineError> {
        self.artifacts
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string(), value);
        Ok(())
    }
}

/// Artifacts written as files below a root directory.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsArtifactStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), PipelineError> {
        let storage_error = |reason: String| PipelineError::Storage {
            key: key.to_string(),
            reason,
        };

        if !is_valid_key(key) {
            return Err(storage_error("key must be a plain file name".to_string()));
        }

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| storage_error(e.to_string()))?;

        // Write next to the target and rename so readers never see a partial file.
        let tmp = self.root.join(format!(".{}.{}.tmp", key, Uuid::new_v4()));
        let target = self.path_for(key);
        let written = match tokio::fs::write(&tmp, &value).await {
            Ok(()) => tokio::fs::rename(&tmp, &target).await,
            Err(e) => Err(e),
        };

        if let Err(e) = written {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
                warn!("Failed to remove {}: {}", tmp.display(), cleanup);
            }
            return Err(storage_error(e.to_string()));
        }

        debug!("Stored {} ({} bytes)", target.display(), value.len());
        Ok(())
    }
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('.')
        && !key.contains(['/', '\\'])
        && Path::new(key).file_name().map(|n| n == key).unwrap_or(false)
}
