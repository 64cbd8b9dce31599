//! Storage for the persisted chart configuration blob.
//!
//! The blob is read and written wholesale. [`FileBlobStore`] keeps it in a
//! single JSON file with atomic replacement; [`MemoryBlobStore`] keeps it in
//! memory for tests and ephemeral servers.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use rollcall_core::Result;

/// Where the serialized chart configuration lives.
#[async_trait]
pub trait ChartBlobStore: Send + Sync {
    /// Short human-readable description for logs.
    fn describe(&self) -> String;

    /// Read the stored blob, `None` when nothing has been saved yet.
    async fn load(&self) -> Result<Option<String>>;

    /// Replace the stored blob.
    async fn save(&self, blob: &str) -> Result<()>;
}

/// Blob kept in one file on disk.
pub struct FileBlobStore {
    path: PathBuf,
}

impl FileBlobStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ChartBlobStore for FileBlobStore {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn load(&self) -> Result<Option<String>> {
        if !fs::try_exists(&self.path).await? {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(&self.path).await?))
    }

    async fn save(&self, blob: &str) -> Result<()> {
        debug!(path = %self.path.display(), size = blob.len(), "chart_blob: write");

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| {
                warn!(parent = %parent.display(), error = %e, "chart_blob: create_dir_all failed");
                e
            })?;
        }

        // Atomic write: temp file + rename
        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await.map_err(|e| {
            warn!(temp_path = %temp_path.display(), error = %e, "chart_blob: File::create failed");
            e
        })?;
        file.write_all(blob.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            warn!(from = %temp_path.display(), to = %self.path.display(), error = %e, "chart_blob: rename failed");
            e
        })?;

        Ok(())
    }
}

/// Blob kept in memory.
#[derive(Default)]
pub struct MemoryBlobStore {
    blob: RwLock<Option<String>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: RwLock::new(Some(blob.into())),
        }
    }
}

#[async_trait]
impl ChartBlobStore for MemoryBlobStore {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    async fn load(&self) -> Result<Option<String>> {
        Ok(self.blob.read().await.clone())
    }

    async fn save(&self, blob: &str) -> Result<()> {
        *self.blob.write().await = Some(blob.to_string());
        Ok(())
    }
}
