use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("save cancelled")]
    Cancelled,
}

/// Capability port: existence check plus save under a derived name.
///
/// `save` must be atomic from the engine's point of view: an artifact is
/// either fully written or absent. The token lets remote implementations
/// abandon an in-flight write.
#[async_trait::async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn exists(&self, name: &str) -> Result<bool, StoreError>;
    async fn save(
        &self,
        name: &str,
        bytes: &[u8],
        cancel: &CancellationToken,
    ) -> Result<(), StoreError>;
}

/// Directory-backed store writing via a temp file and rename.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    dir: PathBuf,
}

impl FsArtifactStore {
    /// Creates the store, probing that the directory exists (creating it if
    /// missing) and is writable.
    pub fn new(dir: PathBuf) -> Result<Self, StoreError> {
        ensure_output_dir(&dir)?;
        Ok(Self { dir })
    }

    fn write_atomic(&self, name: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let target = self.dir.join(name);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(bytes)?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        // Remove first so the rename also replaces on Windows.
        if target.exists() {
            fs::remove_file(&target)?;
        }
        tmp.persist(&target).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.dir.join(name).is_file())
    }

    async fn save(
        &self,
        name: &str,
        bytes: &[u8],
        cancel: &CancellationToken,
    ) -> Result<(), StoreError> {
        if cancel.is_cancelled() {
            return Err(StoreError::Cancelled);
        }
        // Keep the blocking file write off the runtime thread. The write is
        // atomic, so abandoning the wait cannot leave a partial artifact.
        let store = self.clone();
        let name = name.to_string();
        let bytes = bytes.to_vec();
        let write = tokio::task::spawn_blocking(move || store.write_atomic(&name, &bytes));
        tokio::select! {
            _ = cancel.cancelled() => Err(StoreError::Cancelled),
            result = write => result.map_err(|err| StoreError::Io(io::Error::other(err)))?,
        }
    }
}

/// Ensure output directory exists; create if missing.
fn ensure_output_dir(dir: &Path) -> Result<(), StoreError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| StoreError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(StoreError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| StoreError::OutputDir(e.to_string()))?;
    }
    // Basic writability probe: try creating a temp file.
    NamedTempFile::new_in(dir).map_err(|e| StoreError::OutputDir(e.to_string()))?;
    Ok(())
}
