use crate::utils::validation::sanitize_filename;
use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum TempStoreError {
    #[error("Failed to create scratch directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write temp file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to delete temp file {}: {source}", path.display())]
    Delete {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Scratch directory where uploads are staged before provider submission.
#[derive(Debug, Clone)]
pub struct TempStore {
    dir: PathBuf,
}

/// A staged file on disk.
///
/// Consumed by [`TempStore::delete`]. A handle dropped without being deleted
/// (panic or cancelled task) removes its file synchronously.
#[derive(Debug)]
pub struct TempFile {
    path: PathBuf,
    deleted: bool,
}

impl TempFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if !self.deleted {
            if let Err(e) = std::fs::remove_file(&self.path) {
                if e.kind() != ErrorKind::NotFound {
                    tracing::warn!("Failed to remove orphaned temp file {:?}: {}", self.path, e);
                }
            }
        }
    }
}

impl TempStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[cfg(test)]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the scratch directory if it does not exist yet.
    pub async fn ensure_directory(&self) -> Result<(), TempStoreError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| TempStoreError::CreateDir {
                path: self.dir.clone(),
                source,
            })
    }

    /// Write `buffer` to a fresh, uniquely named file in the scratch directory.
    pub async fn write_to_temp(
        &self,
        buffer: &[u8],
        original_name: &str,
    ) -> Result<TempFile, TempStoreError> {
        let file = self
            .stage(original_name, |path| async move {
                tokio::fs::write(path, buffer).await
            })
            .await?;

        tracing::debug!("Staged {} bytes at {:?}", buffer.len(), file.path);
        Ok(file)
    }

    /// Reserve a scratch path and run `write` against it. The handle exists
    /// before the first byte lands, so a write that fails partway drops it
    /// and takes the partial file with it.
    async fn stage<F, Fut>(&self, original_name: &str, write: F) -> Result<TempFile, TempStoreError>
    where
        F: FnOnce(PathBuf) -> Fut,
        Fut: Future<Output = std::io::Result<()>>,
    {
        let file = TempFile {
            path: self.dir.join(unique_name(original_name)),
            deleted: false,
        };

        write(file.path.clone())
            .await
            .map_err(|source| TempStoreError::Write {
                path: file.path.clone(),
                source,
            })?;

        Ok(file)
    }

    /// Remove a staged file. A file that is already gone is not an error.
    pub async fn delete(&self, mut file: TempFile) -> Result<(), TempStoreError> {
        file.deleted = true;

        match tokio::fs::remove_file(&file.path).await {
            Ok(()) => {
                tracing::debug!("Removed temp file {:?}", file.path);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(TempStoreError::Delete {
                path: file.path.clone(),
                source,
            }),
        }
    }
}

fn unique_name(original_name: &str) -> String {
    format!(
        "{}-{}-{}",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple(),
        sanitize_filename(original_name)
    )
}
