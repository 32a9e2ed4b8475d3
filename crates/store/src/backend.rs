//! Persistence backends. A backend loads and persists the whole snapshot at once.

use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{Snapshot, StoreError};

/// Durable home of a [`Snapshot`].
///
/// `persist` must be all-or-nothing: either the new snapshot is fully stored, or the
/// previous one is left untouched.
#[async_trait]
pub trait Backend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Read the last persisted snapshot. A backend with nothing stored yet returns an empty one.
    async fn load(&self) -> Result<Snapshot, StoreError>;

    async fn persist(&self, snapshot: &Snapshot) -> Result<(), StoreError>;
}

/// Process-local backend, used in tests and for throwaway instances.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    persisted: Mutex<Snapshot>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an already-populated snapshot.
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            persisted: Mutex::new(snapshot),
        }
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, Snapshot> {
        // A poisoned lock only means a writer panicked mid-clone; the data is still whole.
        self.persisted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn load(&self) -> Result<Snapshot, StoreError> {
        Ok(self.guard().clone())
    }

    async fn persist(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        *self.guard() = snapshot.clone();
        Ok(())
    }
}

/// Single JSON document on disk, replaced atomically through a sibling temp file.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "store".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl Backend for FileBackend {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn load(&self) -> Result<Snapshot, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no persisted document yet");
                return Ok(Snapshot::new());
            }
            Err(err) => return Err(self.io_error(err)),
        };

        serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    async fn persist(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let body = serde_json::to_vec_pretty(snapshot).map_err(|source| StoreError::Encode {
            key: "*".to_string(),
            source,
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| self.io_error(err))?;
        }

        let temp = self.temp_path();
        tokio::fs::write(&temp, &body)
            .await
            .map_err(|err| self.io_error(err))?;
        if let Err(err) = tokio::fs::rename(&temp, &self.path).await {
            if let Err(cleanup) = tokio::fs::remove_file(&temp).await {
                tracing::warn!(path = %temp.display(), error = %cleanup, "temp file left behind");
            }
            return Err(self.io_error(err));
        }

        tracing::trace!(path = %self.path.display(), bytes = body.len(), "snapshot persisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn missing_file_loads_as_empty_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("absent.json"));
        assert!(backend.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn file_backend_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("library.json");
        let backend = FileBackend::new(&path);

        let mut snapshot = Snapshot::new();
        snapshot.insert("books".to_string(), json!([{"id": "1"}]));
        backend.persist(&snapshot).await.unwrap();

        assert!(path.exists());
        assert!(!backend.temp_path().exists());
        assert_eq!(FileBackend::new(&path).load().await.unwrap(), snapshot);
    }

    #[tokio::test]
    async fn failed_rename_removes_the_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("library.json");
        // a non-empty directory cannot be replaced by a file
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), b"x").unwrap();
        let backend = FileBackend::new(&path);

        let err = backend.persist(&Snapshot::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
        assert!(!backend.temp_path().exists());
    }

    #[tokio::test]
    async fn malformed_file_is_reported_as_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("library.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let err = FileBackend::new(&path).load().await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }
}
