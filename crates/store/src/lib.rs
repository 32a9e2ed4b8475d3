//! Transactional key-value document store.
//!
//! The store keeps one JSON [`Snapshot`] (key -> document) in memory and mirrors it to a
//! [`Backend`]. Every read-modify-write cycle goes through [`Store::transaction`], which
//! serializes writers behind a single lock and publishes the new snapshot in memory only
//! after the backend has accepted it.

use std::collections::BTreeMap;
use std::sync::Arc;

use libris_kernel::settings::{StorageBackend, StorageSettings};
use tokio::sync::Mutex;

pub mod backend;
mod error;
mod module;
mod transaction;

pub use backend::{Backend, FileBackend, MemoryBackend};
pub use error::StoreError;
pub use module::{create_module, StoreModule};
pub use transaction::Transaction;

/// Full contents of the store: document key -> JSON value.
pub type Snapshot = BTreeMap<String, serde_json::Value>;

/// The backend selected by `storage.backend`.
pub fn backend_for(settings: &StorageSettings) -> Arc<dyn Backend> {
    match settings.backend {
        StorageBackend::Memory => Arc::new(MemoryBackend::new()),
        StorageBackend::File => Arc::new(FileBackend::new(&settings.path)),
    }
}

pub struct Store {
    backend: Arc<dyn Backend>,
    current: Mutex<Snapshot>,
}

impl Store {
    /// Open a store over `backend`, loading whatever it has persisted.
    pub async fn open(backend: Arc<dyn Backend>) -> Result<Self, StoreError> {
        let snapshot = backend.load().await?;
        tracing::info!(
            backend = backend.name(),
            keys = snapshot.len(),
            "store opened"
        );
        Ok(Self::with_snapshot(backend, snapshot))
    }

    /// Open a store, starting empty when the persisted document is malformed.
    ///
    /// The malformed document is overwritten by the next successful write.
    pub async fn open_or_reset(backend: Arc<dyn Backend>) -> Result<Self, StoreError> {
        match backend.load().await {
            Ok(snapshot) => Ok(Self::with_snapshot(backend, snapshot)),
            Err(err @ StoreError::Corrupt { .. }) => {
                tracing::warn!(
                    backend = backend.name(),
                    error = %err,
                    "persisted document unreadable; starting from an empty store"
                );
                Ok(Self::with_snapshot(backend, Snapshot::new()))
            }
            Err(err) => Err(err),
        }
    }

    /// Build the backend named in settings and open it, resetting unreadable data.
    pub async fn from_settings(settings: &StorageSettings) -> Result<Self, StoreError> {
        Self::open_or_reset(backend_for(settings)).await
    }

    /// Fresh store over an empty in-memory backend.
    pub fn in_memory() -> Self {
        Self::with_snapshot(Arc::new(MemoryBackend::new()), Snapshot::new())
    }

    fn with_snapshot(backend: Arc<dyn Backend>, snapshot: Snapshot) -> Self {
        Self {
            backend,
            current: Mutex::new(snapshot),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Copy of the current snapshot.
    pub async fn snapshot(&self) -> Snapshot {
        self.current.lock().await.clone()
    }

    /// Run `apply` against a private copy of the snapshot.
    ///
    /// If `apply` fails nothing changes. If it succeeds and wrote anything, the new snapshot
    /// is persisted and only then made current; a persistence failure leaves both memory and
    /// backend at the previous state. Concurrent transactions are applied one at a time.
    pub async fn transaction<R, E, F>(&self, apply: F) -> Result<R, E>
    where
        F: FnOnce(&mut Transaction) -> Result<R, E> + Send,
        R: Send,
        E: From<StoreError> + Send,
    {
        let mut current = self.current.lock().await;
        let mut tx = Transaction::new(current.clone());

        let outcome = apply(&mut tx)?;

        if let Some(next) = tx.into_changes() {
            self.backend.persist(&next).await?;
            *current = next;
        }

        Ok(outcome)
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("backend", &self.backend.name())
            .finish_non_exhaustive()
    }
}
