//! Typed access to the catalog and borrower documents of the store.

use std::sync::Arc;

use libris_store::{Store, StoreError, Transaction};
use serde::de::DeserializeOwned;

use crate::error::LibraryError;
use crate::library::Library;
use crate::modules::books::models::Book;
use crate::modules::borrowers::models::Borrower;
use crate::seed;

pub const BOOKS_KEY: &str = "books";
pub const BORROWERS_KEY: &str = "borrowers";

#[derive(Clone, Debug)]
pub struct LibraryRepository {
    store: Arc<Store>,
}

fn read_library(tx: &Transaction) -> Result<Library, StoreError> {
    Ok(Library::new(
        tx.get(BOOKS_KEY)?.unwrap_or_default(),
        tx.get(BORROWERS_KEY)?.unwrap_or_default(),
    ))
}

fn write_library(tx: &mut Transaction, library: &Library) -> Result<(), StoreError> {
    tx.put(BOOKS_KEY, &library.books)?;
    tx.put(BORROWERS_KEY, &library.borrowers)
}

/// Value under `key`, or `fallback` when the key is absent or unreadable.
/// The flag reports whether the fallback was used.
fn read_or_seed<T: DeserializeOwned>(
    tx: &Transaction,
    key: &str,
    fallback: impl FnOnce() -> T,
) -> (T, bool) {
    match tx.get(key) {
        Ok(Some(value)) => (value, false),
        Ok(None) => {
            tracing::warn!(key, "no stored data; using sample data");
            (fallback(), true)
        }
        Err(err) => {
            tracing::warn!(key, error = %err, "stored data unreadable; using sample data");
            (fallback(), true)
        }
    }
}

impl LibraryRepository {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Make the store usable: seed missing or malformed documents with sample data and
    /// repair book statuses. Writes only when something changed.
    pub async fn hydrate(&self) -> Result<(), LibraryError> {
        self.store
            .transaction(|tx| {
                let (books, books_seeded) = read_or_seed::<Vec<Book>>(tx, BOOKS_KEY, seed::sample_books);
                let (borrowers, borrowers_seeded) =
                    read_or_seed::<Vec<Borrower>>(tx, BORROWERS_KEY, seed::sample_borrowers);

                let mut library = Library::new(books, borrowers);
                let repaired = library.reconcile();
                if repaired > 0 && !books_seeded {
                    tracing::warn!(repaired, "stored book statuses disagreed with borrow records");
                }

                if books_seeded || borrowers_seeded || repaired > 0 {
                    write_library(tx, &library)?;
                }

                tracing::info!(
                    books = library.books.len(),
                    borrowers = library.borrowers.len(),
                    "library hydrated"
                );
                Ok::<_, LibraryError>(())
            })
            .await
    }

    /// Current catalog and borrower records.
    pub async fn load(&self) -> Result<Library, LibraryError> {
        self.store
            .transaction(|tx| read_library(tx).map_err(LibraryError::from))
            .await
    }

    /// Read-modify-write of the whole library in one store transaction.
    ///
    /// Book statuses are reconciled against the borrow records after `apply` and before the
    /// write, so every committed state satisfies the borrowed-iff-held rule.
    pub async fn transact<R, F>(&self, apply: F) -> Result<R, LibraryError>
    where
        F: FnOnce(&mut Library) -> Result<R, LibraryError> + Send,
        R: Send,
    {
        self.store
            .transaction(|tx| {
                let mut library = read_library(tx)?;
                let outcome = apply(&mut library)?;

                let changed = library.reconcile();
                if changed > 0 {
                    tracing::debug!(changed, "book statuses follow borrow records");
                }

                write_library(tx, &library)?;
                Ok(outcome)
            })
            .await
    }

    /// Replace everything with `library`, reconciled. Returns the stored library.
    pub async fn replace(&self, mut library: Library) -> Result<Library, LibraryError> {
        let repaired = library.reconcile();
        if repaired > 0 {
            tracing::warn!(repaired, "replacement data had inconsistent book statuses");
        }

        self.store
            .transaction(|tx| {
                write_library(tx, &library)?;
                Ok::<_, LibraryError>(library)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::models::{BookId, BookStatus};
    use libris_store::{Backend, MemoryBackend, Snapshot};
    use serde_json::json;

    async fn repository_over(snapshot: Snapshot) -> (LibraryRepository, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::with_snapshot(snapshot));
        let store = Store::open(backend.clone()).await.unwrap();
        (LibraryRepository::new(Arc::new(store)), backend)
    }

    #[tokio::test]
    async fn empty_store_is_seeded_with_sample_data() {
        let (repository, backend) = repository_over(Snapshot::new()).await;
        repository.hydrate().await.unwrap();

        let library = repository.load().await.unwrap();
        assert_eq!(library, seed::sample_library());
        assert!(backend.load().await.unwrap().contains_key(BOOKS_KEY));
    }

    #[tokio::test]
    async fn malformed_document_falls_back_to_sample_data() {
        let mut snapshot = Snapshot::new();
        snapshot.insert(BOOKS_KEY.to_string(), json!({"not": "a list"}));
        snapshot.insert(BORROWERS_KEY.to_string(), json!([]));
        let (repository, _) = repository_over(snapshot).await;

        repository.hydrate().await.unwrap();
        let library = repository.load().await.unwrap();

        assert_eq!(library.books.len(), 7);
        assert!(library.borrowers.is_empty());
        // no borrowers left, so nothing is on loan
        assert!(library.books.iter().all(|book| book.is_available()));
    }

    #[tokio::test]
    async fn consistent_data_is_left_untouched() {
        let mut snapshot = Snapshot::new();
        snapshot.insert(BOOKS_KEY.to_string(), json!([]));
        snapshot.insert(BORROWERS_KEY.to_string(), json!([]));
        let (repository, backend) = repository_over(snapshot.clone()).await;

        repository.hydrate().await.unwrap();
        assert_eq!(backend.load().await.unwrap(), snapshot);
    }

    #[tokio::test]
    async fn transact_reconciles_before_writing() {
        let (repository, _) = repository_over(Snapshot::new()).await;
        repository.hydrate().await.unwrap();

        repository
            .transact(|library| {
                // drop every borrow record; the statuses must follow
                library.borrowers.clear();
                Ok(())
            })
            .await
            .unwrap();

        let library = repository.load().await.unwrap();
        assert!(library.violations().is_empty());
        assert_eq!(
            library.find_book(&BookId::from("1")).map(|book| book.status),
            Some(BookStatus::Available)
        );
    }

    #[tokio::test]
    async fn failed_apply_writes_nothing() {
        let (repository, _) = repository_over(Snapshot::new()).await;
        repository.hydrate().await.unwrap();
        let before = repository.load().await.unwrap();

        let result: Result<(), _> = repository
            .transact(|library| {
                library.books.clear();
                Err(LibraryError::book_not_found("99"))
            })
            .await;

        assert!(matches!(result, Err(LibraryError::NotFound { .. })));
        assert_eq!(repository.load().await.unwrap(), before);
    }
}
