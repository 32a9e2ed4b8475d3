//! Catalog operations on a loaded [`Library`].
//!
//! Statuses are never taken from input: a new book starts `available` and an update keeps
//! whatever the borrow records imply. The repository reconciles again before writing.

use crate::error::LibraryError;
use crate::library::Library;
use crate::modules::books::models::{Book, BookDraft, BookId, BookQuery, BookStatus};
use crate::utils::matches_search;

/// Books matching the free-text search (title, author, ISBN) and the status filter.
pub fn filter(books: Vec<Book>, query: &BookQuery) -> Vec<Book> {
    let needle = query.search.as_deref().unwrap_or_default();
    books
        .into_iter()
        .filter(|book| query.status.admits(book.status))
        .filter(|book| {
            matches_search(
                needle,
                [book.title.as_str(), book.author.as_str(), book.isbn.as_str()],
            )
        })
        .collect()
}

impl Library {
    pub fn create_book(
        &mut self,
        id: BookId,
        draft: BookDraft,
        current_year: i32,
    ) -> Result<Book, LibraryError> {
        LibraryError::check("book", draft.validate(current_year))?;

        let book = draft.into_book(id, BookStatus::Available);
        self.books.push(book.clone());
        tracing::info!(book_id = %book.id, title = %book.title, "book added to catalog");
        Ok(book)
    }

    /// Replace the record under `id`. Borrow entries pick up the new title.
    pub fn update_book(
        &mut self,
        id: &BookId,
        draft: BookDraft,
        current_year: i32,
    ) -> Result<Book, LibraryError> {
        LibraryError::check("book", draft.validate(current_year))?;

        let position = self
            .books
            .iter()
            .position(|book| &book.id == id)
            .ok_or_else(|| LibraryError::book_not_found(id))?;

        let status = self.expected_status(id);
        if let Some(requested) = draft.status.filter(|requested| *requested != status) {
            return Err(LibraryError::conflict(
                format!("book '{id}' is {status} according to the borrow records; cannot mark it {requested}"),
                vec![id.to_string()],
            ));
        }

        let book = draft.into_book(id.clone(), status);

        let mut retitled = 0;
        for entry in self
            .borrowers
            .iter_mut()
            .flat_map(|borrower| borrower.borrowed_books.iter_mut())
            .filter(|entry| &entry.book_id == id && entry.title != book.title)
        {
            entry.title.clone_from(&book.title);
            retitled += 1;
        }

        self.books[position] = book.clone();
        tracing::info!(book_id = %id, retitled, "book updated");
        Ok(book)
    }

    /// Remove a book that nobody currently holds.
    pub fn delete_book(&mut self, id: &BookId) -> Result<Book, LibraryError> {
        let position = self
            .books
            .iter()
            .position(|book| &book.id == id)
            .ok_or_else(|| LibraryError::book_not_found(id))?;

        if self.is_on_loan(id) {
            return Err(LibraryError::conflict(
                format!("book '{id}' is on loan and cannot be deleted"),
                vec![id.to_string()],
            ));
        }

        let book = self.books.remove(position);
        tracing::info!(book_id = %id, title = %book.title, "book removed from catalog");
        Ok(book)
    }
}
