//! The catalog and the borrower records, and the rule tying them together:
//! a book is `borrowed` exactly when some borrower holds an unreturned entry for it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::modules::books::models::{Book, BookId, BookStatus};
use crate::modules::borrowers::models::{Borrower, BorrowerId};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Library {
    pub books: Vec<Book>,
    pub borrowers: Vec<Borrower>,
}

/// A book whose recorded status disagrees with the borrow records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub book_id: BookId,
    pub title: String,
    pub recorded: BookStatus,
    pub expected: BookStatus,
}

impl Library {
    pub fn new(books: Vec<Book>, borrowers: Vec<Borrower>) -> Self {
        Self { books, borrowers }
    }

    pub fn find_book(&self, id: &BookId) -> Option<&Book> {
        self.books.iter().find(|book| &book.id == id)
    }

    pub fn find_borrower(&self, id: BorrowerId) -> Option<&Borrower> {
        self.borrowers.iter().find(|borrower| borrower.id == id)
    }

    /// Whether any borrower other than `except` holds `book_id` unreturned.
    pub fn is_held_elsewhere(&self, book_id: &BookId, except: Option<BorrowerId>) -> bool {
        self.borrowers
            .iter()
            .filter(|borrower| Some(borrower.id) != except)
            .any(|borrower| borrower.holds(book_id))
    }

    pub fn is_on_loan(&self, book_id: &BookId) -> bool {
        self.is_held_elsewhere(book_id, None)
    }

    fn held_book_ids(&self) -> HashSet<BookId> {
        self.borrowers
            .iter()
            .flat_map(|borrower| borrower.pending_entries())
            .map(|entry| entry.book_id.clone())
            .collect()
    }

    /// Status a book must have given the current borrow records.
    pub fn expected_status(&self, book_id: &BookId) -> BookStatus {
        if self.is_on_loan(book_id) {
            BookStatus::Borrowed
        } else {
            BookStatus::Available
        }
    }

    /// Recompute every book status from the borrow records. Returns how many changed.
    pub fn reconcile(&mut self) -> usize {
        let held = self.held_book_ids();
        let mut changed = 0;

        for book in &mut self.books {
            let expected = if held.contains(&book.id) {
                BookStatus::Borrowed
            } else {
                BookStatus::Available
            };
            if book.status != expected {
                tracing::debug!(
                    book_id = %book.id,
                    from = %book.status,
                    to = %expected,
                    "book status reconciled"
                );
                book.status = expected;
                changed += 1;
            }
        }

        changed
    }

    /// Books whose status disagrees with the borrow records, without fixing them.
    pub fn violations(&self) -> Vec<Violation> {
        let held = self.held_book_ids();

        self.books
            .iter()
            .filter_map(|book| {
                let expected = if held.contains(&book.id) {
                    BookStatus::Borrowed
                } else {
                    BookStatus::Available
                };
                (book.status != expected).then(|| Violation {
                    book_id: book.id.clone(),
                    title: book.title.clone(),
                    recorded: book.status,
                    expected,
                })
            })
            .collect()
    }
}
