//! Borrower record operations on a loaded [`Library`]: checkout, contact edits, returns
//! and deletion.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::{FieldError, LibraryError};
use crate::library::Library;
use crate::modules::books::models::BookId;
use crate::modules::borrowers::models::{
    BorrowedBookEntry, Borrower, BorrowerId, BorrowerQuery, BorrowerUpdate, NewBorrower,
};
use crate::utils::matches_search;

/// Borrowers matching the free-text search (name, email, membership id) and the status filter.
pub fn filter(borrowers: Vec<Borrower>, query: &BorrowerQuery) -> Vec<Borrower> {
    let needle = query.search.as_deref().unwrap_or_default();
    borrowers
        .into_iter()
        .filter(|borrower| query.status.admits(borrower))
        .filter(|borrower| {
            matches_search(
                needle,
                [
                    borrower.name.as_str(),
                    borrower.email.as_str(),
                    borrower.membership_id.as_str(),
                ],
            )
        })
        .collect()
}

fn trimmed(value: &str) -> String {
    value.trim().to_string()
}

impl Library {
    fn borrower_position(&self, id: BorrowerId) -> Result<usize, LibraryError> {
        self.borrowers
            .iter()
            .position(|borrower| borrower.id == id)
            .ok_or_else(|| LibraryError::borrower_not_found(id))
    }

    /// Register a borrower together with the books they take home.
    ///
    /// Every selected book must exist and be available. Each entry is due on `due`, and
    /// the bill is the sum of the selected prices. `membership_id` is called only when the
    /// request carries none.
    pub fn create_borrower(
        &mut self,
        id: BorrowerId,
        request: NewBorrower,
        due: NaiveDate,
        membership_id: impl FnOnce() -> String,
    ) -> Result<Borrower, LibraryError> {
        LibraryError::check("borrower", request.validate())?;

        let mut selected: Vec<BookId> = Vec::with_capacity(request.selected_books.len());
        for book_id in request.selected_books {
            if !selected.contains(&book_id) {
                selected.push(book_id);
            }
        }

        let mut entries = Vec::with_capacity(selected.len());
        let mut unavailable = Vec::new();
        let mut total_bill = Decimal::ZERO;
        for book_id in selected {
            let book = self
                .find_book(&book_id)
                .ok_or_else(|| LibraryError::book_not_found(&book_id))?;
            if !book.is_available() || self.is_on_loan(&book_id) {
                unavailable.push(book_id.to_string());
                continue;
            }
            total_bill += book.price;
            entries.push(BorrowedBookEntry {
                title: book.title.clone(),
                book_id,
                return_date: due,
                returned: false,
            });
        }

        if !unavailable.is_empty() {
            return Err(LibraryError::conflict(
                format!("books already on loan: {}", unavailable.join(", ")),
                unavailable,
            ));
        }

        let membership_id = request
            .membership_id
            .as_deref()
            .map(str::trim)
            .filter(|given| !given.is_empty())
            .map_or_else(membership_id, str::to_string);

        let borrower = Borrower {
            id,
            name: trimmed(&request.name),
            email: trimmed(&request.email),
            phone: trimmed(&request.phone),
            address: trimmed(&request.address),
            membership_id,
            total_bill,
            borrowed_books: entries,
        };

        tracing::info!(
            borrower_id = %borrower.id,
            membership_id = %borrower.membership_id,
            books = borrower.borrowed_books.len(),
            total_bill = %borrower.total_bill,
            "borrower checked out books"
        );
        self.borrowers.push(borrower.clone());
        Ok(borrower)
    }

    /// Set the returned flag of `book_id` in the borrower at `position`.
    ///
    /// Re-opening a returned entry needs the book to still exist and be free.
    fn set_returned(
        &mut self,
        position: usize,
        book_id: &BookId,
        returned: bool,
    ) -> Result<(), LibraryError> {
        let borrower = &self.borrowers[position];
        let Some(index) = borrower
            .borrowed_books
            .iter()
            .position(|entry| &entry.book_id == book_id)
        else {
            return Err(LibraryError::Validation {
                entity: "borrower",
                errors: vec![FieldError::new(
                    "returns",
                    format!("borrower has no entry for book '{book_id}'"),
                )],
            });
        };

        let entry = &borrower.borrowed_books[index];
        if entry.returned == returned {
            return Ok(());
        }

        if !returned {
            if self.find_book(book_id).is_none() {
                return Err(LibraryError::conflict(
                    format!("book '{book_id}' is no longer in the catalog"),
                    vec![book_id.to_string()],
                ));
            }
            if self.is_held_elsewhere(book_id, Some(borrower.id)) {
                return Err(LibraryError::conflict(
                    format!("book '{book_id}' is on loan to another borrower"),
                    vec![book_id.to_string()],
                ));
            }
        }

        let borrower = &mut self.borrowers[position];
        borrower.borrowed_books[index].returned = returned;
        tracing::info!(
            borrower_id = %borrower.id,
            book_id = %book_id,
            returned,
            "borrowed book entry updated"
        );
        Ok(())
    }

    /// Patch contact details and apply returned-flag changes.
    pub fn update_borrower(
        &mut self,
        id: BorrowerId,
        update: BorrowerUpdate,
    ) -> Result<Borrower, LibraryError> {
        LibraryError::check("borrower", update.validate())?;
        let position = self.borrower_position(id)?;

        for change in &update.returns {
            self.set_returned(position, &change.book_id, change.returned)?;
        }

        let borrower = &mut self.borrowers[position];
        if let Some(name) = update.name.as_deref() {
            borrower.name = trimmed(name);
        }
        if let Some(email) = update.email.as_deref() {
            borrower.email = trimmed(email);
        }
        if let Some(phone) = update.phone.as_deref() {
            borrower.phone = trimmed(phone);
        }
        if let Some(address) = update.address.as_deref() {
            borrower.address = trimmed(address);
        }

        Ok(borrower.clone())
    }

    /// Flip the returned flag of a single entry.
    pub fn toggle_return(
        &mut self,
        id: BorrowerId,
        book_id: &BookId,
    ) -> Result<Borrower, LibraryError> {
        let position = self.borrower_position(id)?;
        let returned = self.borrowers[position]
            .borrowed_books
            .iter()
            .find(|entry| &entry.book_id == book_id)
            .map(|entry| !entry.returned)
            .ok_or_else(|| LibraryError::book_not_found(book_id))?;

        self.set_returned(position, book_id, returned)?;
        Ok(self.borrowers[position].clone())
    }

    /// Remove a borrower. Their unreturned books become available again unless someone
    /// else still holds them.
    pub fn delete_borrower(&mut self, id: BorrowerId) -> Result<Borrower, LibraryError> {
        let position = self.borrower_position(id)?;
        let borrower = self.borrowers.remove(position);

        let released = borrower
            .pending_entries()
            .filter(|entry| !self.is_on_loan(&entry.book_id))
            .count();
        tracing::info!(borrower_id = %id, released, "borrower deleted");
        Ok(borrower)
    }
}
