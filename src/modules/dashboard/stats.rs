use chrono::NaiveDate;
use serde::Serialize;

use crate::library::Library;
use crate::modules::books::models::{BookId, BookStatus};
use crate::modules::borrowers::models::{Borrower, BorrowerId};

/// Dashboard figures, recomputed from the library on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_books: usize,
    pub borrowed_books: usize,
    pub available_books: usize,
    /// Unreturned entries across all borrowers.
    pub pending_returns: usize,
    pub pending_borrowers: Vec<PendingBorrower>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingBorrower {
    pub id: BorrowerId,
    pub name: String,
    pub email: String,
    pub membership_id: String,
    pub pending_count: usize,
    pub pending_books: Vec<PendingBook>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingBook {
    pub id: BookId,
    pub title: String,
    pub return_date: NaiveDate,
    pub overdue: bool,
}

impl PendingBorrower {
    fn from_borrower(borrower: &Borrower, today: NaiveDate) -> Self {
        let pending_books: Vec<PendingBook> = borrower
            .pending_entries()
            .map(|entry| PendingBook {
                id: entry.book_id.clone(),
                title: entry.title.clone(),
                return_date: entry.return_date,
                overdue: entry.return_date < today,
            })
            .collect();

        Self {
            id: borrower.id,
            name: borrower.name.clone(),
            email: borrower.email.clone(),
            membership_id: borrower.membership_id.clone(),
            pending_count: pending_books.len(),
            pending_books,
        }
    }
}

impl DashboardStats {
    pub fn compute(library: &Library, today: NaiveDate) -> Self {
        let (borrowed_books, available_books) =
            library
                .books
                .iter()
                .fold((0, 0), |(borrowed, available), book| match book.status {
                    BookStatus::Borrowed => (borrowed + 1, available),
                    BookStatus::Available => (borrowed, available + 1),
                });

        let pending_borrowers: Vec<PendingBorrower> = library
            .borrowers
            .iter()
            .filter(|borrower| borrower.has_pending())
            .map(|borrower| PendingBorrower::from_borrower(borrower, today))
            .collect();

        Self {
            total_books: library.books.len(),
            borrowed_books,
            available_books,
            pending_returns: pending_borrowers.iter().map(|b| b.pending_count).sum(),
            pending_borrowers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn sample_library_figures() {
        let stats = DashboardStats::compute(&seed::sample_library(), date(2024, 4, 6));

        assert_eq!(stats.total_books, 7);
        assert_eq!(stats.borrowed_books, 6);
        assert_eq!(stats.available_books, 1);
        assert_eq!(stats.pending_returns, 7);

        let names: Vec<&str> = stats.pending_borrowers.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["John Doe", "Jane Smith", "Bob Wilson"]);

        let john = &stats.pending_borrowers[0];
        assert_eq!(john.pending_count, 2);
        let overdue: Vec<bool> = john.pending_books.iter().map(|b| b.overdue).collect();
        // Gatsby due 04-01, 1984 due 04-05
        assert_eq!(overdue, vec![true, true]);
        assert!(!stats.pending_borrowers[1].pending_books[0].overdue);
    }

    #[test]
    fn empty_library_has_zero_figures() {
        let stats = DashboardStats::compute(&Library::default(), date(2024, 1, 1));
        assert_eq!(stats.total_books, 0);
        assert_eq!(stats.pending_returns, 0);
        assert!(stats.pending_borrowers.is_empty());
    }

    #[test]
    fn serialized_with_camel_case_keys() {
        let value = serde_json::to_value(DashboardStats::compute(
            &seed::sample_library(),
            date(2024, 3, 1),
        ))
        .unwrap();

        assert_eq!(value["availableBooks"], 1);
        assert_eq!(value["pendingBorrowers"][2]["membershipId"], "MEM003");
        assert_eq!(value["pendingBorrowers"][2]["pendingBooks"][0]["returnDate"], "2024-04-05");
        assert_eq!(value["pendingBorrowers"][2]["pendingBooks"][0]["overdue"], false);
    }
}
