//! Built-in sample library, used when the store holds nothing usable.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::library::Library;
use crate::modules::books::models::{Book, BookId, BookStatus};
use crate::modules::borrowers::models::{BorrowedBookEntry, Borrower, BorrowerId};

struct SampleBook {
    id: u64,
    title: &'static str,
    author: &'static str,
    price_cents: i64,
    isbn: &'static str,
    publisher: &'static str,
    published_year: i32,
    genre: &'static str,
    pages: u32,
}

const SAMPLE_BOOKS: [SampleBook; 7] = [
    SampleBook {
        id: 1,
        title: "The Great Gatsby",
        author: "F. Scott Fitzgerald",
        price_cents: 1999,
        isbn: "9780743273565",
        publisher: "Scribner",
        published_year: 1925,
        genre: "Classic",
        pages: 180,
    },
    SampleBook {
        id: 2,
        title: "To Kill a Mockingbird",
        author: "Harper Lee",
        price_cents: 1999,
        isbn: "9780061120084",
        publisher: "J. B. Lippincott & Co.",
        published_year: 1960,
        genre: "Classic",
        pages: 281,
    },
    SampleBook {
        id: 3,
        title: "1984",
        author: "George Orwell",
        price_cents: 1999,
        isbn: "9780451524935",
        publisher: "Secker & Warburg",
        published_year: 1949,
        genre: "Dystopian",
        pages: 328,
    },
    SampleBook {
        id: 4,
        title: "Pride and Prejudice",
        author: "Jane Austen",
        price_cents: 3499,
        isbn: "9780141439518",
        publisher: "T. Egerton",
        published_year: 1813,
        genre: "Romance",
        pages: 432,
    },
    SampleBook {
        id: 5,
        title: "The Catcher in the Rye",
        author: "J. D. Salinger",
        price_cents: 3499,
        isbn: "9780316769488",
        publisher: "Little, Brown and Company",
        published_year: 1951,
        genre: "Coming-of-age",
        pages: 277,
    },
    SampleBook {
        id: 6,
        title: "The Hobbit",
        author: "J. R. R. Tolkien",
        price_cents: 2249,
        isbn: "9780547928227",
        publisher: "George Allen & Unwin",
        published_year: 1937,
        genre: "Fantasy",
        pages: 310,
    },
    SampleBook {
        id: 7,
        title: "Lord of the Rings",
        author: "J. R. R. Tolkien",
        price_cents: 2249,
        isbn: "9780544003415",
        publisher: "George Allen & Unwin",
        published_year: 1954,
        genre: "Fantasy",
        pages: 1178,
    },
];

pub fn sample_books() -> Vec<Book> {
    SAMPLE_BOOKS
        .iter()
        .map(|sample| Book {
            id: BookId::from(sample.id),
            title: sample.title.to_string(),
            author: sample.author.to_string(),
            image_url: String::new(),
            // Corrected by `Library::reconcile` once the borrowers are attached.
            status: BookStatus::Available,
            price: Decimal::new(sample.price_cents, 2),
            isbn: sample.isbn.to_string(),
            publisher: sample.publisher.to_string(),
            published_year: Some(sample.published_year),
            description: String::new(),
            genre: sample.genre.to_string(),
            pages: Some(sample.pages),
        })
        .collect()
}

fn entry(book_id: u64, title: &str, due: (i32, u32, u32), returned: bool) -> BorrowedBookEntry {
    let (year, month, day) = due;
    BorrowedBookEntry {
        book_id: BookId::from(book_id),
        title: title.to_string(),
        return_date: NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default(),
        returned,
    }
}

pub fn sample_borrowers() -> Vec<Borrower> {
    vec![
        Borrower {
            id: BorrowerId(1),
            name: "John Doe".to_string(),
            email: "john@example.com".to_string(),
            phone: "123-456-7890".to_string(),
            address: "123 Library St, Booktown".to_string(),
            membership_id: "MEM001".to_string(),
            total_bill: Decimal::new(5997, 2),
            borrowed_books: vec![
                entry(1, "The Great Gatsby", (2024, 4, 1), false),
                entry(2, "To Kill a Mockingbird", (2024, 3, 25), true),
                entry(3, "1984", (2024, 4, 5), false),
            ],
        },
        Borrower {
            id: BorrowerId(2),
            name: "Jane Smith".to_string(),
            email: "jane@example.com".to_string(),
            phone: "234-567-8901".to_string(),
            address: "456 Reader Ave, Bookville".to_string(),
            membership_id: "MEM002".to_string(),
            total_bill: Decimal::new(8997, 2),
            borrowed_books: vec![
                entry(3, "1984", (2024, 4, 10), false),
                entry(4, "Pride and Prejudice", (2024, 4, 15), false),
                entry(5, "The Catcher in the Rye", (2024, 4, 20), false),
            ],
        },
        Borrower {
            id: BorrowerId(3),
            name: "Bob Wilson".to_string(),
            email: "bob@example.com".to_string(),
            phone: "345-678-9012".to_string(),
            address: "789 Novel St, Bookland".to_string(),
            membership_id: "MEM003".to_string(),
            total_bill: Decimal::new(4498, 2),
            borrowed_books: vec![
                entry(6, "The Hobbit", (2024, 4, 5), false),
                entry(7, "Lord of the Rings", (2024, 4, 12), false),
            ],
        },
    ]
}

/// Sample catalog and borrowers with statuses already reconciled.
pub fn sample_library() -> Library {
    let mut library = Library::new(sample_books(), sample_borrowers());
    library.reconcile();
    library
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_bills_match_the_catalog_prices() {
        let library = sample_library();
        for borrower in &library.borrowers {
            let sum: Decimal = borrower
                .borrowed_books
                .iter()
                .filter_map(|entry| library.find_book(&entry.book_id))
                .map(|book| book.price)
                .sum();
            assert_eq!(sum, borrower.total_bill, "bill of {}", borrower.name);
        }
    }

    #[test]
    fn only_the_returned_sample_book_is_available() {
        let library = sample_library();
        let available: Vec<&str> = library
            .books
            .iter()
            .filter(|book| book.is_available())
            .map(|book| book.title.as_str())
            .collect();
        assert_eq!(available, vec!["To Kill a Mockingbird"]);
    }
}
