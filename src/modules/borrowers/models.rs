use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::FieldError;
use crate::modules::books::models::BookId;
use crate::utils::lenient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct BorrowerId(pub u64);

impl fmt::Display for BorrowerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// The mock endpoint hands out string ids ("1", "2", ...).
impl<'de> Deserialize<'de> for BorrowerId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = lenient::id_text(deserializer)?;
        text.parse()
            .map(Self)
            .map_err(|_| serde::de::Error::custom(format!("invalid borrower id: {text}")))
    }
}

/// One checked-out book. `id` is the catalog id, `title` a copy taken at checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowedBookEntry {
    #[serde(rename = "id")]
    pub book_id: BookId,
    pub title: String,
    /// Due date.
    pub return_date: NaiveDate,
    #[serde(default)]
    pub returned: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Borrower {
    pub id: BorrowerId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub membership_id: String,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub total_bill: Decimal,
    #[serde(default)]
    pub borrowed_books: Vec<BorrowedBookEntry>,
}

impl Borrower {
    pub fn pending_entries(&self) -> impl Iterator<Item = &BorrowedBookEntry> + '_ {
        self.borrowed_books.iter().filter(|entry| !entry.returned)
    }

    pub fn pending_count(&self) -> usize {
        self.pending_entries().count()
    }

    pub fn has_pending(&self) -> bool {
        self.pending_entries().next().is_some()
    }

    /// Whether this borrower holds `book_id` unreturned.
    pub fn holds(&self, book_id: &BookId) -> bool {
        self.pending_entries().any(|entry| &entry.book_id == book_id)
    }

    /// "Clear", or "{n} books pending".
    pub fn status_label(&self) -> String {
        match self.pending_count() {
            0 => "Clear".to_string(),
            n => format!("{n} books pending"),
        }
    }
}

/// Borrower as listed: the record plus its derived status.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowerView {
    #[serde(flatten)]
    pub borrower: Borrower,
    pub pending_count: usize,
    pub status_label: String,
}

impl From<Borrower> for BorrowerView {
    fn from(borrower: Borrower) -> Self {
        Self {
            pending_count: borrower.pending_count(),
            status_label: borrower.status_label(),
            borrower,
        }
    }
}

/// Contact details shared by create and update payloads.
fn validate_contact(
    errors: &mut Vec<FieldError>,
    name: Option<&str>,
    email: Option<&str>,
    phone: Option<&str>,
    address: Option<&str>,
) {
    for (field, value) in [
        ("name", name),
        ("email", email),
        ("phone", phone),
        ("address", address),
    ] {
        if value.is_some_and(|v| v.trim().is_empty()) {
            errors.push(FieldError::required(field));
        }
    }
    if let Some(email) = email.filter(|e| !e.trim().is_empty()) {
        if !email.contains('@') {
            errors.push(FieldError::new("email", "must be an email address"));
        }
    }
}

/// Checkout request: contact details plus the catalog ids being borrowed.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBorrower {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub membership_id: Option<String>,
    #[serde(default)]
    pub selected_books: Vec<BookId>,
}

impl NewBorrower {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        validate_contact(
            &mut errors,
            Some(&self.name),
            Some(&self.email),
            Some(&self.phone),
            Some(&self.address),
        );
        errors
    }
}

/// Requested returned-flag for one entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnChange {
    pub book_id: BookId,
    pub returned: bool,
}

/// Contact patch plus returned-flag changes on existing entries.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowerUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub returns: Vec<ReturnChange>,
}

impl BorrowerUpdate {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        validate_contact(
            &mut errors,
            self.name.as_deref(),
            self.email.as_deref(),
            self.phone.as_deref(),
            self.address.as_deref(),
        );
        errors
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorrowerStatusFilter {
    #[default]
    All,
    /// At least one unreturned entry.
    Pending,
    Clear,
}

impl BorrowerStatusFilter {
    pub fn admits(self, borrower: &Borrower) -> bool {
        match self {
            Self::All => true,
            Self::Pending => borrower.has_pending(),
            Self::Clear => !borrower.has_pending(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BorrowerQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub status: BorrowerStatusFilter,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(id: &str, returned: bool) -> BorrowedBookEntry {
        BorrowedBookEntry {
            book_id: BookId::from(id),
            title: format!("Book {id}"),
            return_date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            returned,
        }
    }

    fn borrower(entries: Vec<BorrowedBookEntry>) -> Borrower {
        Borrower {
            id: BorrowerId(1),
            name: "John Doe".to_string(),
            email: "john@example.com".to_string(),
            phone: String::new(),
            address: String::new(),
            membership_id: "MEM001".to_string(),
            total_bill: Decimal::ZERO,
            borrowed_books: entries,
        }
    }

    #[test]
    fn status_label_counts_unreturned_entries() {
        assert_eq!(borrower(vec![]).status_label(), "Clear");
        assert_eq!(borrower(vec![entry("1", true)]).status_label(), "Clear");
        assert_eq!(
            borrower(vec![entry("1", false), entry("2", true), entry("3", false)]).status_label(),
            "2 books pending"
        );
    }

    #[test]
    fn holds_ignores_returned_entries() {
        let b = borrower(vec![entry("1", true), entry("3", false)]);
        assert!(!b.holds(&BookId::from("1")));
        assert!(b.holds(&BookId::from("3")));
    }

    #[test]
    fn status_filter_splits_pending_and_clear() {
        let pending = borrower(vec![entry("1", false)]);
        let clear = borrower(vec![entry("1", true)]);
        assert!(BorrowerStatusFilter::Pending.admits(&pending));
        assert!(!BorrowerStatusFilter::Pending.admits(&clear));
        assert!(BorrowerStatusFilter::Clear.admits(&clear));
        assert!(BorrowerStatusFilter::All.admits(&pending));
    }

    #[test]
    fn stored_records_use_camel_case_and_book_id_as_id() {
        let b: Borrower = serde_json::from_value(json!({
            "id": "7",
            "name": "Jane Smith",
            "email": "jane@example.com",
            "totalBill": 89.97,
            "membershipId": "MEM002",
            "borrowedBooks": [
                { "id": 4, "title": "Pride and Prejudice", "returnDate": "2024-04-15", "returned": false }
            ]
        }))
        .unwrap();

        assert_eq!(b.id, BorrowerId(7));
        assert_eq!(b.total_bill, Decimal::new(8997, 2));
        assert_eq!(b.borrowed_books[0].book_id, BookId::from("4"));

        let view = serde_json::to_value(BorrowerView::from(b)).unwrap();
        assert_eq!(view["statusLabel"], json!("1 books pending"));
        assert_eq!(view["pendingCount"], json!(1));
        assert_eq!(view["borrowedBooks"][0]["returnDate"], json!("2024-04-15"));
    }

    #[test]
    fn contact_validation() {
        let request = NewBorrower {
            name: "Ann".to_string(),
            email: "not-an-email".to_string(),
            ..NewBorrower::default()
        };
        let fields: Vec<String> = request.validate().into_iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["phone", "address", "email"]);

        let update = BorrowerUpdate {
            name: Some("  ".to_string()),
            ..BorrowerUpdate::default()
        };
        assert_eq!(update.validate(), vec![FieldError::required("name")]);
        assert!(BorrowerUpdate::default().validate().is_empty());
    }
}
