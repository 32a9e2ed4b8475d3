use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::FieldError;
use crate::utils::lenient;

/// Catalog identifier. Timestamp-derived for books created here; whatever the mock
/// endpoint used for imported ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct BookId(pub String);

impl BookId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BookId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<u64> for BookId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

// Older records and the mock endpoint use numeric ids.
impl<'de> Deserialize<'de> for BookId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        lenient::id_text(deserializer).map(Self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    #[default]
    Available,
    Borrowed,
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Available => "available",
            Self::Borrowed => "borrowed",
        })
    }
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub status: BookStatus,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub price: Decimal,
    #[serde(default)]
    pub isbn: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub published_year: Option<i32>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub pages: Option<u32>,
}

impl Book {
    pub fn is_available(&self) -> bool {
        self.status == BookStatus::Available
    }
}

/// Create / full-replace payload. `status` is optional; the catalog decides it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub status: Option<BookStatus>,
    #[serde(default, deserialize_with = "lenient::decimal")]
    pub price: Decimal,
    #[serde(default)]
    pub isbn: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub published_year: Option<i32>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default, deserialize_with = "lenient::optional_number")]
    pub pages: Option<u32>,
}

/// Earliest publication year the catalog accepts.
pub const MIN_PUBLISHED_YEAR: i32 = 1800;

impl BookDraft {
    pub fn validate(&self, current_year: i32) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if self.title.trim().is_empty() {
            errors.push(FieldError::required("title"));
        }
        if self.author.trim().is_empty() {
            errors.push(FieldError::required("author"));
        }
        if self.price.is_sign_negative() {
            errors.push(FieldError::new("price", "must not be negative"));
        }
        if let Some(year) = self.published_year {
            if !(MIN_PUBLISHED_YEAR..=current_year).contains(&year) {
                errors.push(FieldError::new(
                    "publishedYear",
                    format!("must be between {MIN_PUBLISHED_YEAR} and {current_year}"),
                ));
            }
        }
        if self.pages == Some(0) {
            errors.push(FieldError::new("pages", "must be at least 1"));
        }

        errors
    }

    pub fn into_book(self, id: BookId, status: BookStatus) -> Book {
        Book {
            id,
            title: self.title.trim().to_string(),
            author: self.author.trim().to_string(),
            image_url: self.image_url,
            status,
            price: self.price,
            isbn: self.isbn.trim().to_string(),
            publisher: self.publisher,
            published_year: self.published_year,
            description: self.description,
            genre: self.genre,
            pages: self.pages,
        }
    }
}

/// Status filter of the catalog listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookStatusFilter {
    #[default]
    All,
    Available,
    Borrowed,
}

impl BookStatusFilter {
    pub fn admits(self, status: BookStatus) -> bool {
        match self {
            Self::All => true,
            Self::Available => status == BookStatus::Available,
            Self::Borrowed => status == BookStatus::Borrowed,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub status: BookStatusFilter,
}
