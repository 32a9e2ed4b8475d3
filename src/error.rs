use libris_http::error::AppError;
use libris_store::StoreError;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// One rejected input field, rendered into the error envelope's `details`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub error: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            error: error.into(),
        }
    }

    pub fn required(field: impl Into<String>) -> Self {
        Self::new(field, "required")
    }
}

/// Failures of catalog and borrower operations.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error("invalid {entity}")]
    Validation {
        entity: &'static str,
        errors: Vec<FieldError>,
    },

    /// The operation would break the book-status / borrow-record invariant.
    #[error("{message}")]
    Conflict {
        message: String,
        book_ids: Vec<String>,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LibraryError {
    pub fn book_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            entity: "book",
            id: id.to_string(),
        }
    }

    pub fn borrower_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            entity: "borrower",
            id: id.to_string(),
        }
    }

    pub fn conflict(message: impl Into<String>, book_ids: Vec<String>) -> Self {
        Self::Conflict {
            message: message.into(),
            book_ids,
        }
    }

    /// `Ok(())` when `errors` is empty, a validation error otherwise.
    pub fn check(entity: &'static str, errors: Vec<FieldError>) -> Result<(), Self> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Self::Validation { entity, errors })
        }
    }
}

impl From<LibraryError> for AppError {
    fn from(err: LibraryError) -> Self {
        match err {
            LibraryError::NotFound { .. } => AppError::not_found(err.to_string()),
            LibraryError::Validation { entity, errors } => AppError::validation(
                errors.iter().map(|e| json!(e)).collect(),
                format!("invalid {entity}"),
            ),
            LibraryError::Conflict { message, book_ids } => AppError::conflict(
                book_ids
                    .into_iter()
                    .map(|id| json!({ "bookId": id }))
                    .collect(),
                message,
            ),
            LibraryError::Store(err) => {
                AppError::Internal(anyhow::Error::new(err).context("library store failure"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn check_passes_only_without_errors() {
        assert!(LibraryError::check("book", vec![]).is_ok());
        let err = LibraryError::check("book", vec![FieldError::required("title")]).unwrap_err();
        assert_eq!(err.to_string(), "invalid book");
    }

    #[test]
    fn library_errors_map_to_http_statuses() {
        let status = |err: LibraryError| AppError::from(err).status();

        assert_eq!(status(LibraryError::book_not_found("42")), StatusCode::NOT_FOUND);
        assert_eq!(
            status(LibraryError::check("borrower", vec![FieldError::required("email")]).unwrap_err()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status(LibraryError::conflict("book '3' is on loan", vec!["3".to_string()])),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(LibraryError::Store(StoreError::Rejected {
                backend: "memory",
                reason: "full".to_string()
            })),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
