//! Client for the generic mock REST endpoint the library can be imported from.
//!
//! The endpoint exposes `/{resource}` and `/{resource}/{id}` with the usual list, get,
//! create, update and delete verbs. Records come back in the stored camelCase shape, often
//! with numbers encoded as strings; the models accept both.

use std::time::Duration;

use libris_kernel::settings::RemoteSettings;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::library::Library;
use crate::modules::books::models::{Book, BookId};
use crate::modules::borrowers::models::Borrower;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("remote.base_url is not configured")]
    NotConfigured,

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Clone, Debug)]
pub struct MockApiClient {
    client: reqwest::Client,
    base_url: String,
    books_resource: String,
    borrowers_resource: String,
}

impl MockApiClient {
    pub fn new(settings: &RemoteSettings) -> Result<Self, RemoteError> {
        let base_url = settings
            .base_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .filter(|url| !url.is_empty())
            .ok_or(RemoteError::NotConfigured)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            books_resource: settings.books_resource.clone(),
            borrowers_resource: settings.borrowers_resource.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, resource: &str, id: Option<&str>) -> String {
        match id {
            Some(id) => format!("{}/{resource}/{id}", self.base_url),
            None => format!("{}/{resource}", self.base_url),
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        url: String,
        request: reqwest::RequestBuilder,
    ) -> Result<T, RemoteError> {
        let response = request.send().await.map_err(|source| RemoteError::Request {
            url: url.clone(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(%url, status = status.as_u16(), "mock endpoint returned an error");
            return Err(RemoteError::Status {
                url,
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|source| RemoteError::Request { url, source })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, RemoteError> {
        let request = self.client.get(&url);
        self.send(url, request).await
    }

    async fn write_json<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        method: reqwest::Method,
        url: String,
        body: &B,
    ) -> Result<T, RemoteError> {
        let request = self.client.request(method, &url).json(body);
        self.send(url, request).await
    }

    pub async fn list_books(&self) -> Result<Vec<Book>, RemoteError> {
        self.get_json(self.url(&self.books_resource, None)).await
    }

    pub async fn get_book(&self, id: &BookId) -> Result<Book, RemoteError> {
        self.get_json(self.url(&self.books_resource, Some(id.as_str())))
            .await
    }

    pub async fn create_book(&self, book: &Book) -> Result<Book, RemoteError> {
        self.write_json(
            reqwest::Method::POST,
            self.url(&self.books_resource, None),
            book,
        )
        .await
    }

    pub async fn update_book(&self, id: &BookId, book: &Book) -> Result<Book, RemoteError> {
        self.write_json(
            reqwest::Method::PUT,
            self.url(&self.books_resource, Some(id.as_str())),
            book,
        )
        .await
    }

    /// Delete a book; the endpoint echoes the removed record.
    pub async fn delete_book(&self, id: &BookId) -> Result<Book, RemoteError> {
        let url = self.url(&self.books_resource, Some(id.as_str()));
        let request = self.client.delete(&url);
        self.send(url, request).await
    }

    pub async fn list_borrowers(&self) -> Result<Vec<Borrower>, RemoteError> {
        self.get_json(self.url(&self.borrowers_resource, None))
            .await
    }

    /// Catalog and borrowers as the endpoint currently holds them, not yet reconciled.
    pub async fn fetch_library(&self) -> Result<Library, RemoteError> {
        let books = self.list_books().await?;
        let borrowers = self.list_borrowers().await?;
        tracing::info!(
            base_url = %self.base_url,
            books = books.len(),
            borrowers = borrowers.len(),
            "fetched library from mock endpoint"
        );
        Ok(Library::new(books, borrowers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::models::{BookDraft, BookStatus};
    use axum::{
        extract::{Path, State},
        http::StatusCode,
        routing::get,
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    type Records = Arc<Mutex<Vec<Value>>>;

    async fn list(State(records): State<Records>) -> Json<Value> {
        let snapshot = records.lock().unwrap().clone();
        Json(Value::Array(snapshot))
    }

    async fn fetch(
        State(records): State<Records>,
        Path(id): Path<String>,
    ) -> Result<Json<Value>, StatusCode> {
        let found = records
            .lock()
            .unwrap()
            .iter()
            .find(|record| record["id"] == id.as_str())
            .cloned();
        found.map(Json).ok_or(StatusCode::NOT_FOUND)
    }

    async fn create(
        State(records): State<Records>,
        Json(mut record): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        let mut records = records.lock().unwrap();
        record["id"] = json!((records.len() + 1).to_string());
        records.push(record.clone());
        (StatusCode::CREATED, Json(record))
    }

    async fn replace(
        State(records): State<Records>,
        Path(id): Path<String>,
        Json(mut record): Json<Value>,
    ) -> Result<Json<Value>, StatusCode> {
        let mut records = records.lock().unwrap();
        let slot = records
            .iter_mut()
            .find(|record| record["id"] == id.as_str())
            .ok_or(StatusCode::NOT_FOUND)?;
        record["id"] = json!(id);
        *slot = record.clone();
        Ok(Json(record))
    }

    async fn remove(
        State(records): State<Records>,
        Path(id): Path<String>,
    ) -> Result<Json<Value>, StatusCode> {
        let mut records = records.lock().unwrap();
        let position = records
            .iter()
            .position(|record| record["id"] == id.as_str())
            .ok_or(StatusCode::NOT_FOUND)?;
        Ok(Json(records.remove(position)))
    }

    /// Serve a mock endpoint on an ephemeral port; returns its base URL.
    async fn mock_endpoint() -> String {
        let books: Records = Arc::new(Mutex::new(vec![json!({
            "id": "1",
            "title": "The Hobbit",
            "author": "J. R. R. Tolkien",
            "price": "22.49",
            "publishedYear": "1937",
            "pages": "",
            "status": "borrowed"
        })]));
        let borrowers: Records = Arc::new(Mutex::new(vec![json!({
            "id": "1",
            "name": "Bob Wilson",
            "email": "bob@example.com",
            "membershipId": "MEM003",
            "totalBill": "22.49",
            "borrowedBooks": [
                { "id": "1", "title": "The Hobbit", "returnDate": "2024-04-05", "returned": false }
            ]
        })]));

        let app = Router::new()
            .route("/books", get(list).post(create))
            .route("/books/{id}", get(fetch).put(replace).delete(remove))
            .with_state(books)
            .merge(
                Router::new()
                    .route("/borrowers", get(list))
                    .with_state(borrowers),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{address}/")
    }

    fn client(base_url: String) -> MockApiClient {
        MockApiClient::new(&RemoteSettings {
            base_url: Some(base_url),
            ..RemoteSettings::default()
        })
        .unwrap()
    }

    #[test]
    fn missing_base_url_is_reported() {
        assert!(matches!(
            MockApiClient::new(&RemoteSettings::default()),
            Err(RemoteError::NotConfigured)
        ));
    }

    #[tokio::test]
    async fn fetches_books_and_borrowers_with_lenient_numbers() {
        let client = client(mock_endpoint().await);
        assert!(!client.base_url().ends_with('/'));

        let library = client.fetch_library().await.unwrap();
        assert_eq!(library.books.len(), 1);
        assert_eq!(library.books[0].published_year, Some(1937));
        assert_eq!(library.books[0].pages, None);
        assert_eq!(library.borrowers[0].membership_id, "MEM003");
        assert!(library.violations().is_empty());
    }

    #[tokio::test]
    async fn book_crud_round_trip() {
        let client = client(mock_endpoint().await);

        let draft = BookDraft {
            title: "Dune".to_string(),
            author: "Frank Herbert".to_string(),
            ..BookDraft::default()
        };
        let created = client
            .create_book(&draft.into_book(BookId::from("0"), BookStatus::Available))
            .await
            .unwrap();
        assert_eq!(created.id, BookId::from("2"));

        let mut renamed = client.get_book(&created.id).await.unwrap();
        renamed.title = "Dune Messiah".to_string();
        let updated = client.update_book(&created.id, &renamed).await.unwrap();
        assert_eq!(updated.title, "Dune Messiah");

        let removed = client.delete_book(&created.id).await.unwrap();
        assert_eq!(removed.id, created.id);
        assert_eq!(client.list_books().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn error_statuses_are_surfaced() {
        let client = client(mock_endpoint().await);

        let err = client.get_book(&BookId::from("404")).await.unwrap_err();
        assert!(matches!(err, RemoteError::Status { status: 404, .. }));
    }
}
