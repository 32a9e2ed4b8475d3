use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::get,
    Router,
};
use libris_authz::require_authenticated;
use libris_http::error::AppError;
use libris_http::extract::{Json, Path, Query};

use crate::modules::books::catalog;
use crate::modules::books::models::{Book, BookDraft, BookId, BookQuery};
use crate::modules::Confirmation;
use crate::repository::LibraryRepository;
use crate::utils;

pub(crate) fn router(repository: LibraryRepository) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/{id}", get(get_book).put(update_book).delete(delete_book))
        .route_layer(middleware::from_fn(require_authenticated))
        .route("/health", get(health_check))
        .with_state(repository)
}

async fn health_check() -> &'static str {
    "books module is healthy"
}

async fn list_books(
    State(repository): State<LibraryRepository>,
    Query(query): Query<BookQuery>,
) -> Result<Json<Vec<Book>>, AppError> {
    let library = repository.load().await?;
    Ok(Json(catalog::filter(library.books, &query)))
}

async fn get_book(
    State(repository): State<LibraryRepository>,
    Path(id): Path<String>,
) -> Result<Json<Book>, AppError> {
    let id = BookId(id);
    let library = repository.load().await?;
    library
        .find_book(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("book '{id}' not found")))
}

async fn create_book(
    State(repository): State<LibraryRepository>,
    Json(draft): Json<BookDraft>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let id = BookId::from(utils::next_timestamp_id());
    let current_year = utils::current_year();

    let book = repository
        .transact(move |library| library.create_book(id, draft, current_year))
        .await?;

    Ok((StatusCode::CREATED, Json(book)))
}

async fn update_book(
    State(repository): State<LibraryRepository>,
    Path(id): Path<String>,
    Json(draft): Json<BookDraft>,
) -> Result<Json<Book>, AppError> {
    let id = BookId(id);
    let current_year = utils::current_year();

    let book = repository
        .transact(move |library| library.update_book(&id, draft, current_year))
        .await?;

    Ok(Json(book))
}

async fn delete_book(
    State(repository): State<LibraryRepository>,
    Path(id): Path<String>,
    Query(confirmation): Query<Confirmation>,
) -> Result<Json<Book>, AppError> {
    confirmation.require("a book")?;
    let id = BookId(id);

    let book = repository
        .transact(move |library| library.delete_book(&id))
        .await?;

    Ok(Json(book))
}
