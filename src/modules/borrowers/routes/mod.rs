use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Router,
};
use libris_authz::require_authenticated;
use libris_http::error::AppError;
use libris_http::extract::{Json, Path, Query};

use crate::modules::books::models::BookId;
use crate::modules::borrowers::models::{
    BorrowerId, BorrowerQuery, BorrowerUpdate, BorrowerView, NewBorrower,
};
use crate::modules::borrowers::records;
use crate::modules::Confirmation;
use crate::repository::LibraryRepository;
use crate::utils;

#[derive(Clone)]
pub(crate) struct BorrowersState {
    pub repository: LibraryRepository,
    pub loan_period_days: u32,
}

pub(crate) fn router(state: BorrowersState) -> Router {
    Router::new()
        .route("/", get(list_borrowers).post(create_borrower))
        .route(
            "/{id}",
            get(get_borrower).put(update_borrower).delete(delete_borrower),
        )
        .route("/{id}/books/{book_id}/toggle", post(toggle_return))
        .route_layer(middleware::from_fn(require_authenticated))
        .route("/health", get(health_check))
        .with_state(state)
}

async fn health_check() -> &'static str {
    "borrowers module is healthy"
}

async fn list_borrowers(
    State(state): State<BorrowersState>,
    Query(query): Query<BorrowerQuery>,
) -> Result<Json<Vec<BorrowerView>>, AppError> {
    let library = state.repository.load().await?;
    let borrowers = records::filter(library.borrowers, &query)
        .into_iter()
        .map(BorrowerView::from)
        .collect();
    Ok(Json(borrowers))
}

async fn get_borrower(
    State(state): State<BorrowersState>,
    Path(id): Path<u64>,
) -> Result<Json<BorrowerView>, AppError> {
    let id = BorrowerId(id);
    let library = state.repository.load().await?;
    library
        .find_borrower(id)
        .cloned()
        .map(|borrower| Json(BorrowerView::from(borrower)))
        .ok_or_else(|| AppError::not_found(format!("borrower '{id}' not found")))
}

async fn create_borrower(
    State(state): State<BorrowersState>,
    Json(request): Json<NewBorrower>,
) -> Result<(StatusCode, Json<BorrowerView>), AppError> {
    let id = BorrowerId(utils::next_timestamp_id());
    let due = utils::due_date(utils::today(), state.loan_period_days);

    let borrower = state
        .repository
        .transact(move |library| {
            library.create_borrower(id, request, due, utils::generate_membership_id)
        })
        .await?;

    Ok((StatusCode::CREATED, Json(borrower.into())))
}

async fn update_borrower(
    State(state): State<BorrowersState>,
    Path(id): Path<u64>,
    Json(update): Json<BorrowerUpdate>,
) -> Result<Json<BorrowerView>, AppError> {
    let borrower = state
        .repository
        .transact(move |library| library.update_borrower(BorrowerId(id), update))
        .await?;

    Ok(Json(borrower.into()))
}

async fn toggle_return(
    State(state): State<BorrowersState>,
    Path((id, book_id)): Path<(u64, String)>,
) -> Result<Json<BorrowerView>, AppError> {
    let book_id = BookId(book_id);
    let borrower = state
        .repository
        .transact(move |library| library.toggle_return(BorrowerId(id), &book_id))
        .await?;

    Ok(Json(borrower.into()))
}

async fn delete_borrower(
    State(state): State<BorrowersState>,
    Path(id): Path<u64>,
    Query(confirmation): Query<Confirmation>,
) -> Result<Json<BorrowerView>, AppError> {
    confirmation.require("a borrower")?;

    let borrower = state
        .repository
        .transact(move |library| library.delete_borrower(BorrowerId(id)))
        .await?;

    Ok(Json(borrower.into()))
}
