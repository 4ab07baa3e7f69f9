use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::auth::jwt::AuthStaff;
use crate::borrows::dto::{
    ActiveItemsQuery, BulkReturnRequest, CreateBorrowRequest, CreatedBorrowResponse, ReturnOutcome,
};
use crate::borrows::engine::{self, BulkReturnOutcome};
use crate::borrows::repo::{self, ActiveItem};
use crate::dates::parse_date;
use crate::error::ApiError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/borrows", post(create_borrow))
        .route("/borrows/active", get(active_items))
        .route("/borrows/returns", post(bulk_return))
        .route("/borrows/items/:id/return", post(single_return))
}

#[instrument(skip(state, staff, payload))]
pub async fn create_borrow(
    State(state): State<AppState>,
    staff: AuthStaff,
    Json(payload): Json<CreateBorrowRequest>,
) -> Result<(StatusCode, Json<CreatedBorrowResponse>), ApiError> {
    let mut errors = Vec::new();

    let member_id = match payload.member_id {
        Some(id) => Some(id),
        None => {
            errors.push("select a member".to_string());
            None
        }
    };
    let due_date = match payload.due_date.as_deref() {
        Some(raw) => match parse_date(raw) {
            Ok(d) => Some(d),
            Err(_) => {
                errors.push("due date must be YYYY-MM-DD".to_string());
                None
            }
        },
        None => {
            errors.push("due date is required".to_string());
            None
        }
    };
    if payload.book_ids.is_empty() {
        errors.push("select at least one book".to_string());
    }
    let (member_id, due_date) = match (member_id, due_date) {
        (Some(m), Some(d)) if errors.is_empty() => (m, d),
        _ => return Err(ApiError::Validation(errors)),
    };

    let tx_id = engine::create_transaction(
        &state.db,
        member_id,
        staff.user_id,
        due_date,
        &payload.book_ids,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(CreatedBorrowResponse { tx_id })))
}

#[instrument(skip(state, _staff))]
pub async fn active_items(
    State(state): State<AppState>,
    _staff: AuthStaff,
    Query(query): Query<ActiveItemsQuery>,
) -> Result<Json<Vec<ActiveItem>>, ApiError> {
    let items = match query.member_id {
        Some(member_id) => repo::active_items_for_member(&state.db, member_id).await?,
        None => repo::all_active_items(&state.db).await?,
    };
    Ok(Json(items))
}

#[instrument(skip(state, staff))]
pub async fn single_return(
    State(state): State<AppState>,
    staff: AuthStaff,
    Path(item_id): Path<i64>,
) -> Result<Json<ReturnOutcome>, ApiError> {
    let returned = engine::return_item(&state.db, item_id, staff.user_id).await?;
    Ok(Json(ReturnOutcome { returned }))
}

#[instrument(skip(state, staff, payload))]
pub async fn bulk_return(
    State(state): State<AppState>,
    staff: AuthStaff,
    Json(payload): Json<BulkReturnRequest>,
) -> Result<Json<BulkReturnOutcome>, ApiError> {
    let outcome = engine::return_items(&state.db, &payload.item_ids, staff.user_id).await?;
    Ok(Json(outcome))
}
