use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use crate::books::dto::BookUpsertRequest;
use crate::books::repo::{self, AvailableBook, Book, BookStatus};
use crate::error::ApiError;
use crate::auth::jwt::AuthStaff;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/books", get(list_books).post(create_book))
        .route("/books/available", get(list_available))
        .route("/books/:id", axum::routing::put(update_book).delete(delete_book))
}

fn validate_upsert(payload: &BookUpsertRequest) -> Result<(String, String), ApiError> {
    let title = payload.title.trim();
    let author = payload.author.trim();
    let mut errors = Vec::new();
    if title.is_empty() {
        errors.push("title is required".to_string());
    }
    if author.is_empty() {
        errors.push("author is required".to_string());
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }
    Ok((title.to_string(), author.to_string()))
}

#[instrument(skip(state, staff, payload))]
pub async fn create_book(
    State(state): State<AppState>,
    staff: AuthStaff,
    Json(payload): Json<BookUpsertRequest>,
) -> Result<(StatusCode, Json<Book>), ApiError> {
    let (title, author) = validate_upsert(&payload)?;
    let book = repo::insert(&state.db, &title, &author).await?;
    info!(staff_id = staff.user_id, book_id = book.id, "book created");
    Ok((StatusCode::CREATED, Json(book)))
}

#[instrument(skip(state, _staff))]
pub async fn list_books(
    State(state): State<AppState>,
    _staff: AuthStaff,
) -> Result<Json<Vec<Book>>, ApiError> {
    Ok(Json(repo::list(&state.db).await?))
}

#[instrument(skip(state, _staff))]
pub async fn list_available(
    State(state): State<AppState>,
    _staff: AuthStaff,
) -> Result<Json<Vec<AvailableBook>>, ApiError> {
    Ok(Json(repo::list_available(&state.db).await?))
}

#[instrument(skip(state, staff, payload))]
pub async fn update_book(
    State(state): State<AppState>,
    staff: AuthStaff,
    Path(id): Path<i64>,
    Json(payload): Json<BookUpsertRequest>,
) -> Result<Json<Book>, ApiError> {
    let (title, author) = validate_upsert(&payload)?;
    let book = repo::update(&state.db, id, &title, &author)
        .await?
        .ok_or(ApiError::NotFound("book"))?;
    info!(staff_id = staff.user_id, book_id = book.id, "book updated");
    Ok(Json(book))
}

/// A borrowed book cannot be removed from the catalog, its open borrow item
/// would be left dangling. The status check and the delete share one
/// transaction so a concurrent borrow cannot slip between them.
#[instrument(skip(state, staff))]
pub async fn delete_book(
    State(state): State<AppState>,
    staff: AuthStaff,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let mut tx = state.db.begin().await?;
    match repo::status_of(&mut tx, id).await? {
        None => return Err(ApiError::NotFound("book")),
        Some(BookStatus::Borrowed) => return Err(ApiError::BookNotAvailable(id)),
        Some(BookStatus::Available) => {}
    }
    repo::delete(&mut tx, id).await?;
    tx.commit().await?;

    info!(staff_id = staff.user_id, book_id = id, "book deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo::{self as users, Role};
    use crate::borrows::engine;
    use crate::db::test_util::test_state;
    use crate::members::repo as members;
    use time::macros::date;

    async fn staff_ctx(state: &AppState) -> AuthStaff {
        let user = users::create(&state.db, "staff1", "x", Role::Staff, true)
            .await
            .expect("seed staff");
        AuthStaff {
            user_id: user.id,
            role: Role::Staff,
        }
    }

    async fn book_rows(state: &AppState, id: i64) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE id = ?")
            .bind(id)
            .fetch_one(&state.db)
            .await
            .expect("count books")
    }

    #[tokio::test]
    async fn delete_rejects_borrowed_book_and_keeps_row() {
        let state = test_state().await;
        let staff = staff_ctx(&state).await;
        let member = members::insert(&state.db, "Somchai", "a@example.com", "081")
            .await
            .expect("seed member");
        let book = repo::insert(&state.db, "Dune", "Herbert")
            .await
            .expect("seed book");

        engine::create_transaction(
            &state.db,
            member.id,
            staff.user_id,
            date!(2025 - 01 - 10),
            &[book.id],
        )
        .await
        .expect("borrow");

        let err = delete_book(State(state.clone()), staff, Path(book.id))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BookNotAvailable(id) if id == book.id));
        assert_eq!(book_rows(&state, book.id).await, 1);

        // back on the shelf, the delete goes through
        let item: i64 = sqlx::query_scalar("SELECT MAX(id) FROM borrow_items")
            .fetch_one(&state.db)
            .await
            .expect("item id");
        engine::return_item(&state.db, item, staff.user_id)
            .await
            .expect("return");

        let status = delete_book(State(state.clone()), staff, Path(book.id))
            .await
            .expect("delete");
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(book_rows(&state, book.id).await, 0);
    }

    #[tokio::test]
    async fn delete_of_unknown_book_is_not_found() {
        let state = test_state().await;
        let staff = staff_ctx(&state).await;
        let err = delete_book(State(state), staff, Path(999))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound("book")));
    }
}
