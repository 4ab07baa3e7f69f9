use std::collections::HashSet;

use serde::Serialize;
use sqlx::{Sqlite, SqlitePool, Transaction};
use time::Date;
use tracing::{info, warn};

use crate::auth::repo as users;
use crate::books::repo::{self as books, BookStatus};
use crate::error::ApiError;
use crate::members::repo as members;

/// Idempotent schema for the engine's own tables, run before first use.
pub async fn ensure_schema(db: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS borrow_tx (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            member_id INTEGER NOT NULL,
            staff_user_id INTEGER NOT NULL,
            borrow_date TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            default_due_date TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'open'
        )
        "#,
    )
    .execute(db)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS borrow_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            tx_id INTEGER NOT NULL,
            book_id INTEGER NOT NULL,
            due_date TEXT NOT NULL,
            return_date TEXT,
            status TEXT NOT NULL DEFAULT 'borrowed',
            return_staff_user_id INTEGER
        )
        "#,
    )
    .execute(db)
    .await?;

    Ok(())
}

/// One borrow action: one header row, one item row per book, one status flip
/// per book, committed as a single unit. Validation happens before any write;
/// any failure inside the unit rolls everything back.
///
/// Each book's availability is re-checked inside the transaction, so two
/// staff sessions racing for the same copy cannot both succeed.
pub async fn create_transaction(
    db: &SqlitePool,
    member_id: i64,
    staff_user_id: i64,
    default_due_date: Date,
    book_ids: &[i64],
) -> Result<i64, ApiError> {
    let mut errors = Vec::new();
    if book_ids.is_empty() {
        errors.push("select at least one book".to_string());
    }
    let mut seen = HashSet::new();
    if !book_ids.iter().all(|id| seen.insert(*id)) {
        errors.push("the same book is listed more than once".to_string());
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    match members::is_active(db, member_id).await? {
        Some(true) => {}
        Some(false) => {
            return Err(ApiError::Validation(vec![
                "member is not active".to_string()
            ]))
        }
        None => return Err(ApiError::NotFound("member")),
    }
    if !users::exists(db, staff_user_id).await? {
        return Err(ApiError::NotFound("staff user"));
    }

    let mut tx = db.begin().await?;

    let tx_id = sqlx::query(
        r#"
        INSERT INTO borrow_tx (member_id, staff_user_id, borrow_date, default_due_date)
        VALUES (?, ?, datetime('now'), ?)
        "#,
    )
    .bind(member_id)
    .bind(staff_user_id)
    .bind(default_due_date)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    for &book_id in book_ids {
        match books::status_of(&mut tx, book_id).await? {
            None => return Err(ApiError::NotFound("book")),
            Some(BookStatus::Borrowed) => return Err(ApiError::BookNotAvailable(book_id)),
            Some(BookStatus::Available) => {}
        }

        sqlx::query(
            r#"
            INSERT INTO borrow_items (tx_id, book_id, due_date)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(tx_id)
        .bind(book_id)
        .bind(default_due_date)
        .execute(&mut *tx)
        .await?;

        books::set_status(&mut tx, book_id, BookStatus::Borrowed).await?;
    }

    tx.commit().await?;

    info!(
        tx_id,
        member_id,
        staff_id = staff_user_id,
        books = book_ids.len(),
        "borrow transaction created"
    );
    Ok(tx_id)
}

/// Return a single borrowed item, stamping the return date and the returning
/// staff member together, then recompute the book's status in the same unit.
/// Returns false when no open item matches, already returned or unknown ids
/// are a benign no-op, not an error. Sibling items of the same transaction
/// are untouched.
pub async fn return_item(
    db: &SqlitePool,
    item_id: i64,
    staff_user_id: i64,
) -> Result<bool, ApiError> {
    let mut tx = db.begin().await?;

    let book_id: Option<i64> = sqlx::query_scalar(
        "SELECT book_id FROM borrow_items WHERE id = ? AND status = 'borrowed'",
    )
    .bind(item_id)
    .fetch_optional(&mut *tx)
    .await?;
    let Some(book_id) = book_id else {
        return Ok(false);
    };

    sqlx::query(
        r#"
        UPDATE borrow_items
        SET status = 'returned',
            return_date = datetime('now'),
            return_staff_user_id = ?
        WHERE id = ? AND status = 'borrowed'
        "#,
    )
    .bind(staff_user_id)
    .bind(item_id)
    .execute(&mut *tx)
    .await?;

    let status = recompute_book_status(&mut tx, book_id).await?;
    books::set_status(&mut tx, book_id, status).await?;

    tx.commit().await?;

    info!(item_id, book_id, staff_id = staff_user_id, "item returned");
    Ok(true)
}

#[derive(Debug, Serialize)]
pub struct BulkReturnOutcome {
    pub succeeded: u32,
    pub failed_ids: Vec<i64>,
}

/// Best-effort bulk return: each item is attempted independently and failures
/// are collected instead of aborting the batch. Completing the loop counts as
/// overall success; partial results are reported through the counts.
pub async fn return_items(
    db: &SqlitePool,
    item_ids: &[i64],
    staff_user_id: i64,
) -> Result<BulkReturnOutcome, ApiError> {
    if item_ids.is_empty() {
        return Err(ApiError::Validation(vec![
            "select at least one item to return".to_string(),
        ]));
    }

    let mut succeeded = 0u32;
    let mut failed_ids = Vec::new();

    for &item_id in item_ids {
        match return_item(db, item_id, staff_user_id).await {
            Ok(true) => succeeded += 1,
            Ok(false) => failed_ids.push(item_id),
            Err(e) => {
                warn!(item_id, error = %e, "bulk return item failed");
                failed_ids.push(item_id);
            }
        }
    }

    info!(
        staff_id = staff_user_id,
        succeeded,
        failed = failed_ids.len(),
        "bulk return completed"
    );
    Ok(BulkReturnOutcome {
        succeeded,
        failed_ids,
    })
}

/// The one place book status is derived: borrowed iff at least one open item
/// references the book. Runs inside the caller's transaction so the invariant
/// cannot drift between the item write and the status write.
async fn recompute_book_status(
    tx: &mut Transaction<'_, Sqlite>,
    book_id: i64,
) -> Result<BookStatus, sqlx::Error> {
    let open: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM borrow_items WHERE book_id = ? AND status = 'borrowed'",
    )
    .bind(book_id)
    .fetch_one(&mut **tx)
    .await?;
    Ok(if open > 0 {
        BookStatus::Borrowed
    } else {
        BookStatus::Available
    })
}
