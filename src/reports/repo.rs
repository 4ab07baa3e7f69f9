use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use time::Date;

use crate::books::repo::BookStatus;
use crate::borrows::repo::ItemStatus;

/// One line of the borrow/return history, including who performed the borrow
/// and (when returned) who took the return. Staff joins are LEFT JOINs so
/// rows survive even if an account row ever goes missing.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct HistoryRow {
    pub item_id: i64,
    pub tx_id: i64,
    pub member_code: String,
    pub member_name: String,
    pub book_id: i64,
    pub book_title: String,
    pub borrow_date: String,
    pub due_date: String,
    pub return_date: Option<String>,
    pub status: ItemStatus,
    pub borrowed_by: Option<String>,
    pub returned_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct StatusCount {
    pub status: BookStatus,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MonthlyCount {
    pub month: String,
    pub borrows: i64,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ReportRow {
    pub member_code: String,
    pub member_name: String,
    pub book_title: String,
    pub borrow_date: String,
    pub due_date: String,
    pub return_date: Option<String>,
    pub status: ItemStatus,
    pub borrowed_by: String,
    pub returned_by: Option<String>,
}

pub async fn history(db: &SqlitePool, limit: i64) -> Result<Vec<HistoryRow>, sqlx::Error> {
    sqlx::query_as::<_, HistoryRow>(
        r#"
        SELECT
            bi.id AS item_id,
            tx.id AS tx_id,
            m.member_code AS member_code,
            m.name AS member_name,
            bk.id AS book_id,
            bk.title AS book_title,
            tx.borrow_date AS borrow_date,
            bi.due_date AS due_date,
            bi.return_date AS return_date,
            bi.status AS status,
            u1.username AS borrowed_by,
            u2.username AS returned_by
        FROM borrow_items bi
        JOIN borrow_tx tx ON tx.id = bi.tx_id
        JOIN members m ON m.id = tx.member_id
        JOIN books bk ON bk.id = bi.book_id
        LEFT JOIN users u1 ON u1.id = tx.staff_user_id
        LEFT JOIN users u2 ON u2.id = bi.return_staff_user_id
        ORDER BY bi.id DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(db)
    .await
}

pub async fn status_summary(db: &SqlitePool) -> Result<Vec<StatusCount>, sqlx::Error> {
    sqlx::query_as::<_, StatusCount>(
        r#"
        SELECT status, COUNT(*) AS count
        FROM books
        GROUP BY status
        "#,
    )
    .fetch_all(db)
    .await
}

/// Borrow transactions per calendar month within an inclusive date range.
pub async fn monthly_borrow_counts(
    db: &SqlitePool,
    start: Date,
    end: Date,
) -> Result<Vec<MonthlyCount>, sqlx::Error> {
    sqlx::query_as::<_, MonthlyCount>(
        r#"
        SELECT
            strftime('%Y-%m', borrow_date) AS month,
            COUNT(*) AS borrows
        FROM borrow_tx
        WHERE DATE(borrow_date) BETWEEN ? AND ?
        GROUP BY strftime('%Y-%m', borrow_date)
        ORDER BY month
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(db)
    .await
}

/// Item-level report over a date range, optionally restricted to one item
/// status. The filter clause is appended only when a status is given.
pub async fn filtered_report(
    db: &SqlitePool,
    start: Date,
    end: Date,
    status: Option<ItemStatus>,
) -> Result<Vec<ReportRow>, sqlx::Error> {
    let mut sql = String::from(
        r#"
        SELECT
            m.member_code AS member_code,
            m.name AS member_name,
            bk.title AS book_title,
            tx.borrow_date AS borrow_date,
            bi.due_date AS due_date,
            bi.return_date AS return_date,
            bi.status AS status,
            u1.username AS borrowed_by,
            u2.username AS returned_by
        FROM borrow_items bi
        JOIN borrow_tx tx ON tx.id = bi.tx_id
        JOIN members m ON m.id = tx.member_id
        JOIN books bk ON bk.id = bi.book_id
        JOIN users u1 ON u1.id = tx.staff_user_id
        LEFT JOIN users u2 ON u2.id = bi.return_staff_user_id
        WHERE DATE(tx.borrow_date) BETWEEN ? AND ?
        "#,
    );
    if status.is_some() {
        sql.push_str(" AND bi.status = ?");
    }
    sql.push_str(" ORDER BY tx.borrow_date DESC, bi.id DESC");

    let mut query = sqlx::query_as::<_, ReportRow>(&sql).bind(start).bind(end);
    if let Some(status) = status {
        query = query.bind(status);
    }
    query.fetch_all(db).await
}
