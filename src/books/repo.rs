use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum BookStatus {
    Available,
    Borrowed,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub status: BookStatus,
}

/// Shorter row for the borrow form: only books that can actually be lent out.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AvailableBook {
    pub id: i64,
    pub title: String,
    pub author: String,
}

pub async fn insert(db: &SqlitePool, title: &str, author: &str) -> Result<Book, sqlx::Error> {
    sqlx::query_as::<_, Book>(
        r#"
        INSERT INTO books (title, author, status)
        VALUES (?, ?, 'available')
        RETURNING id, title, author, status
        "#,
    )
    .bind(title)
    .bind(author)
    .fetch_one(db)
    .await
}

pub async fn list(db: &SqlitePool) -> Result<Vec<Book>, sqlx::Error> {
    sqlx::query_as::<_, Book>(
        r#"
        SELECT id, title, author, status
        FROM books
        ORDER BY id DESC
        "#,
    )
    .fetch_all(db)
    .await
}

pub async fn list_available(db: &SqlitePool) -> Result<Vec<AvailableBook>, sqlx::Error> {
    sqlx::query_as::<_, AvailableBook>(
        r#"
        SELECT id, title, author
        FROM books
        WHERE status = 'available'
        ORDER BY id DESC
        "#,
    )
    .fetch_all(db)
    .await
}

/// Catalog edits touch title/author only. A book's status belongs to the
/// borrow engine and is never writable through here.
pub async fn update(
    db: &SqlitePool,
    id: i64,
    title: &str,
    author: &str,
) -> Result<Option<Book>, sqlx::Error> {
    sqlx::query_as::<_, Book>(
        r#"
        UPDATE books
        SET title = ?, author = ?
        WHERE id = ?
        RETURNING id, title, author, status
        "#,
    )
    .bind(title)
    .bind(author)
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn status_of(
    tx: &mut Transaction<'_, Sqlite>,
    id: i64,
) -> Result<Option<BookStatus>, sqlx::Error> {
    sqlx::query_scalar("SELECT status FROM books WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
}

pub async fn set_status(
    tx: &mut Transaction<'_, Sqlite>,
    id: i64,
    status: BookStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE books SET status = ? WHERE id = ?")
        .bind(status)
        .bind(id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

pub async fn delete(tx: &mut Transaction<'_, Sqlite>, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM books WHERE id = ?")
        .bind(id)
        .execute(&mut **tx)
        .await?;
    Ok(result.rows_affected() > 0)
}
