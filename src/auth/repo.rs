use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
}

pub async fn find_by_username(db: &SqlitePool, username: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, password_hash, role, is_active
        FROM users
        WHERE username = ?
        "#,
    )
    .bind(username)
    .fetch_optional(db)
    .await
}

pub async fn create(
    db: &SqlitePool,
    username: &str,
    password_hash: &str,
    role: Role,
    is_active: bool,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, password_hash, role, is_active)
        VALUES (?, ?, ?, ?)
        RETURNING id, username, password_hash, role, is_active
        "#,
    )
    .bind(username)
    .bind(password_hash)
    .bind(role)
    .bind(is_active)
    .fetch_one(db)
    .await
}

pub async fn list(db: &SqlitePool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, password_hash, role, is_active
        FROM users
        ORDER BY id DESC
        "#,
    )
    .fetch_all(db)
    .await
}

/// Staff attribution check used by the borrow engine.
pub async fn exists(db: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?;
    Ok(found.is_some())
}

/// Admin-only role / active-flag change. Users are never deleted, disabled
/// accounts keep their history rows attributable.
pub async fn update_flags(
    db: &SqlitePool,
    id: i64,
    role: Option<Role>,
    is_active: Option<bool>,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET role = COALESCE(?, role),
            is_active = COALESCE(?, is_active)
        WHERE id = ?
        RETURNING id, username, password_hash, role, is_active
        "#,
    )
    .bind(role)
    .bind(is_active)
    .bind(id)
    .fetch_optional(db)
    .await
}
