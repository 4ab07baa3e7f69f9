use std::str::FromStr;

use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use crate::auth::password::hash_password;
use crate::config::AppConfig;

pub async fn connect(database_url: &str) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .context("parse DATABASE_URL")?
        .create_if_missing(true)
        .foreign_keys(true);
    let db = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .context("connect to database")?;
    Ok(db)
}

/// Idempotent base schema for users, books and members. The borrow engine
/// owns its own tables, see `borrows::engine::ensure_schema`.
pub async fn ensure_schema(db: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'staff',
            is_active INTEGER NOT NULL DEFAULT 1
        )
        "#,
    )
    .execute(db)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS books (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            author TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'available'
        )
        "#,
    )
    .execute(db)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS members (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            member_code TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            phone TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1
        )
        "#,
    )
    .execute(db)
    .await?;

    Ok(())
}

/// Create the initial admin account when the user table is empty, so a fresh
/// deployment can be logged into at all.
pub async fn seed_admin(db: &SqlitePool, config: &AppConfig) -> anyhow::Result<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(db)
        .await?;
    if count > 0 {
        return Ok(());
    }

    let hash = hash_password(&config.admin_password)?;
    sqlx::query(
        r#"
        INSERT INTO users (username, password_hash, role, is_active)
        VALUES (?, ?, 'admin', 1)
        "#,
    )
    .bind(&config.admin_username)
    .bind(&hash)
    .execute(db)
    .await?;

    info!(username = %config.admin_username, "seeded initial admin user");
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_util {
    use std::sync::Arc;

    use super::*;
    use crate::config::JwtConfig;
    use crate::state::AppState;

    /// Single-connection in-memory pool: every query sees the same database.
    pub async fn memory_pool() -> SqlitePool {
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("open in-memory sqlite");
        ensure_schema(&db).await.expect("base schema");
        crate::borrows::engine::ensure_schema(&db)
            .await
            .expect("borrow schema");
        db
    }

    /// App state over an in-memory pool, for exercising handlers directly.
    pub async fn test_state() -> AppState {
        let config = Arc::new(AppConfig {
            database_url: "sqlite::memory:".into(),
            jwt: JwtConfig {
                secret: "test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
            },
            admin_username: "admin".into(),
            admin_password: "admin1234".into(),
        });
        AppState::from_parts(memory_pool().await, config)
    }
}
