use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Member {
    pub id: i64,
    pub member_code: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub is_active: bool,
}

/// Trimmed row for the borrow form.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ActiveMember {
    pub id: i64,
    pub member_code: String,
    pub name: String,
}

/// Insert a member with an auto-generated sequential code (`M0001`, `M0002`,
/// ...). Code generation and the insert share one transaction so two
/// concurrent inserts cannot mint the same code.
pub async fn insert(
    db: &SqlitePool,
    name: &str,
    email: &str,
    phone: &str,
) -> Result<Member, sqlx::Error> {
    let mut tx = db.begin().await?;

    let next_id: i64 = sqlx::query_scalar("SELECT IFNULL(MAX(id), 0) + 1 FROM members")
        .fetch_one(&mut *tx)
        .await?;
    let member_code = format!("M{next_id:04}");

    let member = sqlx::query_as::<_, Member>(
        r#"
        INSERT INTO members (member_code, name, email, phone, is_active)
        VALUES (?, ?, ?, ?, 1)
        RETURNING id, member_code, name, email, phone, is_active
        "#,
    )
    .bind(&member_code)
    .bind(name)
    .bind(email)
    .bind(phone)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(member)
}

pub async fn list(db: &SqlitePool) -> Result<Vec<Member>, sqlx::Error> {
    sqlx::query_as::<_, Member>(
        r#"
        SELECT id, member_code, name, email, phone, is_active
        FROM members
        ORDER BY id DESC
        "#,
    )
    .fetch_all(db)
    .await
}

pub async fn list_active(db: &SqlitePool) -> Result<Vec<ActiveMember>, sqlx::Error> {
    sqlx::query_as::<_, ActiveMember>(
        r#"
        SELECT id, member_code, name
        FROM members
        WHERE is_active = 1
        ORDER BY id DESC
        "#,
    )
    .fetch_all(db)
    .await
}

/// None when the member does not exist.
pub async fn is_active(db: &SqlitePool, id: i64) -> Result<Option<bool>, sqlx::Error> {
    sqlx::query_scalar("SELECT is_active FROM members WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await
}

/// member_code is immutable once assigned; only contact fields change.
pub async fn update(
    db: &SqlitePool,
    id: i64,
    name: &str,
    email: &str,
    phone: &str,
) -> Result<Option<Member>, sqlx::Error> {
    sqlx::query_as::<_, Member>(
        r#"
        UPDATE members
        SET name = ?, email = ?, phone = ?
        WHERE id = ?
        RETURNING id, member_code, name, email, phone, is_active
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(phone)
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn open_item_count(db: &SqlitePool, member_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM borrow_items bi
        JOIN borrow_tx tx ON tx.id = bi.tx_id
        WHERE tx.member_id = ? AND bi.status = 'borrowed'
        "#,
    )
    .bind(member_id)
    .fetch_one(db)
    .await
}

pub async fn delete(db: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM members WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_util::memory_pool;

    #[tokio::test]
    async fn member_codes_are_sequential() {
        let db = memory_pool().await;

        let first = insert(&db, "Somchai", "somchai@example.com", "0812345678")
            .await
            .expect("insert first member");
        assert_eq!(first.member_code, "M0001");
        assert!(first.is_active);

        let second = insert(&db, "Suda", "suda@example.com", "0898765432")
            .await
            .expect("insert second member");
        assert_eq!(second.member_code, "M0002");
    }

    #[tokio::test]
    async fn is_active_distinguishes_missing_from_disabled() {
        let db = memory_pool().await;
        let member = insert(&db, "Somchai", "somchai@example.com", "0812345678")
            .await
            .expect("insert member");

        assert_eq!(is_active(&db, member.id).await.unwrap(), Some(true));
        assert_eq!(is_active(&db, 999).await.unwrap(), None);

        sqlx::query("UPDATE members SET is_active = 0 WHERE id = ?")
            .bind(member.id)
            .execute(&db)
            .await
            .unwrap();
        assert_eq!(is_active(&db, member.id).await.unwrap(), Some(false));
    }

    #[tokio::test]
    async fn update_leaves_member_code_alone() {
        let db = memory_pool().await;
        let member = insert(&db, "Somchai", "somchai@example.com", "0812345678")
            .await
            .expect("insert member");

        let updated = update(&db, member.id, "Somchai P.", "new@example.com", "0800000000")
            .await
            .expect("update member")
            .expect("member exists");
        assert_eq!(updated.member_code, "M0001");
        assert_eq!(updated.name, "Somchai P.");
    }
}
