use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ItemStatus {
    Borrowed,
    Returned,
}

/// An open borrow item joined to its transaction, member and book, the shape
/// the return form works from.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ActiveItem {
    pub item_id: i64,
    pub tx_id: i64,
    pub member_code: String,
    pub member_name: String,
    pub book_id: i64,
    pub book_title: String,
    pub borrow_date: String,
    pub due_date: String,
}

const ACTIVE_ITEMS_BASE: &str = r#"
    SELECT
        bi.id AS item_id,
        tx.id AS tx_id,
        m.member_code AS member_code,
        m.name AS member_name,
        bk.id AS book_id,
        bk.title AS book_title,
        tx.borrow_date AS borrow_date,
        bi.due_date AS due_date
    FROM borrow_items bi
    JOIN borrow_tx tx ON tx.id = bi.tx_id
    JOIN members m ON m.id = tx.member_id
    JOIN books bk ON bk.id = bi.book_id
    WHERE bi.status = 'borrowed'
"#;

pub async fn active_items_for_member(
    db: &SqlitePool,
    member_id: i64,
) -> Result<Vec<ActiveItem>, sqlx::Error> {
    let sql = format!("{ACTIVE_ITEMS_BASE} AND m.id = ? ORDER BY bi.id DESC");
    sqlx::query_as::<_, ActiveItem>(&sql)
        .bind(member_id)
        .fetch_all(db)
        .await
}

pub async fn all_active_items(db: &SqlitePool) -> Result<Vec<ActiveItem>, sqlx::Error> {
    let sql = format!("{ACTIVE_ITEMS_BASE} ORDER BY bi.id DESC");
    sqlx::query_as::<_, ActiveItem>(&sql).fetch_all(db).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo::{self as users, Role};
    use crate::books::repo as books;
    use crate::borrows::engine;
    use crate::db::test_util::memory_pool;
    use crate::members::repo as members;
    use time::macros::date;

    #[tokio::test]
    async fn active_items_join_member_and_book() {
        let db = memory_pool().await;
        let staff = users::create(&db, "staff1", "x", Role::Staff, true)
            .await
            .unwrap()
            .id;
        let m1 = members::insert(&db, "Somchai", "a@example.com", "081")
            .await
            .unwrap();
        let m2 = members::insert(&db, "Suda", "b@example.com", "082")
            .await
            .unwrap();
        let b1 = books::insert(&db, "Dune", "Herbert").await.unwrap().id;
        let b2 = books::insert(&db, "Hyperion", "Simmons").await.unwrap().id;

        engine::create_transaction(&db, m1.id, staff, date!(2025 - 01 - 10), &[b1, b2])
            .await
            .expect("borrow");

        let mine = active_items_for_member(&db, m1.id).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert_eq!(mine[0].member_code, "M0001");
        assert_eq!(mine[0].member_name, "Somchai");
        assert_eq!(mine[0].due_date, "2025-01-10");

        assert!(active_items_for_member(&db, m2.id).await.unwrap().is_empty());
        assert_eq!(all_active_items(&db).await.unwrap().len(), 2);

        // returned items drop out of the active views
        let item = mine[1].item_id;
        engine::return_item(&db, item, staff).await.expect("return");
        assert_eq!(all_active_items(&db).await.unwrap().len(), 1);
    }
}
