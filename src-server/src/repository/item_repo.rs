//! Item Repository
//!
//! SQLite-backed implementation of the owner-scoped item store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use crate::domain::{DomainError, DomainResult, Item, ItemPatch, ItemStatus, NewItem, OwnerId};
use super::db::SharedConnection;
use super::traits::{Repository, SortKey};

const ITEM_COLUMNS: &str = "id, title, status, expired_at, owner_id, created_at, updated_at";

/// SQLite implementation of Item repository
pub struct ItemRepository {
    conn: SharedConnection,
}

impl ItemRepository {
    pub fn new(conn: SharedConnection) -> Self {
        Self { conn }
    }

    async fn query_list(&self, owner: Option<Option<&OwnerId>>, order: &[SortKey]) -> DomainResult<Vec<Item>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or(DomainError::Internal("Database not initialized".to_string()))?;

        let mut sql = format!("SELECT {} FROM items", ITEM_COLUMNS);
        if owner.is_some() {
            sql.push_str(" WHERE owner_id IS ?1");
        }
        sql.push_str(&order_clause(order));

        let mut stmt = conn.prepare(&sql)?;
        let mut rows = match owner {
            Some(owner) => stmt.query(params![owner.map(OwnerId::as_str)])?,
            None => stmt.query([])?,
        };

        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(row_to_item(row)?);
        }
        Ok(items)
    }
}

#[async_trait]
impl Repository<Item> for ItemRepository {
    type Draft = NewItem;
    type Patch = ItemPatch;

    async fn create(&self, draft: &NewItem) -> DomainResult<Item> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or(DomainError::Internal("Database not initialized".to_string()))?;

        let now = Utc::now().timestamp_millis();
        let item = conn.query_row(
            &format!(
                "INSERT INTO items (title, status, expired_at, owner_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                 RETURNING {}",
                ITEM_COLUMNS
            ),
            params![
                draft.title,
                draft.status.as_str(),
                draft.expired_at.map(|t| t.timestamp_millis()),
                draft.owner_id.as_ref().map(OwnerId::as_str),
                now,
            ],
            |row| Ok(row_to_item(row)),
        )??;

        Ok(item)
    }

    async fn find_where(&self, id: i64, owner: Option<&OwnerId>) -> DomainResult<Option<Item>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or(DomainError::Internal("Database not initialized".to_string()))?;

        conn.query_row(
            &format!("SELECT {} FROM items WHERE id = ?1 AND owner_id IS ?2", ITEM_COLUMNS),
            params![id, owner.map(OwnerId::as_str)],
            |row| Ok(row_to_item(row)),
        )
        .optional()?
        .transpose()
    }

    async fn list(&self, owner: Option<&OwnerId>, order: &[SortKey]) -> DomainResult<Vec<Item>> {
        self.query_list(Some(owner), order).await
    }

    async fn list_all(&self, order: &[SortKey]) -> DomainResult<Vec<Item>> {
        self.query_list(None, order).await
    }

    async fn update_where(&self, id: i64, owner: Option<&OwnerId>, patch: &ItemPatch) -> DomainResult<Option<Item>> {
        if patch.is_empty() {
            return Err(DomainError::InvalidInput("Nothing to update".to_string()));
        }

        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or(DomainError::Internal("Database not initialized".to_string()))?;

        let (set_expiry, expired_at) = match patch.expired_at {
            Some(deadline) => (true, deadline.map(|t| t.timestamp_millis())),
            None => (false, None),
        };

        conn.query_row(
            &format!(
                "UPDATE items SET
                    title = COALESCE(?1, title),
                    status = COALESCE(?2, status),
                    expired_at = CASE WHEN ?3 THEN ?4 ELSE expired_at END,
                    updated_at = ?5
                 WHERE id = ?6 AND owner_id IS ?7
                 RETURNING {}",
                ITEM_COLUMNS
            ),
            params![
                patch.title,
                patch.status.map(|s| s.as_str()),
                set_expiry,
                expired_at,
                Utc::now().timestamp_millis(),
                id,
                owner.map(OwnerId::as_str),
            ],
            |row| Ok(row_to_item(row)),
        )
        .optional()?
        .transpose()
    }

    async fn delete_where(&self, id: i64, owner: Option<&OwnerId>) -> DomainResult<Option<Item>> {
        let guard = self.conn.lock().await;
        let conn = guard.as_ref().ok_or(DomainError::Internal("Database not initialized".to_string()))?;

        conn.query_row(
            &format!("DELETE FROM items WHERE id = ?1 AND owner_id IS ?2 RETURNING {}", ITEM_COLUMNS),
            params![id, owner.map(OwnerId::as_str)],
            |row| Ok(row_to_item(row)),
        )
        .optional()?
        .transpose()
    }
}

fn order_clause(order: &[SortKey]) -> String {
    if order.is_empty() {
        return " ORDER BY id ASC".to_string();
    }
    let keys: Vec<&str> = order.iter().map(SortKey::as_sql).collect();
    format!(" ORDER BY {}, id ASC", keys.join(", "))
}

fn millis_to_datetime(ms: i64) -> DomainResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| DomainError::Internal(format!("Timestamp out of range: {}", ms)))
}

/// Convert a database row to Item
fn row_to_item(row: &Row<'_>) -> DomainResult<Item> {
    let status: String = row.get(2)?;
    Ok(Item {
        id: row.get(0)?,
        title: row.get(1)?,
        status: ItemStatus::parse(&status)?,
        expired_at: row.get::<_, Option<i64>>(3)?.map(millis_to_datetime).transpose()?,
        owner_id: row.get::<_, Option<String>>(4)?.map(OwnerId::new),
        created_at: millis_to_datetime(row.get(5)?)?,
        updated_at: millis_to_datetime(row.get(6)?)?,
    })
}
