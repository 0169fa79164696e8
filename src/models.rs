//! Frontend Models
//!
//! Data structures matching backend entities, plus the client-only pieces
//! (temporary ids, transport failures).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Id handed out locally for an item the store has not saved yet.
///
/// Serializes as `{"temp": n}`, so it can never be mistaken for a store id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TempId {
    pub temp: u64,
}

/// Item identifier as the client sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    /// Assigned by the store
    Stored(i64),
    /// Local placeholder until the create call resolves
    Temp(TempId),
}

impl ItemId {
    pub fn stored(&self) -> Option<i64> {
        match self {
            ItemId::Stored(id) => Some(*id),
            ItemId::Temp(_) => None,
        }
    }

    pub fn temp(&self) -> Option<TempId> {
        match self {
            ItemId::Stored(_) => None,
            ItemId::Temp(t) => Some(*t),
        }
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Stored(id) => write!(f, "#{}", id),
            ItemId::Temp(t) => write!(f, "~{}", t.temp),
        }
    }
}

/// Item status (matches backend)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ItemStatus {
    #[default]
    Pending,
    Done,
}

impl ItemStatus {
    pub fn toggled(self) -> Self {
        match self {
            ItemStatus::Pending => ItemStatus::Done,
            ItemStatus::Done => ItemStatus::Pending,
        }
    }
}

/// Item data structure (matches backend)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    pub status: ItemStatus,
    pub expired_at: Option<DateTime<Utc>>,
    pub owner_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Locally materialized item for an optimistic add
    pub fn draft(id: TempId, title: String, now: DateTime<Utc>) -> Self {
        Self {
            id: ItemId::Temp(id),
            title,
            status: ItemStatus::Pending,
            expired_at: None,
            owner_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_done(&self) -> bool {
        self.status == ItemStatus::Done
    }
}

/// Failure category reported by the server, plus `Transport` for replies the
/// client could not decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    ValidationError,
    AuthorizationError,
    NotFoundOrForbidden,
    StoreError,
    Transport,
}

/// Reply of every server action
#[derive(Debug, Clone, PartialEq)]
pub enum ActionResult<T> {
    Ok { item: T },
    Failed { error_kind: ErrorKind, message: String },
}

impl<T> ActionResult<T> {
    pub fn transport(message: impl Into<String>) -> Self {
        ActionResult::Failed {
            error_kind: ErrorKind::Transport,
            message: message.into(),
        }
    }

    pub fn into_result(self) -> Result<T, (ErrorKind, String)> {
        match self {
            ActionResult::Ok { item } => Ok(item),
            ActionResult::Failed { error_kind, message } => Err((error_kind, message)),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for ActionResult<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Wire<T> {
            ok: bool,
            item: Option<T>,
            error_kind: Option<ErrorKind>,
            message: Option<String>,
        }

        let wire = Wire::<T>::deserialize(deserializer)?;
        match (wire.ok, wire.item) {
            (true, Some(item)) => Ok(ActionResult::Ok { item }),
            (true, None) => Err(serde::de::Error::missing_field("item")),
            (false, _) => Ok(ActionResult::Failed {
                error_kind: wire.error_kind.ok_or_else(|| serde::de::Error::missing_field("errorKind"))?,
                message: wire.message.unwrap_or_default(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_ids_do_not_collide() {
        let stored: ItemId = serde_json::from_value(json!(5)).unwrap();
        let temp: ItemId = serde_json::from_value(json!({"temp": 5})).unwrap();
        assert_eq!(stored, ItemId::Stored(5));
        assert_eq!(temp, ItemId::Temp(TempId { temp: 5 }));
        assert_ne!(stored, temp);
        assert_eq!(stored.to_string(), "#5");
        assert_eq!(temp.to_string(), "~5");
    }

    #[test]
    fn test_decode_server_item() {
        let item: Item = serde_json::from_value(json!({
            "id": 3,
            "title": "milk",
            "status": "PENDING",
            "expiredAt": null,
            "ownerId": "alice",
            "createdAt": "2026-01-01T00:00:00Z",
            "updatedAt": "2026-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(item.id, ItemId::Stored(3));
        assert_eq!(item.status, ItemStatus::Pending);
        assert_eq!(item.owner_id.as_deref(), Some("alice"));
    }

    #[test]
    fn test_decode_action_result() {
        let ok: ActionResult<u8> = serde_json::from_value(json!({"ok": true, "item": 1})).unwrap();
        assert_eq!(ok, ActionResult::Ok { item: 1 });

        let failed: ActionResult<u8> =
            serde_json::from_value(json!({"ok": false, "errorKind": "StoreError", "message": "boom"})).unwrap();
        assert_eq!(failed.into_result(), Err((ErrorKind::StoreError, "boom".to_string())));

        assert!(serde_json::from_value::<ActionResult<u8>>(json!({"ok": true})).is_err());
    }
}
