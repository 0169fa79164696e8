//! Item Entity
//!
//! Represents a single todo/shopping list entry owned by one caller.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{DomainError, DomainResult, Entity};
use super::owner::OwnerId;

/// Completion state of an item.
///
/// Declaration order is the list order: pending items sort before done ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ItemStatus {
    #[default]
    Pending,
    Done,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "PENDING",
            ItemStatus::Done => "DONE",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "PENDING" => Ok(ItemStatus::Pending),
            "DONE" => Ok(ItemStatus::Done),
            other => Err(DomainError::InvalidInput(format!("unknown status '{}'", other))),
        }
    }
}

/// A persisted list item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Store-assigned identifier
    pub id: i64,
    /// Trimmed, non-empty title
    pub title: String,
    pub status: ItemStatus,
    /// Soft-expiry deadline, stamped whenever the item goes back to `PENDING`
    pub expired_at: Option<DateTime<Utc>>,
    /// `None` only in deployments that do not require authentication
    pub owner_id: Option<OwnerId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Item {
    type Id = i64;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Fields needed to create an item. The store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub title: String,
    pub status: ItemStatus,
    pub expired_at: Option<DateTime<Utc>>,
    pub owner_id: Option<OwnerId>,
}

impl NewItem {
    /// A fresh pending item with no expiry, as created by `add_item`.
    pub fn pending(title: String, owner_id: Option<OwnerId>) -> Self {
        Self {
            title,
            status: ItemStatus::Pending,
            expired_at: None,
            owner_id,
        }
    }
}

/// Partial update applied by `update_where`. `None` leaves a column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemPatch {
    pub title: Option<String>,
    pub status: Option<ItemStatus>,
    /// `Some(None)` clears the deadline, `None` keeps it
    pub expired_at: Option<Option<DateTime<Utc>>>,
}

impl ItemPatch {
    pub fn title(title: String) -> Self {
        Self {
            title: Some(title),
            ..Default::default()
        }
    }

    /// Status change. Going back to `PENDING` stamps a fresh deadline,
    /// `DONE` keeps whatever deadline the item already had.
    pub fn status(status: ItemStatus, now: DateTime<Utc>, expiry_window: Duration) -> DomainResult<Self> {
        let expired_at = match status {
            ItemStatus::Pending => {
                let deadline = now.checked_add_signed(expiry_window).ok_or_else(|| {
                    DomainError::Internal(format!("Expiry window of {} is out of range", expiry_window))
                })?;
                Some(Some(deadline))
            }
            ItemStatus::Done => None,
        };
        Ok(Self {
            status: Some(status),
            expired_at,
            ..Default::default()
        })
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.status.is_none() && self.expired_at.is_none()
    }
}

/// Trim a user supplied title, rejecting blank input.
pub fn normalize_title(raw: &str) -> DomainResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DomainError::InvalidInput("Title cannot be empty".to_string()));
    }
    Ok(trimmed.to_string())
}
