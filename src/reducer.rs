//! Optimistic State Reducer
//!
//! Pure functions from a collection plus one intent to the speculative
//! collection. Nothing here touches I/O or fails.

use crate::models::{Item, ItemId, ItemStatus, TempId};

/// A proposed change to one item, not yet confirmed by the server
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Append a locally materialized item carrying a temporary id
    Add { item: Item },
    Delete { id: ItemId },
    SetStatus { id: ItemId, status: ItemStatus },
    SetTitle { id: ItemId, title: String },
}

impl Intent {
    /// Id of the item this intent touches
    pub fn target(&self) -> ItemId {
        match self {
            Intent::Add { item } => item.id,
            Intent::Delete { id } | Intent::SetStatus { id, .. } | Intent::SetTitle { id, .. } => *id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Intent::Add { .. } => "add",
            Intent::Delete { .. } => "delete",
            Intent::SetStatus { .. } => "set_status",
            Intent::SetTitle { .. } => "set_title",
        }
    }

    fn rekey(&mut self, temp: TempId, stored: i64) {
        let id = match self {
            Intent::Add { item } => &mut item.id,
            Intent::Delete { id } | Intent::SetStatus { id, .. } | Intent::SetTitle { id, .. } => id,
        };
        if *id == ItemId::Temp(temp) {
            *id = ItemId::Stored(stored);
        }
    }
}

/// Speculative collection after `intent`.
///
/// Intents whose target is absent leave the collection unchanged, as does an
/// `Add` whose id is already present.
pub fn apply(items: &[Item], intent: &Intent) -> Vec<Item> {
    let mut next = items.to_vec();
    match intent {
        Intent::Add { item } => {
            if !next.iter().any(|i| i.id == item.id) {
                next.push(Item {
                    status: ItemStatus::Pending,
                    ..item.clone()
                });
            }
        }
        Intent::Delete { id } => next.retain(|i| i.id != *id),
        Intent::SetStatus { id, status } => {
            if let Some(item) = next.iter_mut().find(|i| i.id == *id) {
                item.status = *status;
            }
        }
        Intent::SetTitle { id, title } => {
            if let Some(item) = next.iter_mut().find(|i| i.id == *id) {
                item.title = title.clone();
            }
        }
    }
    next
}

/// Fold `intents` over `base` in order
pub fn apply_all<'a>(base: &[Item], intents: impl IntoIterator<Item = &'a Intent>) -> Vec<Item> {
    intents.into_iter().fold(base.to_vec(), |items, intent| apply(&items, intent))
}

/// Replace a temporary id with the id the store assigned
pub fn rekey(items: &mut [Item], temp: TempId, stored: i64) {
    for item in items.iter_mut().filter(|i| i.id == ItemId::Temp(temp)) {
        item.id = ItemId::Stored(stored);
    }
}

/// Same as [`rekey`] for queued intents
pub fn rekey_intents<'a>(intents: impl IntoIterator<Item = &'a mut Intent>, temp: TempId, stored: i64) {
    for intent in intents {
        intent.rekey(temp, stored);
    }
}
