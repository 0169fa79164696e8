//! List View
//!
//! Display projection of the optimistic collection: live search filter plus
//! the page ordering.

use std::cmp::Ordering;

use crate::models::Item;

/// Items whose title contains `query` (case-insensitive), ordered by status,
/// then title, then newest first. An all-blank query matches everything.
pub fn visible(items: &[Item], query: &str) -> Vec<Item> {
    let needle = query.to_lowercase();
    let mut shown: Vec<Item> = items
        .iter()
        .filter(|item| item.title.to_lowercase().contains(&needle))
        .cloned()
        .collect();
    shown.sort_by(display_order);
    shown
}

fn display_order(a: &Item, b: &Item) -> Ordering {
    a.status
        .cmp(&b.status)
        .then_with(|| a.title.cmp(&b.title))
        .then_with(|| b.created_at.cmp(&a.created_at))
}
