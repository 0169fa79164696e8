//! Per-owner cache of the rendered list page
//!
//! Mutations call `revalidate` so the next full page load re-reads the store.

use std::collections::HashMap;
use std::future::Future;
use tokio::sync::Mutex;

use crate::domain::{DomainResult, Item, OwnerId};

#[derive(Default)]
struct CachedPage {
    version: u64,
    items: Option<Vec<Item>>,
}

#[derive(Default)]
pub struct PageCache {
    pages: Mutex<HashMap<Option<OwnerId>, CachedPage>>,
}

impl PageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached page for `owner`, loading it when missing or stale.
    ///
    /// A load that races with a `revalidate` is returned to its caller but not
    /// cached.
    pub async fn get_or_load<F, Fut>(&self, owner: Option<&OwnerId>, load: F) -> DomainResult<Vec<Item>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = DomainResult<Vec<Item>>>,
    {
        let key = owner.cloned();
        let version = {
            let pages = self.pages.lock().await;
            match pages.get(&key) {
                Some(CachedPage { items: Some(items), .. }) => return Ok(items.clone()),
                Some(page) => page.version,
                None => 0,
            }
        };

        let items = load().await?;

        let mut pages = self.pages.lock().await;
        let page = pages.entry(key).or_default();
        if page.version == version {
            page.items = Some(items.clone());
        } else {
            log::debug!("Page for {:?} changed while loading, not caching", owner);
        }
        Ok(items)
    }

    /// Drop the cached page for `owner` and bump its version.
    pub async fn revalidate(&self, owner: Option<&OwnerId>) {
        let mut pages = self.pages.lock().await;
        let page = pages.entry(owner.cloned()).or_default();
        page.version += 1;
        page.items = None;
    }

    pub async fn version(&self, owner: Option<&OwnerId>) -> u64 {
        let pages = self.pages.lock().await;
        pages.get(&owner.cloned()).map(|p| p.version).unwrap_or(0)
    }
}
