//! Todo Backend
//!
//! Layered architecture:
//! - domain: Core entities and business rules
//! - repository: Data access abstractions and implementations
//! - commands: Mutation actions and the invoke surface
//! - session / config / page_cache: request identity, settings, page revalidation

use std::sync::Arc;

pub mod commands;
pub mod config;
pub mod domain;
pub mod page_cache;
pub mod repository;
pub mod session;

use config::ServerConfig;
use domain::DomainResult;
use page_cache::PageCache;
use repository::{init_db, DbState, ItemRepository, ItemStore};

/// Application state shared across requests
pub struct AppState {
    pub config: ServerConfig,
    pub item_repo: Arc<dyn ItemStore>,
    pub pages: PageCache,
}

impl AppState {
    pub fn new(config: ServerConfig, item_repo: Arc<dyn ItemStore>) -> Self {
        Self {
            config,
            item_repo,
            pages: PageCache::new(),
        }
    }

    /// Open the configured database and wire the SQLite store.
    pub async fn open(config: ServerConfig) -> DomainResult<Self> {
        let db_state: DbState = init_db(&config.db_path).await?;
        log::info!(
            "Server state ready (db={}, require_auth={})",
            db_state.path().display(),
            config.require_auth
        );
        let repo = ItemRepository::new(db_state.conn.clone());
        Ok(Self::new(config, Arc::new(repo)))
    }
}
