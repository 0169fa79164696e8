//! Repository Layer - Core Traits
//!
//! Defines the abstract interfaces for data access.
//! Every write is a single statement scoped by `(id, owner)`, so callers never
//! need a transaction spanning more than one call.

use async_trait::async_trait;
use crate::domain::{DomainResult, Entity, Item, ItemPatch, NewItem, OwnerId};

/// Ordering applied by `list`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// `PENDING` before `DONE`
    StatusAsc,
    TitleAsc,
    CreatedDesc,
}

impl SortKey {
    /// Ordering used for the list page.
    pub const PAGE: [SortKey; 3] = [SortKey::StatusAsc, SortKey::TitleAsc, SortKey::CreatedDesc];

    pub(super) fn as_sql(&self) -> &'static str {
        match self {
            SortKey::StatusAsc => "CASE status WHEN 'PENDING' THEN 0 ELSE 1 END ASC",
            SortKey::TitleAsc => "title ASC",
            SortKey::CreatedDesc => "created_at DESC",
        }
    }
}

/// Owner-scoped CRUD contract
///
/// Generic over any Entity type.
/// All operations are async to support various backends.
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// Fields required to create an entity
    type Draft: Send + Sync;
    /// Partial update
    type Patch: Send + Sync;

    /// Create a new entity, returning it with its store-assigned id
    async fn create(&self, draft: &Self::Draft) -> DomainResult<T>;

    /// Find an entity by id within an owner's scope
    async fn find_where(&self, id: T::Id, owner: Option<&OwnerId>) -> DomainResult<Option<T>>;

    /// List entities of one owner (`None` = the anonymous scope)
    async fn list(&self, owner: Option<&OwnerId>, order: &[SortKey]) -> DomainResult<Vec<T>>;

    /// List every entity regardless of owner
    async fn list_all(&self, order: &[SortKey]) -> DomainResult<Vec<T>>;

    /// Patch the entity matching `(id, owner)`. `None` when no row matched.
    async fn update_where(&self, id: T::Id, owner: Option<&OwnerId>, patch: &Self::Patch) -> DomainResult<Option<T>>;

    /// Delete the entity matching `(id, owner)`, returning what was removed.
    async fn delete_where(&self, id: T::Id, owner: Option<&OwnerId>) -> DomainResult<Option<T>>;
}

/// The item store as consumed by the actions layer
pub trait ItemStore: Repository<Item, Draft = NewItem, Patch = ItemPatch> {}

impl<R> ItemStore for R where R: Repository<Item, Draft = NewItem, Patch = ItemPatch> {}
