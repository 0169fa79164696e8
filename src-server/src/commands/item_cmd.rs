//! Item Mutation Actions
//!
//! Each action resolves the caller, validates its input, performs exactly one
//! owner-scoped store operation and reports an `ActionResult`.

use chrono::Utc;

use crate::domain::{normalize_title, Item, ItemPatch, ItemStatus, NewItem, OwnerId};
use crate::repository::{Repository, SortKey};
use crate::session::SessionProvider;
use crate::AppState;
use super::result::{ActionError, ActionResult};

/// Caller's scope. Fails closed when auth is required and nobody is signed in.
fn resolve_owner(state: &AppState, session: &dyn SessionProvider) -> Result<Option<OwnerId>, ActionError> {
    match session.current_owner_id() {
        Some(owner) => Ok(Some(owner)),
        None if state.config.require_auth => Err(ActionError::Unauthorized),
        None => Ok(None),
    }
}

fn finish<T>(action: &str, result: Result<T, ActionError>) -> ActionResult<T> {
    match &result {
        Ok(_) => log::debug!("{} ok", action),
        Err(ActionError::Store(e)) => log::error!("{} failed: {}", action, e),
        Err(e) => log::warn!("{} rejected: {}", action, e),
    }
    result.into()
}

/// Create a new pending item owned by the caller
pub async fn add_item(state: &AppState, session: &dyn SessionProvider, title: &str) -> ActionResult<Item> {
    finish("add_item", try_add_item(state, session, title).await)
}

async fn try_add_item(state: &AppState, session: &dyn SessionProvider, title: &str) -> Result<Item, ActionError> {
    let owner = resolve_owner(state, session)?;
    let title = normalize_title(title)?;

    let item = state.item_repo.create(&NewItem::pending(title, owner.clone())).await?;
    state.pages.revalidate(owner.as_ref()).await;
    Ok(item)
}

/// Set completion status. Back to `PENDING` restarts the expiry window.
pub async fn update_item_status(
    state: &AppState,
    session: &dyn SessionProvider,
    id: i64,
    status: ItemStatus,
) -> ActionResult<Item> {
    finish("update_item_status", try_update_item_status(state, session, id, status).await)
}

async fn try_update_item_status(
    state: &AppState,
    session: &dyn SessionProvider,
    id: i64,
    status: ItemStatus,
) -> Result<Item, ActionError> {
    let owner = resolve_owner(state, session)?;
    let patch = ItemPatch::status(status, Utc::now(), state.config.expiry_window)?;

    let item = state
        .item_repo
        .update_where(id, owner.as_ref(), &patch)
        .await?
        .ok_or(ActionError::NotFoundOrForbidden)?;
    state.pages.revalidate(owner.as_ref()).await;
    Ok(item)
}

/// Rename an item
pub async fn update_item_title(
    state: &AppState,
    session: &dyn SessionProvider,
    id: i64,
    title: &str,
) -> ActionResult<Item> {
    finish("update_item_title", try_update_item_title(state, session, id, title).await)
}

async fn try_update_item_title(
    state: &AppState,
    session: &dyn SessionProvider,
    id: i64,
    title: &str,
) -> Result<Item, ActionError> {
    let owner = resolve_owner(state, session)?;
    let title = normalize_title(title)?;

    let item = state
        .item_repo
        .update_where(id, owner.as_ref(), &ItemPatch::title(title))
        .await?
        .ok_or(ActionError::NotFoundOrForbidden)?;
    state.pages.revalidate(owner.as_ref()).await;
    Ok(item)
}

/// Delete an item, returning it as it was before removal
pub async fn delete_item(state: &AppState, session: &dyn SessionProvider, id: i64) -> ActionResult<Item> {
    finish("delete_item", try_delete_item(state, session, id).await)
}

async fn try_delete_item(state: &AppState, session: &dyn SessionProvider, id: i64) -> Result<Item, ActionError> {
    let owner = resolve_owner(state, session)?;

    let item = state
        .item_repo
        .delete_where(id, owner.as_ref())
        .await?
        .ok_or(ActionError::NotFoundOrForbidden)?;
    state.pages.revalidate(owner.as_ref()).await;
    Ok(item)
}

/// The caller's list as a full page load sees it
pub async fn list_items(state: &AppState, session: &dyn SessionProvider) -> ActionResult<Vec<Item>> {
    finish("list_items", try_list_items(state, session).await)
}

async fn try_list_items(state: &AppState, session: &dyn SessionProvider) -> Result<Vec<Item>, ActionError> {
    let owner = resolve_owner(state, session)?;
    let repo = &state.item_repo;
    let items = state
        .pages
        .get_or_load(owner.as_ref(), || repo.list(owner.as_ref(), &SortKey::PAGE))
        .await?;
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::ErrorKind;
    use crate::config::ServerConfig;
    use crate::domain::{DomainError, DomainResult};
    use crate::session::Session;
    use async_trait::async_trait;
    use chrono::Duration;
    use std::sync::Arc;

    async fn setup() -> AppState {
        AppState::open(ServerConfig::in_memory()).await.expect("state")
    }

    fn alice() -> Session {
        Session::for_owner(OwnerId::new("alice"))
    }

    fn bob() -> Session {
        Session::for_owner(OwnerId::new("bob"))
    }

    fn assert_failed<T: std::fmt::Debug>(result: &ActionResult<T>, kind: ErrorKind) {
        assert_eq!(result.error_kind(), Some(kind), "unexpected result {:?}", result);
    }

    #[tokio::test]
    async fn test_end_to_end_lifecycle() {
        let state = setup().await;
        let session = alice();

        let added = add_item(&state, &session, "milk").await;
        let item = added.item().expect("added").clone();
        assert_eq!(item.title, "milk");
        assert_eq!(item.status, ItemStatus::Pending);
        assert_eq!(item.expired_at, None);

        let done = update_item_status(&state, &session, item.id, ItemStatus::Done).await;
        assert_eq!(done.item().unwrap().status, ItemStatus::Done);
        assert_eq!(done.item().unwrap().expired_at, None);

        let before = Utc::now();
        let pending = update_item_status(&state, &session, item.id, ItemStatus::Pending).await;
        let deadline = pending.item().unwrap().expired_at.expect("stamped");
        let after = Utc::now();
        assert!(deadline >= before + Duration::hours(24) - Duration::milliseconds(1));
        assert!(deadline <= after + Duration::hours(24));

        assert!(delete_item(&state, &session, item.id).await.is_ok());
        assert_eq!(list_items(&state, &session).await.item().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_done_keeps_previous_deadline() {
        let state = setup().await;
        let session = alice();
        let item = add_item(&state, &session, "eggs").await.item().unwrap().clone();

        let stamped = update_item_status(&state, &session, item.id, ItemStatus::Pending)
            .await
            .item()
            .unwrap()
            .expired_at;
        assert!(stamped.is_some());

        let done = update_item_status(&state, &session, item.id, ItemStatus::Done).await;
        assert_eq!(done.item().unwrap().expired_at, stamped);
    }

    #[tokio::test]
    async fn test_ownership_isolation() {
        let state = setup().await;
        let a_item = add_item(&state, &alice(), "alice's").await.item().unwrap().clone();
        add_item(&state, &bob(), "bob's").await;

        assert_failed(&update_item_title(&state, &bob(), a_item.id, "mine now").await, ErrorKind::NotFoundOrForbidden);
        assert_failed(&update_item_status(&state, &bob(), a_item.id, ItemStatus::Done).await, ErrorKind::NotFoundOrForbidden);
        assert_failed(&delete_item(&state, &bob(), a_item.id).await, ErrorKind::NotFoundOrForbidden);

        let alice_items = list_items(&state, &alice()).await.item().unwrap().clone();
        assert_eq!(alice_items.len(), 1);
        assert_eq!(alice_items[0].title, "alice's");
        assert_eq!(alice_items[0].status, ItemStatus::Pending);
    }

    #[tokio::test]
    async fn test_missing_item_is_indistinguishable() {
        let state = setup().await;
        let missing = update_item_title(&state, &alice(), 9999, "x").await;
        assert_failed(&missing, ErrorKind::NotFoundOrForbidden);
    }

    #[tokio::test]
    async fn test_empty_titles_rejected_without_store_write() {
        let state = setup().await;
        let session = alice();

        assert_failed(&add_item(&state, &session, "").await, ErrorKind::ValidationError);
        assert_failed(&add_item(&state, &session, "   ").await, ErrorKind::ValidationError);

        let item = add_item(&state, &session, "milk").await.item().unwrap().clone();
        assert_failed(&update_item_title(&state, &session, item.id, "").await, ErrorKind::ValidationError);

        let all = state.item_repo.list_all(&[]).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "milk");
        assert_eq!(state.pages.version(Some(&OwnerId::new("alice"))).await, 1);
    }

    #[tokio::test]
    async fn test_titles_are_trimmed() {
        let state = setup().await;
        let item = add_item(&state, &alice(), "  bread  ").await.item().unwrap().clone();
        assert_eq!(item.title, "bread");

        let renamed = update_item_title(&state, &alice(), item.id, " rye bread ").await;
        assert_eq!(renamed.item().unwrap().title, "rye bread");
    }

    #[tokio::test]
    async fn test_fails_closed_without_identity() {
        let state = setup().await;
        let anonymous = Session::anonymous();

        assert_failed(&add_item(&state, &anonymous, "milk").await, ErrorKind::AuthorizationError);
        assert_failed(&list_items(&state, &anonymous).await, ErrorKind::AuthorizationError);
        assert!(state.item_repo.list_all(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_profile_uses_anonymous_scope() {
        let config = ServerConfig {
            require_auth: false,
            ..ServerConfig::in_memory()
        };
        let state = AppState::open(config).await.unwrap();
        let anonymous = Session::anonymous();

        let item = add_item(&state, &anonymous, "milk").await.item().unwrap().clone();
        assert_eq!(item.owner_id, None);

        // A signed-in caller still cannot touch the shared list
        assert_failed(&delete_item(&state, &alice(), item.id).await, ErrorKind::NotFoundOrForbidden);
        assert!(delete_item(&state, &anonymous, item.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_unrepresentable_deadline_fails_without_write() {
        let config = ServerConfig {
            expiry_window: Duration::seconds(3_600_000_000_000_000),
            ..ServerConfig::in_memory()
        };
        let state = AppState::open(config).await.unwrap();
        let session = alice();
        let item = add_item(&state, &session, "milk").await.item().unwrap().clone();
        update_item_status(&state, &session, item.id, ItemStatus::Done).await;

        let reopened = update_item_status(&state, &session, item.id, ItemStatus::Pending).await;
        assert_failed(&reopened, ErrorKind::StoreError);
        let stored = state.item_repo.find_where(item.id, Some(&OwnerId::new("alice"))).await.unwrap().unwrap();
        assert_eq!(stored.status, ItemStatus::Done);
    }

    #[tokio::test]
    async fn test_mutations_revalidate_page() {
        let state = setup().await;
        let session = alice();

        assert!(list_items(&state, &session).await.item().unwrap().is_empty());
        let item = add_item(&state, &session, "milk").await.item().unwrap().clone();

        let page = list_items(&state, &session).await.item().unwrap().clone();
        assert_eq!(page, vec![item.clone()]);

        update_item_title(&state, &session, item.id, "oat milk").await;
        let page = list_items(&state, &session).await.item().unwrap().clone();
        assert_eq!(page[0].title, "oat milk");
    }

    struct BrokenStore;

    #[async_trait]
    impl Repository<Item> for BrokenStore {
        type Draft = NewItem;
        type Patch = ItemPatch;

        async fn create(&self, _draft: &NewItem) -> DomainResult<Item> {
            Err(DomainError::Internal("connection reset".to_string()))
        }

        async fn find_where(&self, _id: i64, _owner: Option<&OwnerId>) -> DomainResult<Option<Item>> {
            Err(DomainError::Internal("connection reset".to_string()))
        }

        async fn list(&self, _owner: Option<&OwnerId>, _order: &[SortKey]) -> DomainResult<Vec<Item>> {
            Err(DomainError::Internal("connection reset".to_string()))
        }

        async fn list_all(&self, _order: &[SortKey]) -> DomainResult<Vec<Item>> {
            Err(DomainError::Internal("connection reset".to_string()))
        }

        async fn update_where(&self, _id: i64, _owner: Option<&OwnerId>, _patch: &ItemPatch) -> DomainResult<Option<Item>> {
            Err(DomainError::Internal("connection reset".to_string()))
        }

        async fn delete_where(&self, _id: i64, _owner: Option<&OwnerId>) -> DomainResult<Option<Item>> {
            Err(DomainError::Internal("connection reset".to_string()))
        }
    }

    #[tokio::test]
    async fn test_store_failures_become_generic_results() {
        let state = AppState::new(ServerConfig::in_memory(), Arc::new(BrokenStore));
        let session = alice();

        let results = vec![
            add_item(&state, &session, "milk").await.error_kind(),
            update_item_status(&state, &session, 1, ItemStatus::Done).await.error_kind(),
            update_item_title(&state, &session, 1, "x").await.error_kind(),
            delete_item(&state, &session, 1).await.error_kind(),
            list_items(&state, &session).await.error_kind(),
        ];
        assert!(results.iter().all(|k| *k == Some(ErrorKind::StoreError)));

        match add_item(&state, &session, "milk").await {
            ActionResult::Failed { message, .. } => assert!(!message.contains("connection reset")),
            ActionResult::Ok { .. } => panic!("expected failure"),
        }
    }
}
