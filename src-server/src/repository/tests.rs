//! Repository Integration Tests
//!
//! Tests for ItemRepository with in-memory SQLite database.

#[cfg(test)]
mod tests {
    use crate::domain::{ItemPatch, ItemStatus, NewItem, OwnerId};
    use crate::repository::{init_db, ItemRepository, Repository, SortKey, IN_MEMORY};
    use chrono::{Duration, Utc};
    use std::path::Path;

    async fn setup_test_db() -> ItemRepository {
        // Use in-memory database for tests
        let db_state = init_db(Path::new(IN_MEMORY)).await.expect("Failed to init test DB");
        ItemRepository::new(db_state.conn.clone())
    }

    fn alice() -> OwnerId {
        OwnerId::new("alice")
    }

    fn bob() -> OwnerId {
        OwnerId::new("bob")
    }

    #[tokio::test]
    async fn test_create_item() {
        let repo = setup_test_db().await;

        let created = repo
            .create(&NewItem::pending("Test item".to_string(), Some(alice())))
            .await
            .expect("Failed to create");

        assert!(created.id > 0);
        assert_eq!(created.title, "Test item");
        assert_eq!(created.status, ItemStatus::Pending);
        assert_eq!(created.expired_at, None);
        assert_eq!(created.owner_id, Some(alice()));
        assert_eq!(created.created_at, created.updated_at);
    }

    #[tokio::test]
    async fn test_find_is_owner_scoped() {
        let repo = setup_test_db().await;

        let created = repo.create(&NewItem::pending("Find me".to_string(), Some(alice()))).await.unwrap();

        let found = repo.find_where(created.id, Some(&alice())).await.expect("Find failed");
        assert_eq!(found.map(|i| i.title), Some("Find me".to_string()));

        assert!(repo.find_where(created.id, Some(&bob())).await.unwrap().is_none());
        assert!(repo.find_where(created.id, None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_page_order() {
        let repo = setup_test_db().await;

        repo.create(&NewItem::pending("bread".to_string(), Some(alice()))).await.unwrap();
        let apples = repo.create(&NewItem::pending("apples".to_string(), Some(alice()))).await.unwrap();
        repo.create(&NewItem::pending("cheese".to_string(), Some(alice()))).await.unwrap();
        repo.create(&NewItem::pending("not mine".to_string(), Some(bob()))).await.unwrap();

        repo.update_where(apples.id, Some(&alice()), &ItemPatch::status(ItemStatus::Done, Utc::now(), Duration::hours(24)).unwrap())
            .await
            .unwrap();

        let titles: Vec<String> = repo
            .list(Some(&alice()), &SortKey::PAGE)
            .await
            .expect("List failed")
            .into_iter()
            .map(|i| i.title)
            .collect();
        assert_eq!(titles, vec!["bread", "cheese", "apples"]);

        assert_eq!(repo.list_all(&[]).await.unwrap().len(), 4);
        assert!(repo.list(None, &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_where() {
        let repo = setup_test_db().await;

        let created = repo.create(&NewItem::pending("Original".to_string(), Some(alice()))).await.unwrap();

        let updated = repo
            .update_where(created.id, Some(&alice()), &ItemPatch::title("Updated".to_string()))
            .await
            .expect("Update failed")
            .expect("row should match");
        assert_eq!(updated.title, "Updated");
        assert_eq!(updated.status, ItemStatus::Pending);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_update_where_other_owner_matches_nothing() {
        let repo = setup_test_db().await;

        let created = repo.create(&NewItem::pending("Alice's".to_string(), Some(alice()))).await.unwrap();

        let result = repo
            .update_where(created.id, Some(&bob()), &ItemPatch::title("hijacked".to_string()))
            .await
            .unwrap();
        assert!(result.is_none());

        let still = repo.find_where(created.id, Some(&alice())).await.unwrap().unwrap();
        assert_eq!(still.title, "Alice's");
    }

    #[tokio::test]
    async fn test_expiry_column_patch() {
        let repo = setup_test_db().await;
        let created = repo.create(&NewItem::pending("milk".to_string(), None)).await.unwrap();

        let now = Utc::now();
        let pending = repo
            .update_where(created.id, None, &ItemPatch::status(ItemStatus::Pending, now, Duration::hours(24)).unwrap())
            .await
            .unwrap()
            .unwrap();
        let deadline = pending.expired_at.expect("deadline stamped");
        assert_eq!(deadline.timestamp_millis(), (now + Duration::hours(24)).timestamp_millis());

        let done = repo
            .update_where(created.id, None, &ItemPatch::status(ItemStatus::Done, Utc::now(), Duration::hours(24)).unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(done.expired_at, Some(deadline));

        let cleared = repo
            .update_where(
                created.id,
                None,
                &ItemPatch {
                    expired_at: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cleared.expired_at, None);
    }

    #[tokio::test]
    async fn test_empty_patch_rejected() {
        let repo = setup_test_db().await;
        let created = repo.create(&NewItem::pending("milk".to_string(), None)).await.unwrap();
        assert!(repo.update_where(created.id, None, &ItemPatch::default()).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_where() {
        let repo = setup_test_db().await;

        let created = repo.create(&NewItem::pending("To delete".to_string(), Some(alice()))).await.unwrap();

        assert!(repo.delete_where(created.id, Some(&bob())).await.unwrap().is_none());

        let deleted = repo.delete_where(created.id, Some(&alice())).await.expect("Delete failed");
        assert_eq!(deleted.map(|i| i.id), Some(created.id));

        let found = repo.find_where(created.id, Some(&alice())).await.expect("Find failed");
        assert!(found.is_none());
        assert!(repo.delete_where(created.id, Some(&alice())).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_blank_title_violates_schema() {
        let repo = setup_test_db().await;
        assert!(repo.create(&NewItem::pending("   ".to_string(), None)).await.is_err());
    }
}
