use log::info;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::error;
use crate::constants::{POST_COLLECTION, USER_COLLECTION};
use crate::modules::document::{
    model::{filter_eq, Body, PageWindow, Sort, SortField, SortOrder},
    repository::DocumentStore,
    schema::DocumentEntity,
};
use crate::modules::post::{
    model::{into_draft, owner_of, CreatedPosts, DraftError, PageQuery},
    schema::PostEntity,
};

#[derive(Clone)]
pub struct PostService {
    store: Arc<dyn DocumentStore + Send + Sync>,
}

fn to_posts(documents: Vec<DocumentEntity>) -> Result<Vec<PostEntity>, error::SystemError> {
    documents.into_iter().map(PostEntity::try_from).collect()
}

impl PostService {
    pub fn with_dependencies(store: Arc<dyn DocumentStore + Send + Sync>) -> Self {
        info!("PostService initialized with dependencies");
        PostService { store }
    }

    pub async fn get_by_id(&self, id: &str) -> Result<PostEntity, error::Error> {
        let not_found = || error::Error::not_found("Post not found");

        let id = Uuid::parse_str(id).map_err(|_| not_found())?;
        let document = self
            .store
            .find_by_id(POST_COLLECTION, &id)
            .await
            .map_err(|e| e.collapse(not_found()))?
            .ok_or_else(not_found)?;

        PostEntity::try_from(document).map_err(|e| e.collapse(not_found()))
    }

    /// Posts of one user, newest first by creation time.
    pub async fn get_by_username(&self, username: &str) -> Result<Vec<PostEntity>, error::Error> {
        if username.trim().is_empty() {
            return Err(error::Error::not_found("Missing username."));
        }
        let not_found = || error::Error::not_found("Post not found");

        let newest_first = Sort::new(SortField::CreatedAt, SortOrder::Desc);
        let documents = self
            .store
            .find_many(POST_COLLECTION, &filter_eq("username", username), Some(newest_first))
            .await
            .map_err(|e| e.collapse(not_found()))?;

        let mut posts = to_posts(documents).map_err(|e| e.collapse(not_found()))?;
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    /// One page of public posts ordered by `updatedAt`.
    pub async fn get_page(
        &self,
        page: &str,
        query: &PageQuery,
    ) -> Result<Vec<PostEntity>, error::Error> {
        let page = page
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|p| *p >= 1)
            .ok_or_else(|| error::Error::not_found("Missing page number."))?;
        let not_found = || error::Error::not_found("Post not found");

        let documents = self
            .store
            .find_page(
                POST_COLLECTION,
                &filter_eq("public", true),
                Sort::new(SortField::UpdatedAt, query.order()),
                PageWindow::for_page(page, query.limit()),
            )
            .await
            .map_err(|e| e.collapse(not_found()))?;

        to_posts(documents).map_err(|e| e.collapse(not_found()))
    }

    async fn user_exists(&self, username: &str) -> Result<bool, error::SystemError> {
        let user = self.store.find_one(USER_COLLECTION, &filter_eq("username", username)).await?;
        Ok(user.is_some())
    }

    /// Creates one post from an object body or several from an array body.
    pub async fn create(
        &self,
        principal: &str,
        payload: Value,
    ) -> Result<CreatedPosts, error::Error> {
        let failed = || error::Error::creation_failure("Post failed to create.");

        match payload {
            Value::Array(items) => {
                let Some(first) = items.first() else {
                    return Err(error::Error::creation_failure(DraftError::Missing.message()));
                };
                if owner_of(first) != Some(principal) {
                    return Err(error::Error::ownership_mismatch(
                        "You can only create post for yourself.",
                    ));
                }
                if !self.user_exists(principal).await.map_err(|e| e.collapse(failed()))? {
                    return Err(error::Error::creation_failure("Username not found"));
                }

                let mut drafts: Vec<Body> = Vec::with_capacity(items.len());
                for item in items {
                    if owner_of(&item) != Some(principal) {
                        return Err(error::Error::creation_failure("Username should be the same"));
                    }
                    let draft =
                        into_draft(item).map_err(|e| error::Error::creation_failure(e.message()))?;
                    drafts.push(draft);
                }

                let documents = self
                    .store
                    .insert_many(POST_COLLECTION, &drafts)
                    .await
                    .map_err(|e| e.collapse(failed()))?;
                let posts = to_posts(documents).map_err(|e| e.collapse(failed()))?;

                info!("{} created {} posts", principal, posts.len());
                Ok(CreatedPosts::Many(posts))
            }
            payload => {
                let owner = owner_of(&payload).map(str::to_string);
                let draft = match into_draft(payload) {
                    Err(DraftError::Missing) => {
                        return Err(error::Error::creation_failure(DraftError::Missing.message()))
                    }
                    other => other,
                };
                if owner.as_deref() != Some(principal) {
                    return Err(error::Error::ownership_mismatch(
                        "You can only create post for yourself.",
                    ));
                }
                let draft = draft.map_err(|e| error::Error::creation_failure(e.message()))?;
                if !self.user_exists(principal).await.map_err(|e| e.collapse(failed()))? {
                    return Err(error::Error::creation_failure("Username not found"));
                }

                let document = self
                    .store
                    .insert_one(POST_COLLECTION, &draft)
                    .await
                    .map_err(|e| e.collapse(failed()))?;
                let post = PostEntity::try_from(document).map_err(|e| e.collapse(failed()))?;

                info!("{} created post {}", principal, post.id);
                Ok(CreatedPosts::One(post))
            }
        }
    }

    /// Replaces a post owned by `principal`. The owner in the body is checked
    /// before the store is touched.
    pub async fn update(
        &self,
        principal: &str,
        id: &str,
        payload: Value,
    ) -> Result<PostEntity, error::Error> {
        let failed = || error::Error::update_failure("Failed to update post.");
        let not_found = || error::Error::not_found("Post not found");

        let owner = owner_of(&payload).map(str::to_string);
        let draft = match into_draft(payload) {
            Err(DraftError::Missing) => {
                return Err(error::Error::update_failure(DraftError::Missing.message()))
            }
            other => other,
        };
        if owner.as_deref() != Some(principal) {
            return Err(error::Error::ownership_mismatch("You can only update post for yourself."));
        }
        let draft = draft.map_err(|e| error::Error::update_failure(e.message()))?;

        let id = Uuid::parse_str(id).map_err(|_| not_found())?;
        let guard = filter_eq("username", principal);

        let updated = self
            .store
            .update_by_id(POST_COLLECTION, &id, &guard, &draft)
            .await
            .map_err(|e| e.collapse(failed()))?;

        match updated {
            Some(document) => {
                let post = PostEntity::try_from(document).map_err(|e| e.collapse(failed()))?;
                info!("{} updated post {}", principal, post.id);
                Ok(post)
            }
            None => {
                let existing = self
                    .store
                    .find_by_id(POST_COLLECTION, &id)
                    .await
                    .map_err(|e| e.collapse(failed()))?;
                match existing {
                    Some(_) => Err(error::Error::ownership_mismatch(
                        "You can only update post for yourself.",
                    )),
                    None => Err(not_found()),
                }
            }
        }
    }

    /// Reads the post, checks the owner, then deletes it.
    pub async fn delete(&self, principal: &str, id: &str) -> Result<PostEntity, error::Error> {
        let failed = || error::Error::deletion_failure("Post failed to delete.");
        let missing = || error::Error::deletion_failure("Post to be deleted not found.");

        let id = Uuid::parse_str(id).map_err(|_| missing())?;
        let document = self
            .store
            .find_by_id(POST_COLLECTION, &id)
            .await
            .map_err(|e| e.collapse(failed()))?
            .ok_or_else(missing)?;
        let post = PostEntity::try_from(document).map_err(|e| e.collapse(failed()))?;

        if post.username != principal {
            return Err(error::Error::ownership_mismatch("You can only delete post for yourself."));
        }

        let deleted = self
            .store
            .delete_by_id(POST_COLLECTION, &id, &filter_eq("username", principal))
            .await
            .map_err(|e| e.collapse(failed()))?;
        if !deleted {
            return Err(failed());
        }

        info!("{} deleted post {}", principal, post.id);
        Ok(post)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::document::repository_memory::DocumentStoreMemory;
    use chrono::{Duration, Utc};
    use serde_json::json;

    fn setup() -> (Arc<DocumentStoreMemory>, PostService) {
        let store = Arc::new(DocumentStoreMemory::new());
        store.seed(USER_COLLECTION, obj(json!({ "username": "alice" })), Utc::now());
        store.seed(USER_COLLECTION, obj(json!({ "username": "bob" })), Utc::now());
        let service = PostService::with_dependencies(store.clone());
        (store, service)
    }

    fn obj(value: Value) -> Body {
        value.as_object().cloned().unwrap()
    }

    fn one(created: CreatedPosts) -> PostEntity {
        match created {
            CreatedPosts::One(post) => post,
            CreatedPosts::Many(_) => panic!("expected a single post"),
        }
    }

    fn query(limit: Option<u64>, order: Option<&str>) -> PageQuery {
        PageQuery { limit, order: order.map(str::to_string) }
    }

    #[actix_web::test]
    async fn created_post_is_owned_by_principal_with_equal_timestamps() {
        let (_, service) = setup();
        let post = one(
            service
                .create("alice", json!({ "username": "alice", "title": "first", "public": true }))
                .await
                .unwrap(),
        );

        assert_eq!(post.username, "alice");
        assert_eq!(post.created_at, post.updated_at);
        assert_eq!(post.content["title"], "first");
    }

    #[actix_web::test]
    async fn create_for_someone_else_is_ownership_mismatch() {
        let (store, service) = setup();
        let err = service.create("alice", json!({ "username": "bob" })).await.unwrap_err();
        assert_eq!(err.kind(), "OwnershipMismatch");
        assert_eq!(store.count(POST_COLLECTION), 0);
    }

    #[actix_web::test]
    async fn create_for_unknown_user_fails() {
        let (_, service) = setup();
        let err = service.create("carol", json!({ "username": "carol" })).await.unwrap_err();
        assert!(matches!(err, error::Error::CreationFailure(ref m) if m == "Username not found"));
    }

    #[actix_web::test]
    async fn create_with_empty_body_fails() {
        let (_, service) = setup();
        let err = service.create("alice", json!({})).await.unwrap_err();
        assert!(matches!(err, error::Error::CreationFailure(ref m) if m == "Missing post body"));
        let err = service.create("alice", json!([])).await.unwrap_err();
        assert_eq!(err.kind(), "CreationFailure");
        let err = service.create("alice", Value::Null).await.unwrap_err();
        assert_eq!(err.kind(), "CreationFailure");
    }

    #[actix_web::test]
    async fn batch_create_inserts_all_in_order() {
        let (store, service) = setup();
        let created = service
            .create(
                "alice",
                json!([
                    { "username": "alice", "title": "a" },
                    { "username": "alice", "title": "b" }
                ]),
            )
            .await
            .unwrap();

        let CreatedPosts::Many(posts) = created else { panic!("expected a batch") };
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].content["title"], "a");
        assert_eq!(posts[1].content["title"], "b");
        assert_eq!(store.count(POST_COLLECTION), 2);
    }

    #[actix_web::test]
    async fn batch_with_mixed_usernames_persists_nothing() {
        let (store, service) = setup();
        let err = service
            .create(
                "alice",
                json!([
                    { "username": "alice", "title": "a" },
                    { "username": "bob", "title": "b" },
                    { "username": "alice", "title": "c" }
                ]),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            error::Error::CreationFailure(ref m) if m == "Username should be the same"
        ));
        assert_eq!(store.count(POST_COLLECTION), 0);
    }

    #[actix_web::test]
    async fn batch_for_someone_else_is_ownership_mismatch() {
        let (_, service) = setup();
        let err = service.create("alice", json!([{ "username": "bob" }])).await.unwrap_err();
        assert_eq!(err.kind(), "OwnershipMismatch");
    }

    #[actix_web::test]
    async fn store_failure_on_create_collapses_to_creation_failure() {
        let (store, service) = setup();
        store.set_failing(true);
        let err = service.create("alice", json!({ "username": "alice" })).await.unwrap_err();
        assert!(matches!(
            err,
            error::Error::CreationFailure(ref m) if m == "Post failed to create."
        ));
    }

    #[actix_web::test]
    async fn get_by_id_reports_malformed_and_missing_ids_alike() {
        let (_, service) = setup();
        let malformed = service.get_by_id("not-an-id").await.unwrap_err();
        let missing = service.get_by_id(&Uuid::now_v7().to_string()).await.unwrap_err();
        assert_eq!(malformed.to_string(), missing.to_string());
        assert_eq!(missing.kind(), "NotFound");
    }

    #[actix_web::test]
    async fn get_by_id_returns_post() {
        let (_, service) = setup();
        let post = one(service.create("alice", json!({ "username": "alice" })).await.unwrap());
        let found = service.get_by_id(&post.id.to_string()).await.unwrap();
        assert_eq!(found.id, post.id);
    }

    #[actix_web::test]
    async fn update_refreshes_updated_at() {
        let (_, service) = setup();
        let post =
            one(service.create("alice", json!({ "username": "alice", "v": 1 })).await.unwrap());

        let updated = service
            .update("alice", &post.id.to_string(), json!({ "username": "alice", "v": 2 }))
            .await
            .unwrap();

        assert!(updated.updated_at > post.updated_at);
        assert_eq!(updated.created_at, post.created_at);
        assert_eq!(updated.content["v"], 2);
    }

    #[actix_web::test]
    async fn repeated_updates_keep_increasing_updated_at() {
        let (_, service) = setup();
        let post = one(service.create("alice", json!({ "username": "alice" })).await.unwrap());
        let id = post.id.to_string();

        let mut last = post.updated_at;
        for i in 0..5 {
            let updated =
                service.update("alice", &id, json!({ "username": "alice", "i": i })).await.unwrap();
            assert!(updated.updated_at > last);
            last = updated.updated_at;
        }
    }

    #[actix_web::test]
    async fn update_checks_ownership_before_existence() {
        let (_, service) = setup();
        let err = service
            .update("alice", &Uuid::now_v7().to_string(), json!({ "username": "bob" }))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "OwnershipMismatch");
    }

    #[actix_web::test]
    async fn update_of_missing_post_is_not_found() {
        let (_, service) = setup();
        let err = service
            .update("alice", &Uuid::now_v7().to_string(), json!({ "username": "alice" }))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "NotFound");
    }

    #[actix_web::test]
    async fn update_cannot_take_over_another_users_post() {
        let (_, service) = setup();
        let post = one(service.create("bob", json!({ "username": "bob" })).await.unwrap());

        let err = service
            .update("alice", &post.id.to_string(), json!({ "username": "alice" }))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "OwnershipMismatch");

        let unchanged = service.get_by_id(&post.id.to_string()).await.unwrap();
        assert_eq!(unchanged.username, "bob");
    }

    #[actix_web::test]
    async fn update_with_empty_body_fails() {
        let (_, service) = setup();
        let err =
            service.update("alice", &Uuid::now_v7().to_string(), json!({})).await.unwrap_err();
        assert!(matches!(err, error::Error::UpdateFailure(ref m) if m == "Missing post body"));
    }

    #[actix_web::test]
    async fn store_failure_on_update_collapses_to_update_failure() {
        let (store, service) = setup();
        let post = one(service.create("alice", json!({ "username": "alice" })).await.unwrap());
        store.set_failing(true);
        let err = service
            .update("alice", &post.id.to_string(), json!({ "username": "alice" }))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "UpdateFailure");
    }

    #[actix_web::test]
    async fn delete_removes_own_post() {
        let (store, service) = setup();
        let post = one(service.create("alice", json!({ "username": "alice" })).await.unwrap());

        let deleted = service.delete("alice", &post.id.to_string()).await.unwrap();
        assert_eq!(deleted.id, post.id);
        assert_eq!(store.count(POST_COLLECTION), 0);
    }

    #[actix_web::test]
    async fn delete_of_someone_elses_post_is_ownership_mismatch() {
        let (store, service) = setup();
        let post = one(service.create("bob", json!({ "username": "bob" })).await.unwrap());

        let err = service.delete("alice", &post.id.to_string()).await.unwrap_err();
        assert_eq!(err.kind(), "OwnershipMismatch");
        assert_eq!(store.count(POST_COLLECTION), 1);
    }

    #[actix_web::test]
    async fn delete_of_missing_post_is_deletion_failure() {
        let (_, service) = setup();
        let err = service.delete("alice", &Uuid::now_v7().to_string()).await.unwrap_err();
        assert!(matches!(
            err,
            error::Error::DeletionFailure(ref m) if m == "Post to be deleted not found."
        ));
        let err = service.delete("alice", "garbage").await.unwrap_err();
        assert_eq!(err.kind(), "DeletionFailure");
    }

    #[actix_web::test]
    async fn store_failure_on_delete_collapses_to_deletion_failure() {
        let (store, service) = setup();
        let post = one(service.create("alice", json!({ "username": "alice" })).await.unwrap());
        store.set_failing_deletes(true);

        let err = service.delete("alice", &post.id.to_string()).await.unwrap_err();
        assert!(matches!(
            err,
            error::Error::DeletionFailure(ref m) if m == "Post failed to delete."
        ));
        assert_eq!(store.count(POST_COLLECTION), 1);
    }

    #[actix_web::test]
    async fn delete_that_removes_nothing_is_deletion_failure() {
        let (store, service) = setup();
        let post = one(service.create("alice", json!({ "username": "alice" })).await.unwrap());
        store.set_racing_deletes(true);

        let err = service.delete("alice", &post.id.to_string()).await.unwrap_err();
        assert!(matches!(
            err,
            error::Error::DeletionFailure(ref m) if m == "Post failed to delete."
        ));
    }

    #[actix_web::test]
    async fn create_owner_is_checked_before_public_flag() {
        let (store, service) = setup();
        let err = service
            .create("alice", json!({ "username": "bob", "public": "yes" }))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "OwnershipMismatch");

        let err = service
            .create("alice", json!({ "username": "alice", "public": "yes" }))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "CreationFailure");
        assert_eq!(store.count(POST_COLLECTION), 0);
    }

    #[actix_web::test]
    async fn batch_for_unknown_user_fails() {
        let (store, service) = setup();
        let err = service
            .create("carol", json!([{ "username": "carol" }, { "username": "carol" }]))
            .await
            .unwrap_err();
        assert!(matches!(err, error::Error::CreationFailure(ref m) if m == "Username not found"));
        assert_eq!(store.count(POST_COLLECTION), 0);
    }

    #[actix_web::test]
    async fn batch_with_non_object_element_persists_nothing() {
        let (store, service) = setup();
        for bad in [json!(5), json!("text"), json!(null), json!([])] {
            let err = service
                .create("alice", json!([{ "username": "alice", "title": "a" }, bad]))
                .await
                .unwrap_err();
            assert_eq!(err.kind(), "CreationFailure");
        }
        let err = service
            .create("alice", json!([{ "username": "alice" }, { "username": "alice", "public": 1 }]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "CreationFailure");
        assert_eq!(store.count(POST_COLLECTION), 0);
    }

    #[actix_web::test]
    async fn store_failure_on_reads_collapses_to_not_found() {
        let (store, service) = setup();
        let post = one(service.create("alice", json!({ "username": "alice" })).await.unwrap());
        store.set_failing(true);

        let by_id = service.get_by_id(&post.id.to_string()).await.unwrap_err();
        let by_username = service.get_by_username("alice").await.unwrap_err();
        let page = service.get_page("1", &query(None, None)).await.unwrap_err();
        for err in [by_id, by_username, page] {
            assert!(matches!(err, error::Error::NotFound(ref m) if m == "Post not found"));
        }
    }

    #[actix_web::test]
    async fn list_by_username_is_exact_and_newest_first() {
        let (store, service) = setup();
        let base = Utc::now() - Duration::hours(1);
        let seeded = [(1, "alice"), (3, "alice"), (2, "bob"), (2, "alice"), (4, "alicia")];
        for (minutes, user) in seeded {
            store.seed(
                POST_COLLECTION,
                obj(json!({ "username": user, "minute": minutes })),
                base + Duration::minutes(minutes),
            );
        }

        let posts = service.get_by_username("alice").await.unwrap();
        let minutes: Vec<_> = posts.iter().map(|p| p.content["minute"].as_i64().unwrap()).collect();
        assert_eq!(minutes, vec![3, 2, 1]);
        assert!(posts.iter().all(|p| p.username == "alice"));
    }

    #[actix_web::test]
    async fn list_by_blank_username_fails() {
        let (_, service) = setup();
        let err = service.get_by_username("  ").await.unwrap_err();
        assert!(matches!(err, error::Error::NotFound(ref m) if m == "Missing username."));
    }

    async fn seed_public_posts(store: &DocumentStoreMemory, count: i64) {
        let base = Utc::now() - Duration::hours(1);
        for rank in 1..=count {
            // rank 1 is the most recently updated
            store.seed(
                POST_COLLECTION,
                obj(json!({ "username": "alice", "public": true, "rank": rank })),
                base - Duration::minutes(rank),
            );
        }
        store.seed(
            POST_COLLECTION,
            obj(json!({ "username": "alice", "public": false, "rank": 0 })),
            base,
        );
    }

    fn ranks(posts: &[PostEntity]) -> Vec<i64> {
        posts.iter().map(|p| p.content["rank"].as_i64().unwrap()).collect()
    }

    #[actix_web::test]
    async fn pages_of_public_posts_newest_first() {
        let (store, service) = setup();
        seed_public_posts(&store, 12).await;

        let first = service.get_page("1", &query(Some(5), None)).await.unwrap();
        assert_eq!(ranks(&first), vec![1, 2, 3, 4, 5]);

        let third = service.get_page("3", &query(Some(5), None)).await.unwrap();
        assert_eq!(ranks(&third), vec![11, 12]);

        let fourth = service.get_page("4", &query(Some(5), None)).await.unwrap();
        assert!(fourth.is_empty());
    }

    #[actix_web::test]
    async fn page_defaults_to_five_and_supports_ascending() {
        let (store, service) = setup();
        seed_public_posts(&store, 12).await;

        let first = service.get_page("1", &query(None, None)).await.unwrap();
        assert_eq!(first.len(), 5);

        let asc = service.get_page("1", &query(Some(3), Some("asc"))).await.unwrap();
        assert_eq!(ranks(&asc), vec![12, 11, 10]);
        assert_eq!(query(None, Some("asc")).order(), SortOrder::Asc);
    }

    #[actix_web::test]
    async fn invalid_page_number_fails() {
        let (_, service) = setup();
        for page in ["0", "-1", "abc", ""] {
            let err = service.get_page(page, &query(None, None)).await.unwrap_err();
            assert!(matches!(err, error::Error::NotFound(ref m) if m == "Missing page number."));
        }
    }
}
