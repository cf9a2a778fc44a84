use crate::data::{PostRepository, UserRepository};
use crate::domain::post::{CreatePostRequest, NewPost, PostFilter, PostPatch, PostResponse};
use crate::domain::{DomainError, PageWindow, Pagination, PostAction, PostId, UserId};
use mockable::Clock;
use std::sync::Arc;

/// Raw listing parameters as they arrive from a boundary adapter.
#[derive(Debug, Clone, Default)]
pub struct ListPostsQuery {
    pub author_id: Option<String>,
    pub published_only: Option<bool>,
    pub limit: Option<f64>,
    pub page: Option<f64>,
}

/// Feed listing and ownership-gated mutation of posts.
///
/// The count and the page fetch of a listing are separate store calls, as
/// are the ownership check and the write of an update or delete. Concurrent
/// writers may land in between; the window metadata is advisory and the last
/// owner write wins.
pub struct PostService {
    post_repo: Arc<dyn PostRepository + Send + Sync>,
    user_repo: Arc<dyn UserRepository + Send + Sync>,
    clock: Arc<dyn Clock>,
}

impl PostService {
    pub fn new(
        post_repo: Arc<dyn PostRepository + Send + Sync>,
        user_repo: Arc<dyn UserRepository + Send + Sync>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            post_repo,
            user_repo,
            clock,
        }
    }

    pub async fn list_posts(
        &self,
        query: ListPostsQuery,
    ) -> Result<PageWindow<PostResponse>, DomainError> {
        let pagination = Pagination::from_raw(query.limit, query.page)?;
        let author_id = query
            .author_id
            .as_deref()
            .map(UserId::parse_author)
            .transpose()?;

        let filter = PostFilter {
            author_id,
            published_only: query.published_only.unwrap_or(false),
        };

        let total = self.post_repo.count(&filter).await?;
        let items = self
            .post_repo
            .fetch_page(&filter, pagination.limit(), pagination.offset())
            .await?;

        tracing::debug!(
            "Listed posts: page={}, limit={}, total={}, returned={}",
            pagination.page(),
            pagination.limit(),
            total,
            items.len()
        );

        Ok(PageWindow::new(items, pagination, total).map(PostResponse::from))
    }

    pub async fn get_post(&self, id: PostId) -> Result<Option<PostResponse>, DomainError> {
        let post = self.post_repo.find_by_id(id).await?;
        Ok(post.map(PostResponse::from))
    }

    pub async fn create_post(
        &self,
        author_id: UserId,
        req: CreatePostRequest,
    ) -> Result<PostResponse, DomainError> {
        // Validate input
        if req.title.trim().is_empty() {
            return Err(DomainError::InvalidTitle);
        }
        if req.content.trim().is_empty() {
            return Err(DomainError::InvalidContent);
        }

        if self.user_repo.find_by_id(author_id).await?.is_none() {
            tracing::warn!("Post creation for unknown author {}", author_id);
            return Err(DomainError::AuthorNotFound);
        }

        let post = self
            .post_repo
            .insert(NewPost {
                title: req.title,
                content: req.content,
                author_id,
                published: req.published.unwrap_or(false),
                created_at: self.clock.utc(),
            })
            .await?;

        tracing::info!("Post created: id={}, author_id={}", post.id, author_id);

        Ok(PostResponse::from(post))
    }

    pub async fn update_post(
        &self,
        id: PostId,
        user_id: UserId,
        patch: PostPatch,
    ) -> Result<PostResponse, DomainError> {
        self.ensure_owner(id, user_id, PostAction::Modify).await?;

        if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(DomainError::InvalidTitle);
        }
        if patch.content.as_deref().is_some_and(|c| c.trim().is_empty()) {
            return Err(DomainError::InvalidContent);
        }
        if patch.is_empty() {
            return Err(DomainError::NoFieldsToUpdate);
        }

        let updated = self
            .post_repo
            .update(id, patch, self.clock.utc())
            .await?
            // removed between the ownership check and the write
            .ok_or(DomainError::PostNotFound)?;

        tracing::info!("Post updated: id={}, author_id={}", id, user_id);

        Ok(PostResponse::from(updated))
    }

    /// Not idempotent: a second delete of the same id is `PostNotFound`.
    pub async fn delete_post(&self, id: PostId, user_id: UserId) -> Result<(), DomainError> {
        self.ensure_owner(id, user_id, PostAction::Delete).await?;

        if !self.post_repo.delete(id).await? {
            return Err(DomainError::PostNotFound);
        }

        tracing::info!("Post deleted: id={}, author_id={}", id, user_id);

        Ok(())
    }

    /// Existence is checked before ownership, so non-owners probing a missing
    /// id see "not found".
    async fn ensure_owner(
        &self,
        id: PostId,
        user_id: UserId,
        action: PostAction,
    ) -> Result<(), DomainError> {
        let post = self
            .post_repo
            .find_by_id(id)
            .await?
            .ok_or(DomainError::PostNotFound)?;

        if post.author_id != user_id {
            tracing::warn!(
                "User {} attempted to {} post {} owned by {}",
                user_id,
                action,
                id,
                post.author_id
            );
            return Err(DomainError::NotAuthorized(action));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::post_repository::MockPostRepository;
    use crate::data::user_repository::MockUserRepository;
    use crate::data::MemoryStore;
    use crate::domain::user::NewUser;
    use crate::domain::Post;
    use chrono::{DateTime, Duration, Local, TimeZone, Utc};
    use std::sync::Mutex;

    /// Advances one second on every reading.
    struct SteppingClock {
        next: Mutex<DateTime<Utc>>,
    }

    impl SteppingClock {
        fn new() -> Self {
            Self {
                next: Mutex::new(Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()),
            }
        }
    }

    impl Clock for SteppingClock {
        fn local(&self) -> DateTime<Local> {
            self.utc().with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            let mut next = self.next.lock().unwrap();
            let now = *next;
            *next = now + Duration::seconds(1);
            now
        }
    }

    async fn memory_service() -> (PostService, Arc<MemoryStore>, UserId, UserId) {
        let store = Arc::new(MemoryStore::new());
        let mut ids = Vec::new();
        for email in ["alice@example.com", "bob@example.com"] {
            let user = UserRepository::create(
                store.as_ref(),
                NewUser {
                    email: email.into(),
                    name: None,
                    password_hash: "hash".into(),
                },
            )
            .await
            .unwrap();
            ids.push(user.id);
        }
        let service = PostService::new(
            store.clone(),
            store.clone(),
            Arc::new(SteppingClock::new()),
        );
        (service, store, ids[0], ids[1])
    }

    fn create_req(title: &str) -> CreatePostRequest {
        CreatePostRequest {
            title: title.into(),
            content: "body".into(),
            published: None,
        }
    }

    fn list(limit: f64, page: f64) -> ListPostsQuery {
        ListPostsQuery {
            limit: Some(limit),
            page: Some(page),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn second_page_of_twelve_holds_rows_six_to_ten() {
        let (service, _, alice, _) = memory_service().await;
        let mut created = Vec::new();
        for i in 1..=12 {
            created.push(
                service
                    .create_post(alice, create_req(&format!("post {i}")))
                    .await
                    .unwrap(),
            );
        }

        let window = service.list_posts(list(5.0, 2.0)).await.unwrap();

        assert_eq!(window.total, 12);
        assert_eq!(window.total_pages, 3);
        assert!(window.has_next_page);
        let titles: Vec<&str> = window.items.iter().map(|p| p.title.as_str()).collect();
        // newest first: rows 6..=10 of the descending order are posts 7..=3
        assert_eq!(titles, ["post 7", "post 6", "post 5", "post 4", "post 3"]);
    }

    #[tokio::test]
    async fn items_never_exceed_limit() {
        let (service, _, alice, _) = memory_service().await;
        for i in 0..23 {
            service
                .create_post(alice, create_req(&format!("p{i}")))
                .await
                .unwrap();
        }
        for limit in [1.0, 2.0, 7.0, 10.0, 100.0] {
            for page in 1..=5 {
                let window = service.list_posts(list(limit, page as f64)).await.unwrap();
                assert!(window.items.len() <= window.limit as usize);
                assert_eq!(window.has_next_page, window.page < window.total_pages);
            }
        }
    }

    #[tokio::test]
    async fn page_past_the_end_is_empty_but_keeps_totals() {
        let (service, _, alice, _) = memory_service().await;
        for i in 0..3 {
            service
                .create_post(alice, create_req(&format!("p{i}")))
                .await
                .unwrap();
        }
        let window = service.list_posts(list(2.0, 7.0)).await.unwrap();
        assert!(window.items.is_empty());
        assert_eq!(window.page, 7);
        assert_eq!(window.total, 3);
        assert_eq!(window.total_pages, 2);
        assert!(!window.has_next_page);
    }

    #[tokio::test]
    async fn filters_by_author_and_published_flag() {
        let (service, _, alice, bob) = memory_service().await;
        service
            .create_post(
                alice,
                CreatePostRequest {
                    published: Some(true),
                    ..create_req("alice published")
                },
            )
            .await
            .unwrap();
        service
            .create_post(alice, create_req("alice draft"))
            .await
            .unwrap();
        service
            .create_post(
                bob,
                CreatePostRequest {
                    published: Some(true),
                    ..create_req("bob published")
                },
            )
            .await
            .unwrap();

        let window = service
            .list_posts(ListPostsQuery {
                author_id: Some(alice.to_string()),
                published_only: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(window.total, 1);
        assert_eq!(window.items[0].title, "alice published");

        let published = service
            .list_posts(ListPostsQuery {
                published_only: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(published.total, 2);
        assert!(published.items.iter().all(|p| p.published));

        let everything = service.list_posts(ListPostsQuery::default()).await.unwrap();
        assert_eq!(everything.total, 3);
    }

    #[tokio::test]
    async fn blank_author_filter_is_rejected() {
        let (service, _, _, _) = memory_service().await;
        let err = service
            .list_posts(ListPostsQuery {
                author_id: Some("  ".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidAuthorId));
    }

    #[tokio::test]
    async fn non_finite_limit_is_rejected() {
        let (service, _, _, _) = memory_service().await;
        let err = service.list_posts(list(f64::NAN, 1.0)).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidLimit));
        let err = service
            .list_posts(list(10.0, f64::INFINITY))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidPage));
    }

    #[tokio::test]
    async fn total_is_advisory_when_a_write_lands_between_count_and_fetch() {
        let author = UserId::random();
        let now = Utc::now();
        let rows: Vec<Post> = (0..3)
            .map(|i| Post {
                id: PostId::random(),
                title: format!("p{i}"),
                content: "c".into(),
                author_id: author,
                published: true,
                created_at: now,
                updated_at: now,
            })
            .collect();

        let mut posts = MockPostRepository::new();
        // count sees two rows, a concurrent insert makes the fetch see three
        posts.expect_count().times(1).returning(|_| Ok(2));
        posts
            .expect_fetch_page()
            .times(1)
            .returning(move |_, _, _| Ok(rows.clone()));

        let service = PostService::new(
            Arc::new(posts),
            Arc::new(MockUserRepository::new()),
            Arc::new(SteppingClock::new()),
        );
        let window = service.list_posts(ListPostsQuery::default()).await.unwrap();
        assert_eq!(window.total, 2);
        assert_eq!(window.items.len(), 3);
        assert_eq!(window.total_pages, 1);
        assert!(!window.has_next_page);
    }

    #[tokio::test]
    async fn listing_passes_the_same_filter_to_count_and_fetch() {
        let author = UserId::random();
        let expected = PostFilter {
            author_id: Some(author),
            published_only: true,
        };

        let mut posts = MockPostRepository::new();
        posts
            .expect_count()
            .withf(move |f| *f == expected)
            .times(1)
            .returning(|_| Ok(40));
        posts
            .expect_fetch_page()
            .withf(move |f, limit, offset| *f == expected && *limit == 15 && *offset == 30)
            .times(1)
            .returning(|_, _, _| Ok(Vec::new()));

        let service = PostService::new(
            Arc::new(posts),
            Arc::new(MockUserRepository::new()),
            Arc::new(SteppingClock::new()),
        );
        let window = service
            .list_posts(ListPostsQuery {
                author_id: Some(author.to_string()),
                published_only: Some(true),
                limit: Some(15.9),
                page: Some(3.0),
            })
            .await
            .unwrap();
        assert_eq!(window.limit, 15);
        assert_eq!(window.total_pages, 3);
    }

    #[tokio::test]
    async fn empty_title_never_reaches_the_store() {
        let mut posts = MockPostRepository::new();
        posts.expect_insert().never();
        let mut users = MockUserRepository::new();
        users.expect_find_by_id().never();

        let service = PostService::new(
            Arc::new(posts),
            Arc::new(users),
            Arc::new(SteppingClock::new()),
        );
        let err = service
            .create_post(UserId::random(), create_req(""))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTitle));
        assert_eq!(err.kind(), crate::domain::ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn long_titles_are_kept_whole() {
        let (service, _, alice, _) = memory_service().await;
        let title = "t".repeat(300);

        let post = service.create_post(alice, create_req(&title)).await.unwrap();
        let fetched = service.get_post(post.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, title);
    }

    #[tokio::test]
    async fn whitespace_content_is_rejected() {
        let (service, _, alice, _) = memory_service().await;
        let err = service
            .create_post(
                alice,
                CreatePostRequest {
                    content: "  \n".into(),
                    ..create_req("title")
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidContent));
    }

    #[tokio::test]
    async fn unknown_author_cannot_create() {
        let (service, _, _, _) = memory_service().await;
        let err = service
            .create_post(UserId::random(), create_req("title"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::AuthorNotFound));
    }

    #[tokio::test]
    async fn create_then_get_then_update_round_trip() {
        let (service, _, alice, _) = memory_service().await;
        let created = service
            .create_post(
                alice,
                CreatePostRequest {
                    title: "Hello".into(),
                    content: "World".into(),
                    published: Some(false),
                },
            )
            .await
            .unwrap();

        let fetched = service.get_post(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "Hello");
        assert_eq!(fetched.content, "World");
        assert_eq!(fetched.author_id, alice);
        assert!(!fetched.published);
        assert_eq!(fetched.created_at, fetched.updated_at);

        let updated = service
            .update_post(
                created.id,
                alice,
                PostPatch {
                    title: Some("x".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "x");
        assert_eq!(updated.content, "World");
        assert!(updated.updated_at > updated.created_at);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn published_defaults_to_draft() {
        let (service, _, alice, _) = memory_service().await;
        let created = service.create_post(alice, create_req("t")).await.unwrap();
        assert!(!created.published);
    }

    #[tokio::test]
    async fn owner_can_publish_and_unpublish() {
        let (service, _, alice, _) = memory_service().await;
        let post = service.create_post(alice, create_req("t")).await.unwrap();
        for flag in [true, false] {
            let updated = service
                .update_post(
                    post.id,
                    alice,
                    PostPatch {
                        published: Some(flag),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
            assert_eq!(updated.published, flag);
        }
    }

    #[tokio::test]
    async fn non_owner_update_is_rejected_and_row_unchanged() {
        let (service, store, alice, bob) = memory_service().await;
        let post = service.create_post(alice, create_req("mine")).await.unwrap();
        let before = PostRepository::find_by_id(store.as_ref(), post.id)
            .await
            .unwrap()
            .unwrap();

        let err = service
            .update_post(
                post.id,
                bob,
                PostPatch {
                    title: Some("stolen".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotAuthorized(PostAction::Modify)));

        let after = PostRepository::find_by_id(store.as_ref(), post.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn missing_post_is_not_found_for_any_user() {
        let (service, _, alice, bob) = memory_service().await;
        let missing = PostId::random();
        for user in [alice, bob] {
            let err = service
                .update_post(
                    missing,
                    user,
                    PostPatch {
                        title: Some("t".into()),
                        ..Default::default()
                    },
                )
                .await
                .unwrap_err();
            assert!(matches!(err, DomainError::PostNotFound));

            let err = service.delete_post(missing, user).await.unwrap_err();
            assert!(matches!(err, DomainError::PostNotFound));
        }
    }

    #[tokio::test]
    async fn invalid_patch_on_missing_post_reports_not_found_first() {
        let (service, _, alice, _) = memory_service().await;
        let err = service
            .update_post(PostId::random(), alice, PostPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::PostNotFound));
    }

    #[tokio::test]
    async fn empty_patch_has_no_fields_to_update() {
        let (service, _, alice, _) = memory_service().await;
        let post = service.create_post(alice, create_req("t")).await.unwrap();
        let err = service
            .update_post(post.id, alice, PostPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NoFieldsToUpdate));
    }

    #[tokio::test]
    async fn blank_patch_fields_are_rejected() {
        let (service, _, alice, _) = memory_service().await;
        let post = service.create_post(alice, create_req("t")).await.unwrap();
        let err = service
            .update_post(
                post.id,
                alice,
                PostPatch {
                    title: Some(" ".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTitle));

        let err = service
            .update_post(
                post.id,
                alice,
                PostPatch {
                    content: Some(String::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidContent));
    }

    #[tokio::test]
    async fn deleting_twice_fails_the_second_time() {
        let (service, _, alice, _) = memory_service().await;
        let post = service.create_post(alice, create_req("t")).await.unwrap();

        service.delete_post(post.id, alice).await.unwrap();
        let err = service.delete_post(post.id, alice).await.unwrap_err();
        assert!(matches!(err, DomainError::PostNotFound));
        assert!(service.get_post(post.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn non_owner_cannot_delete() {
        let (service, _, alice, bob) = memory_service().await;
        let post = service.create_post(alice, create_req("t")).await.unwrap();
        let err = service.delete_post(post.id, bob).await.unwrap_err();
        assert!(matches!(err, DomainError::NotAuthorized(PostAction::Delete)));
        assert!(service.get_post(post.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_racing_a_delete_reports_not_found() {
        let owner = UserId::random();
        let id = PostId::random();
        let now = Utc::now();
        let existing = Post {
            id,
            title: "t".into(),
            content: "c".into(),
            author_id: owner,
            published: false,
            created_at: now,
            updated_at: now,
        };

        let mut posts = MockPostRepository::new();
        posts
            .expect_find_by_id()
            .returning(move |_| Ok(Some(existing.clone())));
        posts.expect_update().returning(|_, _, _| Ok(None));

        let service = PostService::new(
            Arc::new(posts),
            Arc::new(MockUserRepository::new()),
            Arc::new(SteppingClock::new()),
        );
        let err = service
            .update_post(
                id,
                owner,
                PostPatch {
                    content: Some("new".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::PostNotFound));
    }

    #[tokio::test]
    async fn store_failures_surface_as_internal() {
        let mut posts = MockPostRepository::new();
        posts
            .expect_count()
            .returning(|_| Err(DomainError::Database("connection reset".into())));
        posts.expect_fetch_page().never();

        let service = PostService::new(
            Arc::new(posts),
            Arc::new(MockUserRepository::new()),
            Arc::new(SteppingClock::new()),
        );
        let err = service
            .list_posts(ListPostsQuery::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::domain::ErrorKind::Internal);
    }
}
