//! Process-local store backing both repositories.
//!
//! Used by the test suites and by `STORAGE_BACKEND=memory`. Each call takes
//! the lock once, so individual operations are atomic the same way single
//! statements are against PostgreSQL.

use super::post_repository::PostRepository;
use super::user_repository::UserRepository;
use crate::domain::post::{NewPost, PostFilter, PostPatch};
use crate::domain::user::NewUser;
use crate::domain::{DomainError, Post, PostId, User, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<UserId, User>>,
    posts: RwLock<HashMap<PostId, Post>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fully formed row, bypassing id and timestamp assignment.
    pub async fn put_post(&self, post: Post) {
        self.posts.write().await.insert(post.id, post);
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: NewUser) -> Result<User, DomainError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(DomainError::EmailAlreadyRegistered);
        }
        let created = User {
            id: UserId::random(),
            email: user.email,
            name: user.name,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, DomainError> {
        Ok(self.users.read().await.get(&id).cloned())
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn insert(&self, post: NewPost) -> Result<Post, DomainError> {
        if !self.users.read().await.contains_key(&post.author_id) {
            return Err(DomainError::Database(format!(
                "foreign key violation: user {} does not exist",
                post.author_id
            )));
        }
        let created = Post {
            id: PostId::random(),
            title: post.title,
            content: post.content,
            author_id: post.author_id,
            published: post.published,
            created_at: post.created_at,
            updated_at: post.created_at,
        };
        self.posts.write().await.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, DomainError> {
        Ok(self.posts.read().await.get(&id).cloned())
    }

    async fn update(
        &self,
        id: PostId,
        patch: PostPatch,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Post>, DomainError> {
        let mut posts = self.posts.write().await;
        let Some(post) = posts.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = patch.title {
            post.title = title;
        }
        if let Some(content) = patch.content {
            post.content = content;
        }
        if let Some(published) = patch.published {
            post.published = published;
        }
        post.updated_at = updated_at;
        Ok(Some(post.clone()))
    }

    async fn delete(&self, id: PostId) -> Result<bool, DomainError> {
        Ok(self.posts.write().await.remove(&id).is_some())
    }

    async fn count(&self, filter: &PostFilter) -> Result<u64, DomainError> {
        let posts = self.posts.read().await;
        Ok(posts.values().filter(|p| filter.matches(p)).count() as u64)
    }

    async fn fetch_page(
        &self,
        filter: &PostFilter,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Post>, DomainError> {
        let posts = self.posts.read().await;
        let mut matching: Vec<&Post> = posts.values().filter(|p| filter.matches(p)).collect();
        matching.sort_by_key(|p| (Reverse(p.created_at), p.id));

        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        Ok(matching
            .into_iter()
            .skip(offset)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}
