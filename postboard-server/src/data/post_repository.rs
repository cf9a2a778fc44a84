use crate::domain::post::{NewPost, PostFilter, PostPatch};
use crate::domain::{DomainError, Post, PostId, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};

/// Post storage. Every method is a single store round-trip; callers that
/// combine several calls get no atomicity across them.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn insert(&self, post: NewPost) -> Result<Post, DomainError>;
    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, DomainError>;
    /// Returns `None` when the row no longer exists.
    async fn update(
        &self,
        id: PostId,
        patch: PostPatch,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Post>, DomainError>;
    /// Returns whether a row was removed.
    async fn delete(&self, id: PostId) -> Result<bool, DomainError>;
    async fn count(&self, filter: &PostFilter) -> Result<u64, DomainError>;
    /// Rows matching `filter`, newest first, ties broken by id ascending.
    async fn fetch_page(
        &self,
        filter: &PostFilter,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Post>, DomainError>;
}

pub struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn post_from_row(row: &PgRow) -> Result<Post, DomainError> {
    Ok(Post {
        id: PostId::new(row.try_get("id")?),
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        author_id: UserId::new(row.try_get("author_id")?),
        published: row.try_get("published")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn insert(&self, post: NewPost) -> Result<Post, DomainError> {
        let row = sqlx::query(
            r#"
            INSERT INTO posts (title, content, author_id, published, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING id, title, content, author_id, published, created_at, updated_at
            "#,
        )
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.author_id.as_uuid())
        .bind(post.published)
        .bind(post.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create post: {}", e);
            DomainError::from(e)
        })?;

        post_from_row(&row)
    }

    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, title, content, author_id, published, created_at, updated_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(post_from_row).transpose()
    }

    async fn update(
        &self,
        id: PostId,
        patch: PostPatch,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Post>, DomainError> {
        let row = sqlx::query(
            r#"
            UPDATE posts
            SET
                title = COALESCE($1, title),
                content = COALESCE($2, content),
                published = COALESCE($3, published),
                updated_at = $4
            WHERE id = $5
            RETURNING id, title, content, author_id, published, created_at, updated_at
            "#,
        )
        .bind(patch.title)
        .bind(patch.content)
        .bind(patch.published)
        .bind(updated_at)
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(post_from_row).transpose()
    }

    async fn delete(&self, id: PostId) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            DELETE FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self, filter: &PostFilter) -> Result<u64, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS count
            FROM posts
            WHERE ($1::uuid IS NULL OR author_id = $1)
              AND ($2 = FALSE OR published = TRUE)
            "#,
        )
        .bind(filter.author_id.map(|id| id.as_uuid()))
        .bind(filter.published_only)
        .fetch_one(&self.pool)
        .await?;

        let count: i64 = row.try_get("count")?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn fetch_page(
        &self,
        filter: &PostFilter,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Post>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, content, author_id, published, created_at, updated_at
            FROM posts
            WHERE ($1::uuid IS NULL OR author_id = $1)
              AND ($2 = FALSE OR published = TRUE)
            ORDER BY created_at DESC, id ASC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.author_id.map(|id| id.as_uuid()))
        .bind(filter.published_only)
        .bind(i64::from(limit))
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(post_from_row).collect()
    }
}
