use crate::error::BlogClientError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==================== Модели пользователей ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// ==================== Модели постов ====================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author_id: String,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
}

/// Fields left as `None` are not sent and stay unchanged on the server.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PostUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<bool>,
}

impl PostUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.published.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListPostsParams {
    pub author_id: Option<String>,
    pub published_only: Option<bool>,
    pub limit: Option<u32>,
    pub page: Option<u64>,
}

impl ListPostsParams {
    /// Query pairs in the order the HTTP API documents them.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(author_id) = &self.author_id {
            pairs.push(("authorId", author_id.clone()));
        }
        if let Some(published_only) = self.published_only {
            pairs.push(("publishedOnly", published_only.to_string()));
        }
        pairs
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPage {
    pub items: Vec<Post>,
    pub page: u64,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
    pub has_next_page: bool,
}

// ==================== Конверты ответов ====================

#[derive(Debug, Deserialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

// ==================== Вспомогательные функции ====================

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, BlogClientError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| BlogClientError::SerializationError(format!("bad timestamp '{raw}': {e}")))
}

impl TryFrom<crate::proto::User> for User {
    type Error = BlogClientError;

    fn try_from(proto_user: crate::proto::User) -> Result<Self, Self::Error> {
        Ok(Self {
            created_at: parse_timestamp(&proto_user.created_at)?,
            id: proto_user.id,
            email: proto_user.email,
            name: proto_user.name,
        })
    }
}

impl TryFrom<crate::proto::Post> for Post {
    type Error = BlogClientError;

    fn try_from(proto_post: crate::proto::Post) -> Result<Self, Self::Error> {
        Ok(Self {
            created_at: parse_timestamp(&proto_post.created_at)?,
            updated_at: parse_timestamp(&proto_post.updated_at)?,
            id: proto_post.id,
            title: proto_post.title,
            content: proto_post.content,
            author_id: proto_post.author_id,
            published: proto_post.published,
        })
    }
}

impl TryFrom<crate::proto::ListPostsResponse> for PostPage {
    type Error = BlogClientError;

    fn try_from(response: crate::proto::ListPostsResponse) -> Result<Self, Self::Error> {
        Ok(Self {
            items: response
                .items
                .into_iter()
                .map(Post::try_from)
                .collect::<Result<_, _>>()?,
            page: response.page,
            limit: response.limit,
            total: response.total,
            total_pages: response.total_pages,
            has_next_page: response.has_next_page,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn page_window_decodes_from_the_http_envelope() {
        let raw = json!({
            "data": {
                "items": [{
                    "id": "0d8f5a4e-7f38-4d35-9d67-8f0a0c8f4a11",
                    "title": "Hello",
                    "content": "World",
                    "authorId": "6b3c0b4e-1a8b-4c1d-9d0e-2f6a5b7c8d90",
                    "published": true,
                    "createdAt": "2025-03-01T09:00:00Z",
                    "updatedAt": "2025-03-01T09:00:05Z"
                }],
                "page": 1,
                "limit": 10,
                "total": 1,
                "totalPages": 1,
                "hasNextPage": false
            }
        });

        let page: DataEnvelope<PostPage> = serde_json::from_value(raw).unwrap();
        assert_eq!(page.data.items.len(), 1);
        assert_eq!(page.data.items[0].author_id, "6b3c0b4e-1a8b-4c1d-9d0e-2f6a5b7c8d90");
        assert!(!page.data.has_next_page);
    }

    #[test]
    fn query_pairs_skip_unset_fields() {
        let params = ListPostsParams {
            published_only: Some(false),
            page: Some(3),
            ..Default::default()
        };
        assert_eq!(
            params.query_pairs(),
            vec![("page", "3".to_string()), ("publishedOnly", "false".to_string())]
        );
    }

    #[test]
    fn update_sends_only_present_fields() {
        let update = PostUpdate {
            published: Some(true),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&update).unwrap(), json!({ "published": true }));
    }

    #[test]
    fn proto_post_with_bad_timestamp_is_rejected() {
        let proto = crate::proto::Post {
            id: "id".into(),
            title: "t".into(),
            content: "c".into(),
            author_id: "a".into(),
            published: false,
            created_at: "yesterday".into(),
            updated_at: "2025-03-01T09:00:00Z".into(),
        };
        assert!(matches!(
            Post::try_from(proto),
            Err(BlogClientError::SerializationError(_))
        ));
    }
}
