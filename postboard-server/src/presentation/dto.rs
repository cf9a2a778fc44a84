//! Wire shapes of the HTTP API and their decoding into domain requests.
//!
//! Post bodies keep each field as raw JSON so a mistyped field is reported
//! with its own error instead of a generic body rejection.

use crate::application::ListPostsQuery;
use crate::domain::post::{CreatePostRequest, PostPatch};
use crate::domain::user::UserResponse;
use crate::domain::{DomainError, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct DataEnvelope<T> {
    pub data: T,
}

impl<T> DataEnvelope<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthPayload {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct DeletedPayload {
    pub success: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPostsParams {
    pub limit: Option<String>,
    pub page: Option<String>,
    pub author_id: Option<String>,
    pub published_only: Option<String>,
}

impl ListPostsParams {
    /// Anonymous callers only ever see published posts; signed-in callers
    /// see drafts unless they ask otherwise.
    pub fn into_query(self, session: Option<UserId>) -> ListPostsQuery {
        let published_only = match (session, self.published_only) {
            (None, _) => true,
            (Some(_), Some(raw)) => raw != "false",
            (Some(_), None) => false,
        };

        ListPostsQuery {
            author_id: non_blank(self.author_id).map(|s| s.trim().to_string()),
            published_only: Some(published_only),
            limit: non_blank(self.limit).map(|s| parse_number(&s)),
            page: non_blank(self.page).map(|s| parse_number(&s)),
        }
    }
}

fn non_blank(raw: Option<String>) -> Option<String> {
    raw.filter(|s| !s.trim().is_empty())
}

/// Unparseable numbers become NaN and are rejected by the pagination rules.
fn parse_number(raw: &str) -> f64 {
    raw.trim().parse().unwrap_or(f64::NAN)
}

#[derive(Debug, Default, Deserialize)]
pub struct CreatePostBody {
    pub title: Option<Value>,
    pub content: Option<Value>,
    pub published: Option<Value>,
}

impl TryFrom<CreatePostBody> for CreatePostRequest {
    type Error = DomainError;

    fn try_from(body: CreatePostBody) -> Result<Self, Self::Error> {
        Ok(Self {
            title: text_field(body.title, DomainError::InvalidTitle)?.unwrap_or_default(),
            content: text_field(body.content, DomainError::InvalidContent)?.unwrap_or_default(),
            published: flag_field(body.published)?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PatchPostBody {
    pub title: Option<Value>,
    pub content: Option<Value>,
    pub published: Option<Value>,
}

impl TryFrom<PatchPostBody> for PostPatch {
    type Error = DomainError;

    fn try_from(body: PatchPostBody) -> Result<Self, Self::Error> {
        Ok(Self {
            title: text_field(body.title, DomainError::InvalidTitle)?,
            content: text_field(body.content, DomainError::InvalidContent)?,
            published: flag_field(body.published)?,
        })
    }
}

fn text_field(value: Option<Value>, err: DomainError) -> Result<Option<String>, DomainError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(err),
    }
}

fn flag_field(value: Option<Value>) -> Result<Option<bool>, DomainError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(b)),
        Some(_) => Err(DomainError::InvalidPublishedFlag),
    }
}
