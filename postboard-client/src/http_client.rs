use crate::error::BlogClientError;
use crate::models::{
    AuthResponse, DataEnvelope, ErrorEnvelope, ListPostsParams, LoginRequest, NewPost, Post,
    PostPage, PostUpdate, RegisterRequest,
};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct Deleted {
    success: bool,
}

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into(),
            token: None,
        }
    }

    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn get_token(&self) -> Option<&String> {
        self.token.as_ref()
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    fn add_auth_header(&self, mut request: RequestBuilder) -> RequestBuilder {
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        request
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub async fn register(&mut self, req: RegisterRequest) -> Result<AuthResponse, BlogClientError> {
        let url = self.url("/api/auth/register");
        let response = self.client.post(&url).json(&req).send().await?;

        let auth: AuthResponse = decode(response).await?;
        self.set_token(auth.token.clone());
        Ok(auth)
    }

    pub async fn login(&mut self, req: LoginRequest) -> Result<AuthResponse, BlogClientError> {
        let url = self.url("/api/auth/login");
        let response = self.client.post(&url).json(&req).send().await?;

        let auth: AuthResponse = decode(response).await?;
        self.set_token(auth.token.clone());
        Ok(auth)
    }

    /// Sends the session token when present, so signed-in callers see drafts.
    pub async fn list_posts(&self, params: &ListPostsParams) -> Result<PostPage, BlogClientError> {
        let url = self.url("/api/posts");
        let response = self
            .add_auth_header(self.client.get(&url))
            .query(&params.query_pairs())
            .send()
            .await?;

        decode(response).await
    }

    pub async fn get_post(&self, id: &str) -> Result<Post, BlogClientError> {
        let url = self.url(&format!("/api/posts/{}", id));
        let response = self.client.get(&url).send().await?;
        decode(response).await
    }

    pub async fn create_post(&self, post: &NewPost) -> Result<Post, BlogClientError> {
        let url = self.url("/api/posts");
        let response = self
            .add_auth_header(self.client.post(&url))
            .json(post)
            .send()
            .await?;

        decode(response).await
    }

    pub async fn update_post(&self, id: &str, update: &PostUpdate) -> Result<Post, BlogClientError> {
        let url = self.url(&format!("/api/posts/{}", id));
        let response = self
            .add_auth_header(self.client.patch(&url))
            .json(update)
            .send()
            .await?;

        decode(response).await
    }

    pub async fn delete_post(&self, id: &str) -> Result<(), BlogClientError> {
        let url = self.url(&format!("/api/posts/{}", id));
        let response = self
            .add_auth_header(self.client.delete(&url))
            .send()
            .await?;

        let deleted: Deleted = decode(response).await?;
        if deleted.success {
            Ok(())
        } else {
            Err(BlogClientError::TransportError("delete was not confirmed".into()))
        }
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BlogClientError> {
    let status = response.status();
    let body = response.text().await?;

    if status.is_success() {
        return serde_json::from_str::<DataEnvelope<T>>(&body)
            .map(|envelope| envelope.data)
            .map_err(|e| BlogClientError::SerializationError(e.to_string()));
    }

    Err(error_for_status(status, &body))
}

/// Error envelope message when present, raw body otherwise.
fn error_for_status(status: StatusCode, body: &str) -> BlogClientError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.to_string());

    match status {
        StatusCode::BAD_REQUEST => BlogClientError::InvalidRequest(message),
        StatusCode::UNAUTHORIZED => BlogClientError::Unauthorized(message),
        StatusCode::FORBIDDEN => BlogClientError::Forbidden(message),
        StatusCode::NOT_FOUND => BlogClientError::NotFound(message),
        _ => BlogClientError::TransportError(format!("HTTP {}: {}", status, message)),
    }
}
