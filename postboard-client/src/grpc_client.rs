use crate::error::BlogClientError;
use crate::models::{AuthResponse, ListPostsParams, NewPost, Post, PostPage, PostUpdate, User};
use tonic::{transport::Channel, Request};

pub use crate::proto::{
    auth_service_client::AuthServiceClient, post_service_client::PostServiceClient,
    CreatePostRequest, DeletePostRequest, GetPostRequest, ListPostsRequest, LoginRequest,
    PostPatch, RegisterRequest, UpdatePostRequest,
};

/// Procedure-call client. The acting user travels inside each mutating
/// message, so the client remembers the id returned by register or login.
#[derive(Debug, Clone)]
pub struct GrpcClient {
    auth_client: AuthServiceClient<Channel>,
    post_client: PostServiceClient<Channel>,
    user_id: Option<String>,
}

impl GrpcClient {
    pub async fn new(addr: impl Into<String>) -> Result<Self, BlogClientError> {
        let addr = addr.into();
        let channel = Channel::from_shared(addr)?.connect().await?;
        Ok(Self {
            auth_client: AuthServiceClient::new(channel.clone()),
            post_client: PostServiceClient::new(channel),
            user_id: None,
        })
    }

    pub fn set_user_id(&mut self, user_id: String) {
        self.user_id = Some(user_id);
    }

    pub fn clear_user_id(&mut self) {
        self.user_id = None;
    }

    fn acting_user(&self) -> Result<String, BlogClientError> {
        self.user_id.clone().ok_or(BlogClientError::MissingSession)
    }

    fn auth_response(
        &mut self,
        response: crate::proto::AuthResponse,
    ) -> Result<AuthResponse, BlogClientError> {
        let user = response
            .user
            .ok_or_else(|| BlogClientError::SerializationError("No user data in response".into()))
            .and_then(User::try_from)?;

        self.set_user_id(user.id.clone());

        Ok(AuthResponse {
            token: response.token,
            user,
        })
    }

    // Auth methods
    pub async fn register(
        &mut self,
        email: String,
        password: String,
        name: Option<String>,
    ) -> Result<AuthResponse, BlogClientError> {
        let request = Request::new(RegisterRequest {
            email,
            password,
            name,
        });

        let response = self.auth_client.clone().register(request).await?;
        self.auth_response(response.into_inner())
    }

    pub async fn login(
        &mut self,
        email: String,
        password: String,
    ) -> Result<AuthResponse, BlogClientError> {
        let request = Request::new(LoginRequest { email, password });

        let response = self.auth_client.clone().login(request).await?;
        self.auth_response(response.into_inner())
    }

    // Post methods
    pub async fn list_posts(&self, params: &ListPostsParams) -> Result<PostPage, BlogClientError> {
        let request = Request::new(ListPostsRequest {
            author_id: params.author_id.clone(),
            published_only: params.published_only,
            limit: params.limit.map(i64::from),
            page: params.page.map(|page| i64::try_from(page).unwrap_or(i64::MAX)),
        });

        let response = self.post_client.clone().list_posts(request).await?;
        PostPage::try_from(response.into_inner())
    }

    pub async fn get_post(&self, id: &str) -> Result<Post, BlogClientError> {
        let request = Request::new(GetPostRequest { id: id.to_string() });
        let response = self.post_client.clone().get_post(request).await?;
        Post::try_from(response.into_inner())
    }

    pub async fn create_post(&self, post: &NewPost) -> Result<Post, BlogClientError> {
        let request = Request::new(CreatePostRequest {
            title: post.title.clone(),
            content: post.content.clone(),
            author_id: self.acting_user()?,
            published: post.published,
        });

        let response = self.post_client.clone().create_post(request).await?;
        Post::try_from(response.into_inner())
    }

    pub async fn update_post(&self, id: &str, update: &PostUpdate) -> Result<Post, BlogClientError> {
        let request = Request::new(UpdatePostRequest {
            id: id.to_string(),
            patch: Some(PostPatch {
                title: update.title.clone(),
                content: update.content.clone(),
                published: update.published,
            }),
            user_id: self.acting_user()?,
        });

        let response = self.post_client.clone().update_post(request).await?;
        Post::try_from(response.into_inner())
    }

    pub async fn delete_post(&self, id: &str) -> Result<(), BlogClientError> {
        let request = Request::new(DeletePostRequest {
            id: id.to_string(),
            user_id: self.acting_user()?,
        });

        let response = self.post_client.clone().delete_post(request).await?;

        if response.into_inner().success {
            Ok(())
        } else {
            Err(BlogClientError::TransportError("delete was not confirmed".into()))
        }
    }
}
