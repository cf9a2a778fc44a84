pub mod error;
pub mod grpc_client;
pub mod http_client;
pub mod models;

pub mod proto {
    tonic::include_proto!("postboard");
}

use error::BlogClientError;
use models::{AuthResponse, ListPostsParams, NewPost, Post, PostPage, PostUpdate};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Transport type for the client
#[derive(Debug, Clone, PartialEq)]
pub enum Transport {
    /// HTTP transport with base URL (e.g., "http://localhost:3000")
    Http(String),
    /// gRPC transport with server address (e.g., "http://localhost:50051")
    Grpc(String),
}

/// Credentials of a signed-in user. HTTP calls send the token; gRPC calls
/// send the user id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user_id: String,
}

#[derive(Debug)]
enum Backend {
    Http(Mutex<http_client::HttpClient>),
    Grpc(Mutex<grpc_client::GrpcClient>),
}

/// Unified client that can use either HTTP or gRPC transport
#[derive(Debug, Clone)]
pub struct BlogClient {
    transport: Transport,
    backend: Arc<Backend>,
    session: Arc<Mutex<Option<Session>>>,
}

impl BlogClient {
    /// Create a new client with the specified transport
    pub async fn new(transport: Transport) -> Result<Self, BlogClientError> {
        let backend = match &transport {
            Transport::Http(base_url) => {
                Backend::Http(Mutex::new(http_client::HttpClient::new(base_url.clone())))
            }
            Transport::Grpc(addr) => {
                Backend::Grpc(Mutex::new(grpc_client::GrpcClient::new(addr.clone()).await?))
            }
        };

        Ok(Self {
            transport,
            backend: Arc::new(backend),
            session: Arc::new(Mutex::new(None)),
        })
    }

    /// Restore a previously stored session
    pub async fn set_session(&self, session: Session) {
        match self.backend.as_ref() {
            Backend::Http(client) => client.lock().await.set_token(session.token.clone()),
            Backend::Grpc(client) => client.lock().await.set_user_id(session.user_id.clone()),
        }
        *self.session.lock().await = Some(session);
    }

    pub async fn session(&self) -> Option<Session> {
        self.session.lock().await.clone()
    }

    /// Forget the current session (logout)
    pub async fn clear_session(&self) {
        match self.backend.as_ref() {
            Backend::Http(client) => client.lock().await.clear_token(),
            Backend::Grpc(client) => client.lock().await.clear_user_id(),
        }
        *self.session.lock().await = None;
    }

    async fn remember(&self, auth: &AuthResponse) {
        *self.session.lock().await = Some(Session {
            token: auth.token.clone(),
            user_id: auth.user.id.clone(),
        });
    }

    /// Register a new user and sign in as them
    pub async fn register(
        &self,
        email: impl Into<String>,
        password: impl Into<String>,
        name: Option<String>,
    ) -> Result<AuthResponse, BlogClientError> {
        let email = email.into();
        let password = password.into();

        tracing::debug!("Register called for email: {}", email);

        let auth = match self.backend.as_ref() {
            Backend::Http(client) => {
                client
                    .lock()
                    .await
                    .register(models::RegisterRequest {
                        email,
                        password,
                        name,
                    })
                    .await?
            }
            Backend::Grpc(client) => client.lock().await.register(email, password, name).await?,
        };

        self.remember(&auth).await;
        Ok(auth)
    }

    /// Login with email and password
    pub async fn login(
        &self,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<AuthResponse, BlogClientError> {
        let email = email.into();
        let password = password.into();

        tracing::debug!("Login called for email: {}", email);

        let auth = match self.backend.as_ref() {
            Backend::Http(client) => {
                client
                    .lock()
                    .await
                    .login(models::LoginRequest { email, password })
                    .await?
            }
            Backend::Grpc(client) => client.lock().await.login(email, password).await?,
        };

        self.remember(&auth).await;
        Ok(auth)
    }

    /// List posts with filters and pagination
    pub async fn list_posts(&self, params: &ListPostsParams) -> Result<PostPage, BlogClientError> {
        match self.backend.as_ref() {
            Backend::Http(client) => client.lock().await.list_posts(params).await,
            Backend::Grpc(client) => client.lock().await.list_posts(params).await,
        }
    }

    /// Get a post by ID
    pub async fn get_post(&self, id: &str) -> Result<Post, BlogClientError> {
        match self.backend.as_ref() {
            Backend::Http(client) => client.lock().await.get_post(id).await,
            Backend::Grpc(client) => client.lock().await.get_post(id).await,
        }
    }

    /// Create a new post (requires a session)
    pub async fn create_post(&self, post: &NewPost) -> Result<Post, BlogClientError> {
        match self.backend.as_ref() {
            Backend::Http(client) => client.lock().await.create_post(post).await,
            Backend::Grpc(client) => client.lock().await.create_post(post).await,
        }
    }

    /// Update a post (requires a session, must be author)
    pub async fn update_post(&self, id: &str, update: &PostUpdate) -> Result<Post, BlogClientError> {
        if update.is_empty() {
            return Err(BlogClientError::InvalidRequest("No fields to update".into()));
        }

        match self.backend.as_ref() {
            Backend::Http(client) => client.lock().await.update_post(id, update).await,
            Backend::Grpc(client) => client.lock().await.update_post(id, update).await,
        }
    }

    /// Delete a post (requires a session, must be author)
    pub async fn delete_post(&self, id: &str) -> Result<(), BlogClientError> {
        match self.backend.as_ref() {
            Backend::Http(client) => client.lock().await.delete_post(id).await,
            Backend::Grpc(client) => client.lock().await.delete_post(id).await,
        }
    }

    /// Check if the client is using HTTP transport
    pub fn is_http(&self) -> bool {
        matches!(self.transport, Transport::Http(_))
    }

    /// Check if the client is using gRPC transport
    pub fn is_grpc(&self) -> bool {
        matches!(self.transport, Transport::Grpc(_))
    }

    /// Get the current transport URL/address
    pub fn transport_url(&self) -> String {
        match &self.transport {
            Transport::Http(url) => url.clone(),
            Transport::Grpc(addr) => addr.clone(),
        }
    }
}
