use crate::application::{AuthService, ListPostsQuery, PostService};
use crate::domain::post::{
    CreatePostRequest as DomainCreatePostRequest, PostPatch as DomainPostPatch, PostResponse,
};
use crate::domain::user::{
    LoginUserRequest as DomainLoginRequest, RegisterUserRequest as DomainRegisterRequest,
    UserResponse,
};
use crate::domain::{DomainError, ErrorKind, PostId, UserId};
use crate::proto::*;
use std::sync::Arc;
use tonic::{Request, Response, Status};

/// Status code by error kind; the message is the public one.
pub fn map_domain_error(err: DomainError) -> Status {
    let message = err.public_message();
    match err.kind() {
        ErrorKind::InvalidInput => Status::invalid_argument(message),
        ErrorKind::NotFound => Status::not_found(message),
        ErrorKind::NotAuthorized => Status::permission_denied(message),
        ErrorKind::Unauthenticated => Status::unauthenticated(message),
        ErrorKind::Internal => {
            tracing::error!("gRPC call failed: {}", err);
            Status::internal(message)
        }
    }
}

fn user_to_proto(user: UserResponse) -> User {
    User {
        id: user.id.to_string(),
        email: user.email,
        name: user.name,
        created_at: user.created_at.to_rfc3339(),
    }
}

fn post_to_proto(post: PostResponse) -> Post {
    Post {
        id: post.id.to_string(),
        title: post.title,
        content: post.content,
        author_id: post.author_id.to_string(),
        published: post.published,
        created_at: post.created_at.to_rfc3339(),
        updated_at: post.updated_at.to_rfc3339(),
    }
}

#[derive(Clone)]
pub struct PostboardGrpcService {
    auth_service: Arc<AuthService>,
    post_service: Arc<PostService>,
}

impl PostboardGrpcService {
    pub fn new(auth_service: Arc<AuthService>, post_service: Arc<PostService>) -> Self {
        Self {
            auth_service,
            post_service,
        }
    }
}

#[tonic::async_trait]
impl auth_service_server::AuthService for PostboardGrpcService {
    async fn register(
        &self,
        request: Request<RegisterRequest>,
    ) -> Result<Response<AuthResponse>, Status> {
        let req = request.into_inner();

        let register_req = DomainRegisterRequest {
            email: req.email,
            password: req.password,
            name: req.name,
        };

        let (token, user) = self
            .auth_service
            .register(register_req)
            .await
            .map_err(map_domain_error)?;

        Ok(Response::new(AuthResponse {
            token,
            user: Some(user_to_proto(user)),
        }))
    }

    async fn login(
        &self,
        request: Request<LoginRequest>,
    ) -> Result<Response<AuthResponse>, Status> {
        let req = request.into_inner();

        let login_req = DomainLoginRequest {
            email: req.email,
            password: req.password,
        };

        let (token, user) = self
            .auth_service
            .login(login_req)
            .await
            .map_err(map_domain_error)?;

        Ok(Response::new(AuthResponse {
            token,
            user: Some(user_to_proto(user)),
        }))
    }
}

#[tonic::async_trait]
impl post_service_server::PostService for PostboardGrpcService {
    async fn list_posts(
        &self,
        request: Request<ListPostsRequest>,
    ) -> Result<Response<ListPostsResponse>, Status> {
        let req = request.into_inner();

        let query = ListPostsQuery {
            author_id: req.author_id,
            published_only: req.published_only,
            limit: req.limit.map(|limit| limit as f64),
            page: req.page.map(|page| page as f64),
        };

        let window = self
            .post_service
            .list_posts(query)
            .await
            .map_err(map_domain_error)?;

        Ok(Response::new(ListPostsResponse {
            items: window.items.into_iter().map(post_to_proto).collect(),
            page: window.page,
            limit: window.limit,
            total: window.total,
            total_pages: window.total_pages,
            has_next_page: window.has_next_page,
        }))
    }

    async fn get_post(&self, request: Request<GetPostRequest>) -> Result<Response<Post>, Status> {
        let id = PostId::parse(&request.into_inner().id).map_err(map_domain_error)?;

        match self.post_service.get_post(id).await {
            Ok(Some(post)) => Ok(Response::new(post_to_proto(post))),
            Ok(None) => Err(map_domain_error(DomainError::PostNotFound)),
            Err(err) => Err(map_domain_error(err)),
        }
    }

    async fn create_post(
        &self,
        request: Request<CreatePostRequest>,
    ) -> Result<Response<Post>, Status> {
        let req = request.into_inner();
        let author_id = UserId::parse_author(&req.author_id).map_err(map_domain_error)?;

        let create_req = DomainCreatePostRequest {
            title: req.title,
            content: req.content,
            published: req.published,
        };

        let post = self
            .post_service
            .create_post(author_id, create_req)
            .await
            .map_err(map_domain_error)?;

        Ok(Response::new(post_to_proto(post)))
    }

    async fn update_post(
        &self,
        request: Request<UpdatePostRequest>,
    ) -> Result<Response<Post>, Status> {
        let req = request.into_inner();
        let id = PostId::parse(&req.id).map_err(map_domain_error)?;
        let user_id = UserId::parse(&req.user_id).map_err(map_domain_error)?;

        // a missing patch message is an empty patch
        let patch = req
            .patch
            .map(|patch| DomainPostPatch {
                title: patch.title,
                content: patch.content,
                published: patch.published,
            })
            .unwrap_or_default();

        let post = self
            .post_service
            .update_post(id, user_id, patch)
            .await
            .map_err(map_domain_error)?;

        Ok(Response::new(post_to_proto(post)))
    }

    async fn delete_post(
        &self,
        request: Request<DeletePostRequest>,
    ) -> Result<Response<DeletePostResponse>, Status> {
        let req = request.into_inner();
        let id = PostId::parse(&req.id).map_err(map_domain_error)?;
        let user_id = UserId::parse(&req.user_id).map_err(map_domain_error)?;

        self.post_service
            .delete_post(id, user_id)
            .await
            .map_err(map_domain_error)?;

        Ok(Response::new(DeletePostResponse { success: true }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PostAction;
    use rstest::rstest;
    use tonic::Code;

    #[rstest]
    #[case(DomainError::InvalidLimit, Code::InvalidArgument)]
    #[case(DomainError::EmailAlreadyRegistered, Code::InvalidArgument)]
    #[case(DomainError::PostNotFound, Code::NotFound)]
    #[case(DomainError::NotAuthorized(PostAction::Delete), Code::PermissionDenied)]
    #[case(DomainError::InvalidCredentials, Code::Unauthenticated)]
    #[case(DomainError::Database("timeout".into()), Code::Internal)]
    fn status_code_follows_the_error_kind(#[case] err: DomainError, #[case] code: Code) {
        assert_eq!(map_domain_error(err).code(), code);
    }

    #[test]
    fn internal_status_hides_details() {
        let status = map_domain_error(DomainError::Database("connection refused".into()));
        assert_eq!(status.message(), "Internal server error");
    }
}
