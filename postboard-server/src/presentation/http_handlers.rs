use crate::application::{AuthService, PostService};
use crate::domain::user::{LoginUserRequest, RegisterUserRequest};
use crate::domain::{DomainError, PostId};
use crate::presentation::dto::{
    AuthPayload, CreatePostBody, DataEnvelope, DeletedPayload, ListPostsParams, PatchPostBody,
};
use crate::presentation::error::ErrorEnvelope;
use crate::presentation::session::{AuthUser, MaybeUser};
use actix_web::{web, HttpResponse};
use std::sync::Arc;

/// Mounts the JSON API. Expects `web::Data<Arc<AuthService>>` and
/// `web::Data<Arc<PostService>>` to be registered on the app.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _| {
                tracing::debug!("Rejected request body: {}", err);
                DomainError::InvalidRequestBody.into()
            }),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _| {
                tracing::debug!("Rejected query string: {}", err);
                DomainError::InvalidRequestBody.into()
            }),
    )
    .service(
        web::scope("/api/auth")
            .route("/register", web::post().to(register))
            .route("/login", web::post().to(login)),
    )
    .service(
        web::scope("/api/posts")
            .route("", web::get().to(list_posts))
            .route("", web::post().to(create_post))
            .route("/{id}", web::get().to(get_post))
            .route("/{id}", web::patch().to(update_post))
            .route("/{id}", web::delete().to(delete_post)),
    );
}

// ============== Auth Handlers ==============

pub async fn register(
    auth_service: web::Data<Arc<AuthService>>,
    req: web::Json<RegisterUserRequest>,
) -> Result<HttpResponse, DomainError> {
    let (token, user) = auth_service.register(req.into_inner()).await?;
    Ok(HttpResponse::Created().json(DataEnvelope::new(AuthPayload { token, user })))
}

pub async fn login(
    auth_service: web::Data<Arc<AuthService>>,
    req: web::Json<LoginUserRequest>,
) -> Result<HttpResponse, DomainError> {
    let (token, user) = auth_service.login(req.into_inner()).await?;
    Ok(HttpResponse::Ok().json(DataEnvelope::new(AuthPayload { token, user })))
}

// ============== Post Handlers ==============

pub async fn list_posts(
    post_service: web::Data<Arc<PostService>>,
    MaybeUser(session): MaybeUser,
    query: web::Query<ListPostsParams>,
) -> Result<HttpResponse, DomainError> {
    let query = query.into_inner().into_query(session);

    tracing::info!(
        "Listing posts: limit={:?}, page={:?}, author_id={:?}, published_only={:?}",
        query.limit,
        query.page,
        query.author_id,
        query.published_only
    );

    let window = post_service.list_posts(query).await?;
    Ok(HttpResponse::Ok().json(DataEnvelope::new(window)))
}

pub async fn get_post(
    post_service: web::Data<Arc<PostService>>,
    path: web::Path<String>,
) -> Result<HttpResponse, DomainError> {
    let post_id = PostId::parse(&path)?;

    tracing::info!("Getting post with id={}", post_id);

    // A plain lookup miss answers "Not found"; mutations say "Post not found".
    match post_service.get_post(post_id).await? {
        Some(post) => Ok(HttpResponse::Ok().json(DataEnvelope::new(post))),
        None => Ok(HttpResponse::NotFound().json(ErrorEnvelope::new("Not found"))),
    }
}

pub async fn create_post(
    post_service: web::Data<Arc<PostService>>,
    AuthUser(user_id): AuthUser,
    body: web::Json<CreatePostBody>,
) -> Result<HttpResponse, DomainError> {
    let req = body.into_inner().try_into()?;

    tracing::info!("Creating post for user_id={}", user_id);

    let post = post_service.create_post(user_id, req).await?;
    Ok(HttpResponse::Created().json(DataEnvelope::new(post)))
}

pub async fn update_post(
    post_service: web::Data<Arc<PostService>>,
    AuthUser(user_id): AuthUser,
    path: web::Path<String>,
    body: web::Json<PatchPostBody>,
) -> Result<HttpResponse, DomainError> {
    let post_id = PostId::parse(&path)?;
    let patch = body.into_inner().try_into()?;

    tracing::info!("Updating post id={} for user_id={}", post_id, user_id);

    let post = post_service.update_post(post_id, user_id, patch).await?;
    Ok(HttpResponse::Ok().json(DataEnvelope::new(post)))
}

pub async fn delete_post(
    post_service: web::Data<Arc<PostService>>,
    AuthUser(user_id): AuthUser,
    path: web::Path<String>,
) -> Result<HttpResponse, DomainError> {
    let post_id = PostId::parse(&path)?;

    tracing::info!("Deleting post id={} for user_id={}", post_id, user_id);

    post_service.delete_post(post_id, user_id).await?;
    Ok(HttpResponse::Ok().json(DataEnvelope::new(DeletedPayload { success: true })))
}
