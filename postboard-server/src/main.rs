use dotenvy::dotenv;
use std::sync::Arc;

use postboard_server::application::{AuthService, PostService};
use postboard_server::data::{
    MemoryStore, PostRepository, PostgresPostRepository, PostgresUserRepository, UserRepository,
};
use postboard_server::infrastructure::{
    config::{AppConfig, StorageBackend},
    database::{create_pool, run_migrations},
    jwt::JwtService,
    logging::init_logging,
    seed::seed_demo_data,
};
use postboard_server::presentation::{grpc_service::PostboardGrpcService, http_handlers};

type Repositories = (
    Arc<dyn PostRepository + Send + Sync>,
    Arc<dyn UserRepository + Send + Sync>,
);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    init_logging();

    let config = AppConfig::from_env()?;

    tracing::info!("Starting postboard server...");
    tracing::info!("Storage backend: {:?}", config.storage);
    tracing::info!("HTTP server will listen on {}", config.http_addr());
    tracing::info!("gRPC server will listen on {}", config.grpc_addr());

    let (post_repo, user_repo) = open_storage(&config).await?;

    let jwt_service = Arc::new(JwtService::new(&config.jwt_secret)?);
    let clock: Arc<dyn mockable::Clock> = Arc::new(mockable::DefaultClock);

    let auth_service = Arc::new(AuthService::new(user_repo.clone(), jwt_service));
    let post_service = Arc::new(PostService::new(post_repo, user_repo.clone(), clock));

    if let Some(seed) = &config.seed {
        let inserted = seed_demo_data(seed, user_repo.as_ref(), &post_service).await?;
        tracing::info!("Demo data seeded: {} new posts", inserted);
    }

    tracing::info!("Services initialized successfully");

    let http_server = tokio::spawn(run_http_server(
        config.http_addr(),
        auth_service.clone(),
        post_service.clone(),
        config.cors_allowed_origins.clone(),
    ));

    let grpc_server = tokio::spawn(run_grpc_server(
        config.grpc_addr(),
        auth_service,
        post_service,
    ));

    // Wait for either server to stop
    tokio::select! {
        result = http_server => match result {
            Ok(Ok(())) => tracing::info!("HTTP server stopped"),
            Ok(Err(e)) => tracing::error!("HTTP server error: {}", e),
            Err(e) => tracing::error!("HTTP server task failed: {}", e),
        },
        result = grpc_server => match result {
            Ok(Ok(())) => tracing::info!("gRPC server stopped"),
            Ok(Err(e)) => tracing::error!("gRPC server error: {}", e),
            Err(e) => tracing::error!("gRPC server task failed: {}", e),
        },
    }

    tracing::info!("Shutting down...");
    Ok(())
}

async fn open_storage(config: &AppConfig) -> anyhow::Result<Repositories> {
    match config.storage {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, data is lost on restart");
            let store = Arc::new(MemoryStore::new());
            let post_repo: Arc<dyn PostRepository + Send + Sync> = store.clone();
            let user_repo: Arc<dyn UserRepository + Send + Sync> = store;
            Ok((post_repo, user_repo))
        }
        StorageBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;

            tracing::info!("Connecting to database...");
            let pool = create_pool(database_url, config.database_max_connections).await?;

            tracing::info!("Running database migrations...");
            run_migrations(&pool).await?;

            let post_repo: Arc<dyn PostRepository + Send + Sync> =
                Arc::new(PostgresPostRepository::new(pool.clone()));
            let user_repo: Arc<dyn UserRepository + Send + Sync> =
                Arc::new(PostgresUserRepository::new(pool));
            Ok((post_repo, user_repo))
        }
    }
}

/// CORS policy for the browser front-end.
fn configure_cors(allowed_origins: &[String]) -> actix_cors::Cors {
    use actix_cors::Cors;
    use actix_web::http::header;

    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PATCH", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
        ])
        .max_age(3600);

    for origin in allowed_origins {
        cors = cors.allowed_origin(origin);
        tracing::debug!("Added allowed CORS origin: {}", origin);
    }

    cors
}

async fn run_http_server(
    addr: String,
    auth_service: Arc<AuthService>,
    post_service: Arc<PostService>,
    cors_allowed_origins: Vec<String>,
) -> anyhow::Result<()> {
    use actix_web::{middleware::Logger, web, App, HttpServer};

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(configure_cors(&cors_allowed_origins))
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(post_service.clone()))
            .configure(http_handlers::routes)
    })
    .bind(&addr)?
    .run();

    tracing::info!("HTTP server running on {}", addr);

    server.await?;

    Ok(())
}

async fn run_grpc_server(
    addr: String,
    auth_service: Arc<AuthService>,
    post_service: Arc<PostService>,
) -> anyhow::Result<()> {
    use postboard_server::proto::{
        auth_service_server::AuthServiceServer, post_service_server::PostServiceServer,
    };
    use tonic::transport::Server;

    let grpc_service = PostboardGrpcService::new(auth_service, post_service);

    let addr = addr.parse()?;

    tracing::info!("gRPC server running on {}", addr);

    Server::builder()
        .add_service(AuthServiceServer::new(grpc_service.clone()))
        .add_service(PostServiceServer::new(grpc_service))
        .serve(addr)
        .await?;

    Ok(())
}
