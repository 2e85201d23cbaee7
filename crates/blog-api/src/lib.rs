pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod validation;

use axum::{
    http::{header, Method},
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::{future::Future, net::SocketAddr, sync::Arc};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use blog_auth::{AuthService, CredentialStore, TokenCodec};
use blog_db::DbCredentialStore;
use sea_orm::DatabaseConnection;

pub use config::BlogConfig;
pub use error::ApiError;

/// Application state shared across handlers
pub struct AppState {
    pub db: DatabaseConnection,
    pub store: Arc<dyn CredentialStore>,
    pub auth: AuthService,
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "bearer_auth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Access token from `POST /auth/login`:\n\n\
                            ```\nAuthorization: Bearer <token>\n```",
                        ))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Blog API",
        description = "REST API for a multi-user blog: accounts, posts and comments"
    ),
    paths(
        handlers::system::health_check,
        handlers::auth::register,
        handlers::auth::login,
        handlers::posts::list_posts,
        handlers::posts::get_post,
        handlers::posts::create_post,
        handlers::posts::update_post,
        handlers::posts::delete_post,
        handlers::comments::list_post_comments,
        handlers::comments::create_comment,
        handlers::comments::delete_comment,
    ),
    components(
        schemas(
            models::HealthResponse,
            models::ErrorResponse,
            models::MessageResponse,
            models::RegisterRequest,
            models::RegisterResponse,
            models::LoginRequest,
            models::LoginResponse,
            models::User,
            models::Author,
            models::Post,
            models::PostList,
            models::CreatePostRequest,
            models::UpdatePostRequest,
            models::PostResponse,
            models::Comment,
            models::CommentList,
            models::CreateCommentRequest,
            models::CommentResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration and login"),
        (name = "posts", description = "Blog posts"),
        (name = "comments", description = "Comments on posts"),
        (name = "system", description = "System health and info endpoints")
    )
)]
pub struct ApiDoc;

/// API server configuration
pub struct ApiServerConfig {
    /// Address to bind the API server
    pub bind_addr: SocketAddr,
    /// Enable CORS (for development)
    pub enable_cors: bool,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 9090)),
            enable_cors: true,
        }
    }
}

impl From<&config::ServerSettings> for ApiServerConfig {
    fn from(settings: &config::ServerSettings) -> Self {
        Self {
            bind_addr: settings.bind_addr,
            enable_cors: settings.enable_cors,
        }
    }
}

/// API Server
pub struct ApiServer {
    config: ApiServerConfig,
    state: Arc<AppState>,
    codec: Arc<TokenCodec>,
}

impl ApiServer {
    /// Create a new API server over a migrated database
    pub fn new(config: ApiServerConfig, db: DatabaseConnection, codec: Arc<TokenCodec>) -> Self {
        let store: Arc<dyn CredentialStore> = Arc::new(DbCredentialStore::new(db.clone()));
        let auth = AuthService::new(store.clone(), codec.clone());

        let state = Arc::new(AppState { db, store, auth });

        Self {
            config,
            state,
            codec,
        }
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let jwt_state = Arc::new(middleware::JwtState::new(self.codec.clone()));

        // Build PUBLIC routes (no authentication required)
        let public_router = Router::new()
            .route("/health", get(handlers::health_check))
            .route("/api/openapi.json", get(handlers::openapi_json))
            .route("/auth/register", post(handlers::register))
            .route("/auth/login", post(handlers::login))
            .route("/posts", get(handlers::list_posts))
            .route("/posts/{id}", get(handlers::get_post))
            .route("/posts/{id}/comments", get(handlers::list_post_comments))
            .with_state(self.state.clone());

        // Build PROTECTED routes (require a bearer token)
        let protected_router = Router::new()
            .route("/posts", post(handlers::create_post))
            .route(
                "/posts/{id}",
                put(handlers::update_post).delete(handlers::delete_post),
            )
            .route("/comments", post(handlers::create_comment))
            .route("/comments/{id}", delete(handlers::delete_comment))
            .with_state(self.state.clone())
            .layer(axum_middleware::from_fn_with_state(
                jwt_state,
                middleware::require_auth,
            ));

        let mut router = public_router
            .merge(protected_router)
            .layer(TraceLayer::new_for_http());

        if self.config.enable_cors {
            let cors = CorsLayer::new()
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
                .allow_origin(Any);
            router = router.layer(cors);
        }

        router
    }

    /// Serve until `shutdown` resolves
    pub async fn start<F>(self, shutdown: F) -> Result<(), anyhow::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.build_router();

        info!("Starting API server on {}", self.config.bind_addr);
        info!(
            "OpenAPI spec: http://{}/api/openapi.json",
            self.config.bind_addr
        );

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

        info!("API server stopped");
        Ok(())
    }
}
