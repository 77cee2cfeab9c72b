/// Application state and router builder
///
/// This module defines the shared application state and provides a function
/// to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use trousseau_api::{app::AppState, config::Config};
/// use sqlx::MySqlPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = MySqlPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = trousseau_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, patch, post, put},
    Router,
};
use sqlx::MySqlPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use trousseau_shared::audit::{AuditSink, TracingAuditSink};

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor; the pool
/// and sink are cheap handle clones.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: MySqlPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Audit collaborator for mutating operations
    pub audit: Arc<dyn AuditSink>,
}

impl AppState {
    /// Creates new application state with the default tracing audit sink
    pub fn new(db: MySqlPool, config: Config) -> Self {
        Self::with_audit(db, config, Arc::new(TracingAuditSink))
    }

    /// Creates new application state with an explicit audit sink
    pub fn with_audit(db: MySqlPool, config: Config, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            audit,
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                               # Health check
/// └── /v1/
///     ├── /companies/                       # Company directory
///     │   ├── GET    /          GET /parents   GET /hierarchy
///     │   ├── GET    /:id       GET /:id/children
///     │   └── POST   /          PUT /:id       DELETE /:id
///     ├── /personnel/                       # Personnel directory
///     │   ├── GET    /          GET /by-company/:company_id
///     │   ├── GET    /:id       POST /login
///     │   └── POST   /          PUT /:id       DELETE /:id
///     └── /keys/                            # Key registry + sharing
///         ├── GET    /          GET /visible   GET /stats/summary
///         ├── GET    /shared-with/:company_id
///         ├── GET    /:id       GET /:id/shares   GET /:id/shared-with
///         ├── POST   /          PUT /:id       PATCH /:id/status
///         ├── DELETE /:id
///         └── POST   /:id/share DELETE /:id/share/:company_id
/// ```
///
/// # Middleware Stack
///
/// 1. Request logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer, origins from configuration)
/// 3. Security headers on every response
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let company_routes = Router::new()
        .route("/", get(routes::companies::list_companies))
        .route("/", post(routes::companies::create_company))
        .route("/parents", get(routes::companies::list_parents))
        .route("/hierarchy", get(routes::companies::get_hierarchy))
        .route("/:id", get(routes::companies::get_company))
        .route("/:id", put(routes::companies::update_company))
        .route("/:id", delete(routes::companies::delete_company))
        .route("/:id/children", get(routes::companies::list_children));

    let personnel_routes = Router::new()
        .route("/", get(routes::personnel::list_personnel))
        .route("/", post(routes::personnel::create_personnel))
        .route(
            "/by-company/:company_id",
            get(routes::personnel::list_by_company),
        )
        .route("/login", post(routes::personnel::login))
        .route("/:id", get(routes::personnel::get_personnel))
        .route("/:id", put(routes::personnel::update_personnel))
        .route("/:id", delete(routes::personnel::delete_personnel));

    let key_routes = Router::new()
        .route("/", get(routes::keys::list_keys))
        .route("/", post(routes::keys::create_key))
        .route("/visible", get(routes::keys::list_visible_keys))
        .route("/stats/summary", get(routes::keys::key_stats))
        .route(
            "/shared-with/:company_id",
            get(routes::keys::list_keys_shared_with),
        )
        .route("/:id", get(routes::keys::get_key))
        .route("/:id", put(routes::keys::update_key))
        .route("/:id", delete(routes::keys::delete_key))
        .route("/:id/status", patch(routes::keys::update_key_status))
        .route("/:id/shares", get(routes::keys::list_key_shares))
        .route("/:id/shared-with", get(routes::keys::list_shared_companies))
        .route("/:id/share", post(routes::keys::share_key))
        .route("/:id/share/:company_id", delete(routes::keys::unshare_key));

    let v1_routes = Router::new()
        .nest("/companies", company_routes)
        .nest("/personnel", personnel_routes)
        .nest("/keys", key_routes);

    // Permissive CORS in development, explicit origins in production
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(axum::middleware::from_fn(
            crate::middleware::security_headers,
        ))
        .with_state(state)
}
