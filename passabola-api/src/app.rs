/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use passabola_api::{app::{self, AppState}, config::Config};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let connector = app::connector_from_config(&config).await?;
/// let state = AppState::new(connector, config);
/// let app = app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{
    config::{BackendKind, Config},
    error::ApiError,
    middleware::security::SecurityHeadersLayer,
};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use passabola_shared::{
    backend::{
        hosted::{HostedConfig, HostedConnector},
        memory::MemoryBackend,
        Connector,
    },
    db::{
        migrations::run_migrations,
        pool::{create_pool, DatabaseConfig},
    },
    site::Site,
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Builds a backend client per request
    pub connector: Arc<dyn Connector>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(connector: Arc<dyn Connector>, config: Config) -> Self {
        Self {
            connector,
            config: Arc::new(config),
        }
    }
}

/// Builds the backend connector described by `config`
///
/// With `DATABASE_URL` set, the hosted backend reads and writes the site
/// tables directly and migrations are applied first.
pub async fn connector_from_config(config: &Config) -> anyhow::Result<Arc<dyn Connector>> {
    let backend = &config.backend;

    match backend.kind {
        BackendKind::Memory => {
            let secret = backend
                .jwt_secret
                .clone()
                .ok_or_else(|| anyhow::anyhow!("JWT_SECRET is required for BACKEND=memory"))?;
            tracing::warn!("Using in-memory backend; accounts and rows are lost on restart");
            Ok(Arc::new(MemoryBackend::new(secret)))
        }
        BackendKind::Hosted => {
            let url = backend
                .supabase_url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("SUPABASE_URL is required"))?;
            let anon_key = backend
                .anon_key
                .clone()
                .ok_or_else(|| anyhow::anyhow!("SUPABASE_ANON_KEY is required"))?;

            let mut connector = HostedConnector::new(HostedConfig {
                url,
                anon_key,
                jwt_secret: backend.jwt_secret.clone(),
            })?;

            if let Some(database_url) = &backend.database_url {
                let pool = create_pool(DatabaseConfig {
                    url: database_url.clone(),
                    ..Default::default()
                })
                .await?;
                run_migrations(&pool).await?;
                tracing::info!("Site tables served from Postgres");
                connector = connector.with_database(pool);
            }

            Ok(Arc::new(connector))
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                   # Health check
/// └── /v1/
///     ├── GET  /nav             # Navigation bar for ?path=
///     ├── GET  /session         # Settled session state and guard redirect
///     ├── GET  /news            # News, newest first
///     ├── GET  /dashboard       # Signed-in player's dashboard
///     ├── /auth/
///     │   ├── POST /login
///     │   └── POST /logout
///     └── /register/
///         ├── POST /player      # Account plus profile
///         └── POST /team        # Team owned by the signed-in user
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Site client (per `/v1` request, from the optional Bearer token)
/// 2. Logging (tower-http TraceLayer)
/// 3. CORS (tower-http CorsLayer)
/// 4. Security headers
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/login", post(routes::auth::login))
        .route("/logout", post(routes::auth::logout));

    let register_routes = Router::new()
        .route("/player", post(routes::register::register_player))
        .route("/team", post(routes::register::register_team));

    let v1_routes = Router::new()
        .route("/nav", get(routes::site::nav))
        .route("/session", get(routes::site::session))
        .route("/news", get(routes::news::list_news))
        .route("/dashboard", get(routes::dashboard::dashboard))
        .nest("/auth", auth_routes)
        .nest("/register", register_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            site_client_layer,
        ));

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
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
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
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
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Reads the optional Bearer token from the request
fn bearer_token(req: &Request) -> Result<Option<&str>, ApiError> {
    let Some(value) = req.headers().get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value
        .to_str()
        .map_err(|_| ApiError::BadRequest("Invalid authorization header".to_string()))?;

    value
        .strip_prefix("Bearer ")
        .map(|token| Some(token.trim()))
        .ok_or_else(|| ApiError::BadRequest("Expected Bearer token".to_string()))
}

/// Site client middleware layer
///
/// Connects to the backend as the caller (anonymous without a token) and
/// injects the opened [`Site`] into request extensions. Each request opens
/// its own site, so concurrent requests never see each other's form state.
async fn site_client_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // Request is not Sync; hold no borrow of it across the await
    let token = bearer_token(&req)?.map(str::to_owned);
    let client = state.connector.connect(token.as_deref()).await?;

    let site = Site::open(client, state.config.site.url.clone());
    req.extensions_mut().insert(Arc::new(site));

    Ok(next.run(req).await)
}
