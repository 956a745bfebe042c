/// Application state and router builder
///
/// This module defines the shared application state and provides a
/// function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use tidylist_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = tidylist_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post, put},
    Router,
};
use chrono::Duration;
use sqlx::PgPool;
use std::sync::Arc;
use tidylist_shared::auth::session::SessionStore;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use uuid::Uuid;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
/// Cloning is cheap: the pool is internally reference-counted and the
/// rest sits behind Arcs.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// In-memory session store
    pub sessions: Arc<SessionStore>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        let ttl = Duration::seconds(config.session.ttl_seconds as i64);
        Self {
            db,
            sessions: Arc::new(SessionStore::with_ttl(ttl)),
            config: Arc::new(config),
        }
    }
}

/// Identity of the authenticated requester
///
/// Inserted into request extensions by the session middleware after the
/// bearer token resolves; handlers extract it with `Extension`.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// The session token the request authenticated with
    pub token: String,
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                        # Health check (public)
/// └── /v1/                           # API v1 (versioned)
///     ├── /auth/
///     │   ├── POST /register         # Create account (public)
///     │   ├── POST /login            # Start session (public)
///     │   └── POST /logout           # End session (authenticated)
///     ├── /lists/                    # (authenticated)
///     │   ├── GET    /               # Lists in position order
///     │   ├── POST   /               # Create list
///     │   ├── POST   /reorder        # Bulk reorder
///     │   ├── GET    /:id            # Fetch one list
///     │   ├── PUT    /:id            # Update name/description/color
///     │   ├── DELETE /:id            # Delete (cascades to todos)
///     │   ├── POST   /:id/move       # Move to a target index
///     │   └── GET    /:id/todos      # Todos, searchable/filterable
///     └── /todos/                    # (authenticated)
///         ├── POST   /               # Create todo
///         ├── POST   /reorder        # Bulk reorder within a list
///         ├── GET    /:id            # Fetch one todo
///         ├── PUT    /:id            # Update fields
///         ├── DELETE /:id            # Delete
///         ├── POST   /:id/toggle     # Flip completion
///         └── POST   /:id/move       # Move to a target index
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Session authentication (per-route-group)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes: register/login are public, logout needs a session
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route(
            "/logout",
            post(routes::auth::logout).layer(axum::middleware::from_fn_with_state(
                state.clone(),
                session_auth_layer,
            )),
        );

    // List routes (require a valid session)
    let list_routes = Router::new()
        .route("/", get(routes::lists::list_lists))
        .route("/", post(routes::lists::create_list))
        .route("/reorder", post(routes::lists::reorder_lists))
        .route("/:id", get(routes::lists::get_list))
        .route("/:id", put(routes::lists::update_list))
        .route("/:id", axum::routing::delete(routes::lists::delete_list))
        .route("/:id/move", post(routes::lists::move_list))
        .route("/:id/todos", get(routes::lists::list_todos))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_auth_layer,
        ));

    // Todo routes (require a valid session)
    let todo_routes = Router::new()
        .route("/", post(routes::todos::create_todo))
        .route("/reorder", post(routes::todos::reorder_todos))
        .route("/:id", get(routes::todos::get_todo))
        .route("/:id", put(routes::todos::update_todo))
        .route("/:id", axum::routing::delete(routes::todos::delete_todo))
        .route("/:id/toggle", post(routes::todos::toggle_todo))
        .route("/:id/move", post(routes::todos::move_todo))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_auth_layer,
        ));

    // Build complete v1 API
    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/lists", list_routes)
        .nest("/todos", todo_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        // Production mode: configure allowed origins
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
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    // Combine all routes with middleware stack
    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Session authentication middleware layer
///
/// Extracts the bearer token from the Authorization header, resolves it
/// against the session store, and injects an AuthContext into request
/// extensions. An expired session resolves to nothing and is rejected
/// exactly like a missing one.
async fn session_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, crate::error::ApiError> {
    // Extract Authorization header
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            crate::error::ApiError::Unauthorized("Missing authorization header".to_string())
        })?;

    // Parse Bearer token
    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        crate::error::ApiError::BadRequest("Expected Bearer token".to_string())
    })?;

    // Resolve against the session store
    let user_id = state.sessions.resolve(token).ok_or_else(|| {
        crate::error::ApiError::Unauthorized("Invalid or expired session".to_string())
    })?;

    let auth_context = AuthContext {
        user_id,
        token: token.to_string(),
    };

    // Insert into request extensions
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
