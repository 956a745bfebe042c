/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - Test database setup (migrations run on first connect)
/// - Test user creation with a live session token
/// - Request helpers for driving the router
///
/// The tests need a running PostgreSQL reachable via `DATABASE_URL`
/// and are `#[ignore]`d so `cargo test` stays green without one.

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use sqlx::PgPool;
use tidylist_api::app::{build_router, AppState};
use tidylist_api::config::Config;
use tidylist_shared::auth::password;
use tidylist_shared::db::migrations::run_migrations;
use tidylist_shared::models::user::{CreateUser, User};
use tower::Service as _;
use uuid::Uuid;

/// Test context containing all necessary resources
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    pub state: AppState,
    pub user: User,
    pub session_token: String,
}

impl TestContext {
    /// Creates a new test context with a fresh user and session
    pub async fn new() -> anyhow::Result<Self> {
        let config = Config::from_env()?;

        let db = PgPool::connect(&config.database.url).await?;
        run_migrations(&db).await?;

        // Unique email per context so tests don't collide
        let user = User::create(
            &db,
            CreateUser {
                email: format!("test-{}@example.com", Uuid::new_v4()),
                password_hash: password::hash_password("test-password-123")?,
            },
        )
        .await?;

        let state = AppState::new(db.clone(), config);
        let session_token = state.sessions.create(user.id);
        let app = build_router(state.clone());

        Ok(TestContext {
            db,
            app,
            state,
            user,
            session_token,
        })
    }

    /// Creates a second user with their own session, for ownership tests
    pub async fn other_user(&self) -> anyhow::Result<(User, String)> {
        let user = User::create(
            &self.db,
            CreateUser {
                email: format!("other-{}@example.com", Uuid::new_v4()),
                password_hash: password::hash_password("other-password-123")?,
            },
        )
        .await?;

        let token = self.state.sessions.create(user.id);
        Ok((user, token))
    }

    /// Sends an authenticated JSON request and returns the response
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
        token: Option<&str>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.app.clone().call(request).await.unwrap()
    }

    /// Sends a request authenticated as the context's user
    pub async fn authed(
        &self,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> Response<Body> {
        self.request(method, uri, body, Some(&self.session_token))
            .await
    }

    /// Cleans up test data
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        // Deleting the user cascades to lists and todos
        User::delete(&self.db, self.user.id).await?;
        Ok(())
    }
}

/// Reads a response body as JSON, panicking with the body text on
/// unexpected status
pub async fn json_body(response: Response<Body>, expected: StatusCode) -> serde_json::Value {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    if status != expected {
        panic!(
            "Expected {}, got {}: {}",
            expected,
            status,
            String::from_utf8_lossy(&bytes)
        );
    }

    serde_json::from_slice(&bytes).unwrap()
}

/// Creates a list through the API and returns its id
pub async fn create_test_list(ctx: &TestContext, name: &str) -> Uuid {
    let response = ctx
        .authed(
            "POST",
            "/v1/lists",
            Some(serde_json::json!({ "name": name })),
        )
        .await;

    let body = json_body(response, StatusCode::OK).await;
    body["id"].as_str().unwrap().parse().unwrap()
}

/// Creates a todo through the API and returns its id
pub async fn create_test_todo(ctx: &TestContext, list_id: Uuid, title: &str) -> Uuid {
    let response = ctx
        .authed(
            "POST",
            "/v1/todos",
            Some(serde_json::json!({ "list_id": list_id, "title": title })),
        )
        .await;

    let body = json_body(response, StatusCode::OK).await;
    body["id"].as_str().unwrap().parse().unwrap()
}
