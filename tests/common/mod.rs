use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Method, Request},
    middleware,
    routing::get,
    Router,
};
use chrono::Utc;
use fixpoint_api::{
    auth::{AuthConfig, AuthService},
    db,
    entities::user::{self, UserRole},
    events::{self, EventSender},
    handlers::AppServices,
    middleware_helpers::request_id::request_id_middleware,
    services::users::CreateUserInput,
    AppState,
};
use sea_orm::{ConnectionTrait, DatabaseBackend as DbBackend, Statement};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

const TEST_JWT_SECRET: &str =
    "integration_test_secret_key_that_is_at_least_64_characters_long_0123456789";

/// Helper harness for spinning up an application state backed by a
/// SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    token: String,
    #[allow(dead_code)]
    auth_service: Arc<AuthService>,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let db_file = "fixpoint_test.db";
        let _ = std::fs::remove_file(db_file);

        let pool = db::establish_connection(&format!("sqlite://{db_file}?mode=rwc"))
            .await
            .expect("failed to create test database");

        // Ensure a clean schema for each test run.
        let reset_statements = [
            "DROP TABLE IF EXISTS repair_orders;",
            "DROP TABLE IF EXISTS warranty_registrations;",
            "DROP TABLE IF EXISTS products;",
            "DROP TABLE IF EXISTS customers;",
            "DROP TABLE IF EXISTS users;",
        ];
        for sql in reset_statements {
            let _ = pool
                .execute(Statement::from_string(DbBackend::Sqlite, sql.to_string()))
                .await;
        }

        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let auth_cfg = AuthConfig::new(
            TEST_JWT_SECRET.to_string(),
            "fixpoint-api".to_string(),
            "fixpoint-clients".to_string(),
            Duration::from_secs(3600),
        );
        let auth_service = Arc::new(AuthService::new(auth_cfg, db_arc.clone()));

        let services = AppServices::new(db_arc.clone(), Arc::new(event_sender.clone()));

        let config = test_config();
        let state = AppState {
            db: db_arc,
            config,
            event_sender,
            services,
        };

        // Issue an admin token without touching the users table; only
        // repairs need real accounts (technicians), seeded per test.
        let admin = user::Model {
            id: Uuid::new_v4(),
            first_name: "Test".to_string(),
            last_name: "Admin".to_string(),
            username: "test-admin".to_string(),
            password_hash: String::new(),
            role: UserRole::Admin,
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
        };
        let access_token = auth_service
            .issue_token(&admin)
            .expect("encode access token");

        let router = Router::new()
            .route("/", get(|| async { "fixpoint-api up" }))
            .nest("/api/v1", fixpoint_api::api_v1_routes())
            .layer(middleware::from_fn_with_state(
                auth_service.clone(),
                fixpoint_api::auth::session_middleware,
            ))
            .layer(middleware::from_fn(request_id_middleware))
            .with_state(state.clone());

        Self {
            router,
            state,
            token: access_token,
            auth_service,
            _event_task: event_task,
        }
    }

    /// Access the bearer token for the default admin user.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Convenience helper for authenticated JSON requests.
    pub async fn request_authenticated(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        self.request(method, uri, body, Some(self.token())).await
    }

    /// Seeds an active technician and returns the account.
    pub async fn seed_technician(&self, username: &str) -> user::Model {
        self.state
            .services
            .users
            .create_user(CreateUserInput {
                first_name: "Tech".to_string(),
                last_name: username.to_string(),
                username: username.to_string(),
                password: "a-strong-test-password".to_string(),
                role: UserRole::Technician,
            })
            .await
            .expect("seed technician for tests")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

fn test_config() -> fixpoint_api::config::AppConfig {
    // Deserialize through the config crate so defaults stay in one
    // place instead of being repeated here.
    let raw = config::Config::builder()
        .set_default("database_url", "sqlite://fixpoint_test.db?mode=rwc")
        .unwrap()
        .set_default("jwt_secret", TEST_JWT_SECRET)
        .unwrap()
        .set_default("jwt_expiration", 3600)
        .unwrap()
        .set_default("host", "127.0.0.1")
        .unwrap()
        .set_default("port", 18080)
        .unwrap()
        .set_default("environment", "development")
        .unwrap()
        .build()
        .unwrap();
    raw.try_deserialize().expect("test config deserializes")
}
