/// Common test utilities for the API integration tests
///
/// Every test gets its own router over a fresh in-memory store, so tests are
/// independent and need no database.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use storefront_api::app::{build_router, AppState};
use storefront_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig};
use storefront_shared::store::{MemoryStore, Store};
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test-secret-key-at-least-32-bytes-long";
pub const STRONG_PASSWORD: &str = "Str0ng!Pass";

/// Test context containing the router and its backing store
pub struct TestContext {
    pub app: axum::Router,
    pub store: Arc<dyn Store>,
    pub config: Config,
}

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            run_migrations: false,
        },
        database: DatabaseConfig {
            url: "postgresql://unused/unused".to_string(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
        },
    }
}

impl TestContext {
    pub fn new() -> Self {
        let config = test_config();
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let app = build_router(AppState::new(store.clone(), config.clone()));

        Self { app, store, config }
    }

    /// Sends a request and returns the status with the parsed JSON body
    ///
    /// An empty body comes back as `Value::Null`.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                panic!(
                    "{} returned non-JSON body: {}",
                    uri,
                    String::from_utf8_lossy(&bytes)
                )
            })
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None, None).await
    }

    pub async fn post(&self, uri: &str, body: Value, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body), token).await
    }

    /// Creates the default admin and returns (admin id, access token)
    pub async fn bootstrap_admin(&self) -> (String, String) {
        let (status, body) = self
            .send(Method::POST, "/v1/auth/bootstrap-admin", None, None)
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);

        let admin_id = body["data"]["admin_id"].as_str().unwrap().to_string();
        let password = body["data"]["temporary_password"].as_str().unwrap();
        let token = self.login("admin", password).await;
        (admin_id, token)
    }

    /// Logs in and returns the access token
    pub async fn login(&self, login: &str, password: &str) -> String {
        let (status, body) = self
            .post(
                "/v1/auth/login",
                serde_json::json!({ "login": login, "password": password }),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["access_token"].as_str().unwrap().to_string()
    }

    /// Registers a user with a strong password and returns its id
    pub async fn create_user(&self, username: &str) -> String {
        let (status, body) = self
            .post(
                "/v1/users",
                serde_json::json!({
                    "name": format!("{} Tester", username),
                    "username": username,
                    "email": format!("{}@example.com", username),
                    "password": STRONG_PASSWORD,
                }),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["id"].as_str().unwrap().to_string()
    }
}
