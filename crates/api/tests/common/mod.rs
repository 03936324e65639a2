#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use congress_api::services::{Notifier, OutboxMailer};
use congress_api::{create_router, AppState};
use congress_config::{AppConfig, BootstrapAdmin, Environment, StorageKind};
use congress_storage::MemoryStorageBackend;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

pub const ADMIN_EMAIL: &str = "root@congress.test";
pub const ADMIN_PASSWORD: &str = "root-password";
pub const PASSWORD: &str = "participant-pass";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub outbox: Arc<OutboxMailer>,
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.environment = Environment::Dev;
    config.database.backend = StorageKind::Memory;
    config.auth.jwt_secret = "integration-test-secret".to_string();
    config.auth.password_iterations = 1_000;
    config.congress.registration_fee_cents = 15_000;
    config.bootstrap_admin = Some(BootstrapAdmin {
        email: ADMIN_EMAIL.to_string(),
        password: ADMIN_PASSWORD.to_string(),
        full_name: "Root Admin".to_string(),
    });
    config
}

pub async fn spawn_app() -> TestApp {
    let outbox = Arc::new(OutboxMailer::default());
    let notifier = Arc::new(Notifier::with_mailer(outbox.clone()));
    let storage = Arc::new(MemoryStorageBackend::new());

    let state = AppState::with_storage(test_config(), storage, notifier).unwrap();
    state.bootstrap_admin().await.unwrap();

    TestApp {
        router: create_router(state.clone()),
        state,
        outbox,
    }
}

impl TestApp {
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn login(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .post(
                "/api/auth/login",
                None,
                json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["data"]["token"].as_str().unwrap().to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    /// Register and log in; returns `(user_id, token)`
    pub async fn register(&self, name: &str, email: &str) -> (String, String) {
        let (status, body) = self
            .post(
                "/api/auth/register",
                None,
                json!({
                    "full_name": name,
                    "email": email,
                    "password": PASSWORD,
                    "institution": "Instituto Tecnologico",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        let id = body["data"]["id"].as_str().unwrap().to_string();
        (id, self.login(email, PASSWORD).await)
    }

    pub async fn qr_payload(&self, token: &str) -> String {
        let (status, body) = self.get("/api/auth/me", Some(token)).await;
        assert_eq!(status, StatusCode::OK);
        body["data"]["qr_payload"].as_str().unwrap().to_string()
    }

    /// Create an activity as the bootstrap admin; returns its id
    pub async fn create_activity(
        &self,
        admin_token: &str,
        title: &str,
        kind: &str,
        capacity: Option<i32>,
        price_cents: i64,
    ) -> String {
        let starts_at = Utc::now() + Duration::days(1);
        let (status, body) = self
            .post(
                "/api/activities",
                Some(admin_token),
                json!({
                    "title": title,
                    "description": "Hands-on session",
                    "kind": kind,
                    "starts_at": starts_at,
                    "ends_at": starts_at + Duration::hours(2),
                    "capacity": capacity,
                    "price_cents": price_cents,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create activity failed: {}", body);
        body["data"]["id"].as_str().unwrap().to_string()
    }
}
