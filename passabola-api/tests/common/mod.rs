#![allow(dead_code)]

//! Common test utilities for integration tests
//!
//! Builds the full router over an in-memory backend, so the tests need no
//! network or database:
//! - Test configuration
//! - Seeded accounts and rows
//! - Request helpers returning status and JSON body

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use passabola_api::{
    app::{build_router, AppState},
    config::Config,
};
use passabola_shared::{
    backend::{memory::MemoryBackend, Connector},
    models::{news::News, player_stats::PlayerStats, profile::Profile},
};
use serde_json::{json, Value};
use std::{collections::HashMap, sync::Arc};
use tower::Service as _;
use uuid::Uuid;

pub const JWT_SECRET: &str = "test-secret-key-at-least-32-bytes-long";
pub const PASSWORD: &str = "segredo123";

/// Test context containing all necessary resources
pub struct TestContext {
    pub backend: MemoryBackend,
    pub app: axum::Router,
    pub config: Config,
}

impl TestContext {
    pub fn new() -> Self {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("BACKEND", "memory"),
            ("JWT_SECRET", JWT_SECRET),
            ("SITE_URL", "https://passaabola.test"),
        ]);
        let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
            .expect("test config");

        let backend = MemoryBackend::new(JWT_SECRET);
        let connector: Arc<dyn Connector> = Arc::new(backend.clone());
        let app = build_router(AppState::new(connector, config.clone()));

        Self {
            backend,
            app,
            config,
        }
    }

    /// Sends a request and returns the status and JSON body (`Null` if empty)
    pub async fn send(
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
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                panic!("non-JSON body ({}): {}", status, String::from_utf8_lossy(&bytes))
            })
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    /// Creates an account with a profile and returns its id
    pub async fn player(&self, email: &str) -> Uuid {
        let identity = self
            .backend
            .add_user(email, PASSWORD, json!({}))
            .await
            .unwrap();

        self.backend
            .seed_profile(profile(identity.id, "Marta Vieira da Silva", Some("Marta")))
            .await;

        identity.id
    }

    /// Signs in through the API and returns the access token
    pub async fn login(&self, email: &str) -> String {
        let (status, body) = self
            .post(
                "/v1/auth/login",
                None,
                json!({ "email": email, "password": PASSWORD }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);

        body["session"]["access_token"]
            .as_str()
            .expect("access token")
            .to_string()
    }
}

pub fn profile(id: Uuid, full_name: &str, nickname: Option<&str>) -> Profile {
    Profile {
        id,
        full_name: full_name.to_string(),
        nickname: nickname.map(str::to_string),
        position: Some("Atacante".to_string()),
        birth_date: None,
        phone: None,
        avatar_url: None,
        created_at: None,
        updated_at: None,
    }
}

pub fn stats(player_id: Uuid, goals: Option<i32>) -> PlayerStats {
    PlayerStats {
        id: Uuid::new_v4(),
        player_id: Some(player_id),
        matches_played: Some(12),
        goals,
        assists: Some(4),
        yellow_cards: None,
        red_cards: Some(0),
        created_at: None,
        updated_at: None,
    }
}

pub fn news(title: &str, published_at: &str) -> News {
    News {
        id: Uuid::new_v4(),
        title: title.to_string(),
        content: format!("{} - conteúdo", title),
        image_url: None,
        author_id: None,
        published_at: Some(published_at.parse().unwrap()),
        created_at: None,
    }
}
