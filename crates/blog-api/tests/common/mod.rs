//! Shared helpers for API integration tests

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use blog_api::{ApiServer, ApiServerConfig};
use blog_auth::{TokenCodec, TokenConfig};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt; // For `oneshot` method

pub struct TestApp {
    pub router: Router,
    pub codec: Arc<TokenCodec>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub www_authenticate: Option<String>,
    pub body: Value,
}

/// Router over an in-memory database with migrations applied
pub async fn spawn_app() -> TestApp {
    let db = blog_db::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    blog_db::migrate(&db)
        .await
        .expect("Failed to run migrations");

    let codec = Arc::new(TokenCodec::new(&TokenConfig {
        secret: "integration-test-secret".to_string(),
        issuer: "blog-api".to_string(),
        audience: "blog-clients".to_string(),
        access_token_ttl: chrono::Duration::hours(24),
    }));

    let server = ApiServer::new(ApiServerConfig::default(), db, codec.clone());

    TestApp {
        router: server.build_router(),
        codec,
    }
}

impl TestApp {
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let www_authenticate = response
            .headers()
            .get(header::WWW_AUTHENTICATE)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        // Framework rejections (bad path, bad JSON) are plain text
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            www_authenticate,
            body,
        }
    }

    /// Register a user and return its id
    pub async fn register(&self, username: &str, password: &str) -> i64 {
        let response = self
            .request(
                "POST",
                "/auth/register",
                None,
                Some(json!({
                    "username": username,
                    "email": format!("{}@example.com", username),
                    "password": password,
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["user"]["id"].as_i64().unwrap()
    }

    /// Log in and return the bearer token
    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .request(
                "POST",
                "/auth/login",
                None,
                Some(json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        response.body["token"].as_str().unwrap().to_string()
    }

    /// Register then log in
    pub async fn user_with_token(&self, username: &str) -> (i64, String) {
        let id = self.register(username, "secret1").await;
        let token = self.login(username, "secret1").await;
        (id, token)
    }

    /// Create a post and return its id
    pub async fn create_post(&self, token: &str, title: &str, content: &str) -> i64 {
        let response = self
            .request(
                "POST",
                "/posts",
                Some(token),
                Some(json!({ "title": title, "content": content })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["post"]["id"].as_i64().unwrap()
    }
}
