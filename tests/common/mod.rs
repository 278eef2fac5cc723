#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chirpgate::{ServerConfig, create_app, db::Database, jwt::JwtConfig, session::SessionPolicy};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

pub const JWT_SECRET: &[u8] = b"test-jwt-secret-that-is-long-enough";
pub const API_KEY: &str = "f271c81ff7084ee5b99a5091b42d486e";
pub const PASSWORD: &str = "correct horse battery";

pub struct TestApp {
    pub app: Router,
    pub db: Database,
    pub jwt: JwtConfig,
}

pub async fn create_test_app() -> TestApp {
    create_test_app_with_policy(SessionPolicy::default()).await
}

pub async fn create_test_app_with_policy(policy: SessionPolicy) -> TestApp {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    let config = ServerConfig {
        db: db.clone(),
        jwt_secret: JWT_SECRET.to_vec(),
        api_key: API_KEY.to_string(),
        policy,
        sweep_interval: None,
    };

    TestApp {
        app: create_app(&config),
        db,
        jwt: JwtConfig::new(JWT_SECRET),
    }
}

impl TestApp {
    /// Send a request with an optional raw `Authorization` value and JSON body.
    /// Returns the status and the parsed body (`Null` when empty).
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        authorization: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
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
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        (status, json)
    }

    /// Register a user and return its id.
    pub async fn register(&self, email: &str) -> Uuid {
        let (status, json) = self
            .send(
                "POST",
                "/api/users",
                None,
                Some(serde_json::json!({ "email": email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {json}");
        Uuid::parse_str(json["id"].as_str().unwrap()).unwrap()
    }

    /// Log in with the shared test password and return the response body.
    pub async fn login(&self, email: &str) -> Value {
        let (status, json) = self
            .send(
                "POST",
                "/api/login",
                None,
                Some(serde_json::json!({ "email": email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {json}");
        json
    }

    /// Register and log in, returning the user id and its access token.
    pub async fn user_with_token(&self, email: &str) -> (Uuid, String) {
        let id = self.register(email).await;
        let login = self.login(email).await;
        (id, login["token"].as_str().unwrap().to_string())
    }
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}
