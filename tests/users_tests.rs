mod common;

use axum::http::StatusCode;
use common::{PASSWORD, bearer, create_test_app};
use serde_json::json;

#[tokio::test]
async fn test_register_user() {
    let app = create_test_app().await;

    let (status, json) = app
        .send(
            "POST",
            "/api/users",
            None,
            Some(json!({ "email": "  alice@example.com ", "password": PASSWORD })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["email"], "alice@example.com");
    assert_eq!(json["upgraded"], false);
    assert!(json["id"].as_str().is_some());
    assert!(json["created_at"].as_str().is_some());
    assert!(json.get("hashed_password").is_none());
    assert!(json.get("password").is_none());
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let app = create_test_app().await;
    app.register("alice@example.com").await;

    let (status, _) = app
        .send(
            "POST",
            "/api/users",
            None,
            Some(json!({ "email": "ALICE@example.com", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_validation() {
    let app = create_test_app().await;

    for body in [
        json!({ "email": "", "password": PASSWORD }),
        json!({ "email": "   ", "password": PASSWORD }),
        json!({ "email": "no-at-sign", "password": PASSWORD }),
        json!({ "email": "alice@example.com", "password": "short" }),
    ] {
        let (status, _) = app.send("POST", "/api/users", None, Some(body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    }
}

#[tokio::test]
async fn test_password_is_stored_hashed() {
    let app = create_test_app().await;
    app.register("alice@example.com").await;

    let user = app
        .db
        .users()
        .get_by_email("alice@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_ne!(user.hashed_password, PASSWORD);
    assert!(user.hashed_password.starts_with("$argon2id$"));
}

#[tokio::test]
async fn test_update_own_credentials() {
    let app = create_test_app().await;
    let (id, token) = app.user_with_token("alice@example.com").await;

    let (status, json) = app
        .send(
            "PUT",
            "/api/users",
            Some(&bearer(&token)),
            Some(json!({ "email": "alice@new.example.com", "password": "a brand new password" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], id.to_string());
    assert_eq!(json["email"], "alice@new.example.com");

    let (status, _) = app
        .send(
            "POST",
            "/api/login",
            None,
            Some(json!({ "email": "alice@example.com", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, json) = app
        .send(
            "POST",
            "/api/login",
            None,
            Some(json!({ "email": "alice@new.example.com", "password": "a brand new password" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], id.to_string());
}

#[tokio::test]
async fn test_update_requires_bearer() {
    let app = create_test_app().await;

    let (status, _) = app
        .send(
            "PUT",
            "/api/users",
            None,
            Some(json!({ "email": "alice@example.com", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_update_to_taken_email() {
    let app = create_test_app().await;
    app.register("bob@example.com").await;
    let (_, token) = app.user_with_token("alice@example.com").await;

    let (status, _) = app
        .send(
            "PUT",
            "/api/users",
            Some(&bearer(&token)),
            Some(json!({ "email": "bob@example.com", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}
