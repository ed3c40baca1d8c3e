//! End-to-end API tests over the full router
//!
//! Covers the whole request path: access-control middleware, session
//! handlers, the generic CRUD dispatcher and the error-to-response mapping.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tower::ServiceExt;

use unihub::api::{AppState, create_router};
use unihub::auth::{AuthService, TokenBlacklist, TokenService, password};
use unihub::config::AuthConfig;
use unihub::store::{Entity, MemoryStore, Store};

const SEED_EMAIL: &str = "alice@example.com";
const SEED_PASSWORD: &str = "hunter42";

/// Build a router over a fresh store seeded with one admin user.
async fn test_app() -> Router {
    let store = Arc::new(MemoryStore::new());

    let hash = password::hash_password(SEED_PASSWORD).unwrap();
    store
        .create(
            Entity::User,
            json!({
                "name": "Alice",
                "email": SEED_EMAIL,
                "password": hash,
                "role": "admin"
            })
            .as_object()
            .cloned()
            .unwrap(),
        )
        .await
        .unwrap();

    let auth_config = AuthConfig::default();
    let tokens = TokenService::new("test-secret", Duration::from_secs(3600));
    let auth = Arc::new(AuthService::new(
        tokens,
        Arc::new(TokenBlacklist::new()),
        Arc::clone(&store) as Arc<dyn Store>,
    ));

    let state = Arc::new(AppState::new(store, auth));
    create_router(state, &auth_config)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(t) = token {
        builder = builder.header("token", t);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn login(app: &Router) -> String {
    let (status, body) = send(
        app,
        post_json(
            "/login",
            None,
            json!({"email": SEED_EMAIL, "password": SEED_PASSWORD}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("Login successful"));
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn login_then_create_course() {
    // GIVEN: a logged-in user
    let app = test_app().await;
    let token = login(&app).await;

    // WHEN: creating a course with the token in the raw `token` header
    let (status, body) = send(
        &app,
        post_json(
            "/course",
            Some(&token),
            json!({
                "name": "Data Engineering",
                "university_id": 1,
                "fees": 12000,
                "duration": 2,
                "intake": "autumn",
                "link": "https://example.edu/de"
            }),
        ),
    )
    .await;

    // THEN: created, with the new row id in the result
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("Course created successfully"));
    assert!(body["result"]["id"].is_i64());
}

#[tokio::test]
async fn logout_revokes_the_token_immediately() {
    // GIVEN: a valid session
    let app = test_app().await;
    let token = login(&app).await;

    // WHEN: logging out
    let (status, body) = send(&app, post_json("/logout", Some(&token), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("Logout successful"));

    // THEN: the same token is refused on a protected write
    let (status, body) = send(
        &app,
        post_json("/course", Some(&token), json!({"name": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], json!("You're logged out"));

    // AND: a second logout reports the session already closed
    let (status, body) = send(&app, post_json("/logout", Some(&token), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("Already logged out"));
}

#[tokio::test]
async fn protected_write_without_token_is_refused() {
    let app = test_app().await;

    let (status, body) = send(&app, post_json("/university", None, json!({}))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], json!("Missing token"));
}

#[tokio::test]
async fn garbage_token_is_refused() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        post_json("/university", Some("not.a.jwt"), json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], json!("Invalid token"));
}

#[tokio::test]
async fn reads_are_public() {
    // GET on a protected group passes the gate without any token
    let app = test_app().await;

    let (status, body) = send(&app, get("/ielts?id=7")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("Ielts retrieved successfully"));
    assert_eq!(body["result"], Value::Null);
}

#[tokio::test]
async fn invalid_payload_reports_field_errors() {
    // Scenario: POST /pte with overall=95 (scores are 10-90)
    let app = test_app().await;
    let token = login(&app).await;

    let (status, body) = send(
        &app,
        post_json(
            "/pte",
            Some(&token),
            json!({"reading": 60, "listening": 60, "writing": 60, "speaking": 60, "overall": 95}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("Invalid input"));
    let errors = body["errors"].as_array().unwrap();
    assert!(errors.iter().any(|e| e["field"] == json!("overall")));
}

#[tokio::test]
async fn unknown_route_is_404() {
    let app = test_app().await;

    let (status, body) = send(&app, get("/foobar")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], json!("Not found"));
}

#[tokio::test]
async fn unsupported_method_on_entity_route_is_405() {
    let app = test_app().await;
    let token = login(&app).await;

    let request = Request::builder()
        .method("PATCH")
        .uri("/university")
        .header("token", &token)
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["message"], json!("Method not allowed"));
}

#[tokio::test]
async fn update_with_no_usable_fields_is_400() {
    let app = test_app().await;
    let token = login(&app).await;

    let create = post_json(
        "/university",
        Some(&token),
        json!({"name": "Aalto", "country": "Finland", "campus_name": "Otaniemi", "city": "Espoo"}),
    );
    let (status, body) = send(&app, create).await;
    assert_eq!(status, StatusCode::OK);
    let id = body["result"]["id"].as_i64().unwrap();

    let request = Request::builder()
        .method("PUT")
        .uri("/university")
        .header("content-type", "application/json")
        .header("token", &token)
        .body(Body::from(json!({"id": id, "name": "", "city": 0}).to_string()))
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("No valid fields to update"));
}

#[tokio::test]
async fn login_with_wrong_password_is_401() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        post_json(
            "/login",
            None,
            json!({"email": SEED_EMAIL, "password": "wrong"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    // Unknown email and wrong password are indistinguishable to the caller
    assert_eq!(body["message"], json!("Invalid email or password"));
}

#[tokio::test]
async fn login_without_credentials_is_400() {
    let app = test_app().await;

    let (status, body) = send(&app, post_json("/login", None, json!({}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], json!("Missing email or password"));
}

#[tokio::test]
async fn user_registration_is_open_by_default() {
    // The users group is not in the default protected list
    let app = test_app().await;

    let (status, body) = send(
        &app,
        post_json(
            "/users",
            None,
            json!({
                "name": "Bob",
                "email": "bob@example.com",
                "password": "secret99",
                "role": "student"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("User created successfully"));

    // The fresh account can log in
    let (status, _) = send(
        &app,
        post_json(
            "/login",
            None,
            json!({"email": "bob@example.com", "password": "secret99"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn root_route_greets() {
    let app = test_app().await;

    let (status, body) = send(&app, get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("Welcome to the University API"));
}
