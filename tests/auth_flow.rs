//! End-to-end tests driving the real router over in-memory state.

use authd_backend::auth::models::UserUpdate;
use authd_backend::auth::{
    password::BcryptHasher, AuthService, AuthState, JwtCodec, MemoryUserStore, RefreshRegistry,
};
use authd_backend::routes::router;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;

fn test_state() -> AuthState {
    let store = Arc::new(MemoryUserStore::new());
    let hasher = Arc::new(BcryptHasher::with_cost(4));
    let codec = Arc::new(JwtCodec::new(
        "access-secret-12345".to_string(),
        1,
        "refresh-secret-12345".to_string(),
        24,
    ));
    let registry = Arc::new(RefreshRegistry::new());
    let service = Arc::new(AuthService::new(store, hasher, codec.clone(), registry));
    AuthState { service, codec }
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register(app: &Router, email: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        "POST",
        "/users/register",
        None,
        Some(json!({ "email": email, "password": password, "name": "Test" })),
    )
    .await
}

async fn login(app: &Router, email: &str, password: &str) -> (String, String) {
    let (status, body) = send(
        app,
        "POST",
        "/users/login",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    (
        body["token"].as_str().unwrap().to_string(),
        body["refresh_token"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn test_register_login_refresh_lifecycle() {
    let app = router(test_state());

    // Registration succeeds with the default role.
    let (status, body) = register(&app, "alice@example.com", "pw123456").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], "alice@example.com");
    assert_eq!(body["roles"], json!(["user"]));
    assert!(body.get("password_hash").is_none());

    // Second registration with the same email conflicts.
    let (status, body) = register(&app, "alice@example.com", "other-pw").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Email already in use");

    // Login yields two distinct non-empty tokens.
    let (access, refresh) = login(&app, "alice@example.com", "pw123456").await;
    assert!(!access.is_empty());
    assert!(!refresh.is_empty());
    assert_ne!(access, refresh);

    // Refresh rotates in a brand-new pair.
    let (status, body) = send(
        &app,
        "POST",
        "/users/refresh",
        None,
        Some(json!({ "refresh_token": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let new_access = body["token"].as_str().unwrap();
    let new_refresh = body["refresh_token"].as_str().unwrap();
    assert_ne!(new_access, access);
    assert_ne!(new_refresh, refresh);

    // Replaying the spent refresh token is rejected before its expiry.
    let (status, body) = send(
        &app,
        "POST",
        "/users/refresh",
        None,
        Some(json!({ "refresh_token": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid or expired token");
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = router(test_state());
    register(&app, "alice@example.com", "pw123456").await;

    let (unknown_status, unknown_body) = send(
        &app,
        "POST",
        "/users/login",
        None,
        Some(json!({ "email": "ghost@example.com", "password": "pw123456" })),
    )
    .await;
    let (wrong_status, wrong_body) = send(
        &app,
        "POST",
        "/users/login",
        None,
        Some(json!({ "email": "alice@example.com", "password": "wrongpassword" })),
    )
    .await;

    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, wrong_status);
    assert_eq!(unknown_body, wrong_body);
}

#[tokio::test]
async fn test_authorization_header_discipline() {
    let app = router(test_state());

    // No header at all.
    let (status, body) = send(&app, "GET", "/admin/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Authentication token not provided");

    // Exactly "Bearer" with no token segment is a malformed header, not an
    // authentication failure.
    let request = Request::builder()
        .method("GET")
        .uri("/admin/users")
        .header("Authorization", "Bearer")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Wrong scheme.
    let request = Request::builder()
        .method("GET")
        .uri("/admin/users")
        .header("Authorization", "Basic abc123")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Well-formed header, garbage token.
    let (status, _) = send(&app, "GET", "/admin/users", Some("not.a.token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_role_gate_on_admin_routes() {
    let state = test_state();
    let app = router(state.clone());

    register(&app, "alice@example.com", "pw123456").await;
    register(&app, "carol@example.com", "pw123456").await;

    // Elevate carol before she logs in, so her token carries the role.
    let carol = state.service.get_by_email("carol@example.com").unwrap();
    state
        .service
        .update(
            &carol.id,
            UserUpdate {
                roles: Some(vec!["user".to_string(), "admin".to_string()]),
                ..Default::default()
            },
        )
        .unwrap();

    let (user_token, _) = login(&app, "alice@example.com", "pw123456").await;
    let (admin_token, _) = login(&app, "carol@example.com", "pw123456").await;

    // Plain user is authenticated but forbidden.
    let (status, body) = send(&app, "GET", "/admin/users", Some(&user_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Access denied: insufficient permissions");

    // Admin passes both gates.
    let (status, body) = send(&app, "GET", "/admin/users", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_admin_user_management() {
    let state = test_state();
    let app = router(state.clone());

    register(&app, "alice@example.com", "pw123456").await;
    register(&app, "admin@example.com", "pw123456").await;

    let admin = state.service.get_by_email("admin@example.com").unwrap();
    state
        .service
        .update(
            &admin.id,
            UserUpdate {
                roles: Some(vec!["admin".to_string()]),
                ..Default::default()
            },
        )
        .unwrap();
    let (admin_token, _) = login(&app, "admin@example.com", "pw123456").await;

    let alice = state.service.get_by_email("alice@example.com").unwrap();

    // Get by id.
    let (status, body) = send(
        &app,
        "GET",
        &format!("/admin/users/{}", alice.id),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "alice@example.com");

    // Invalid id is a bad request, not a lookup miss.
    let (status, _) = send(
        &app,
        "GET",
        "/admin/users/not-a-uuid",
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Partial update.
    let (status, body) = send(
        &app,
        "PUT",
        &format!("/admin/users/{}", alice.id),
        Some(&admin_token),
        Some(json!({ "name": "Alice Renamed", "roles": ["user", "auditor"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Alice Renamed");
    assert_eq!(body["roles"], json!(["user", "auditor"]));

    // Emptying the role set is refused.
    let (status, _) = send(
        &app,
        "PUT",
        &format!("/admin/users/{}", alice.id),
        Some(&admin_token),
        Some(json!({ "roles": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Delete, then the record is gone.
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/admin/users/{}", alice.id),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "GET",
        &format!("/admin/users/{}", alice.id),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_logout_blacklists_refresh_token() {
    let app = router(test_state());

    register(&app, "alice@example.com", "pw123456").await;
    let (access, refresh) = login(&app, "alice@example.com", "pw123456").await;

    // Logout requires authentication.
    let (status, _) = send(
        &app,
        "POST",
        "/users/logout",
        None,
        Some(json!({ "refresh_token": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        "POST",
        "/users/logout",
        Some(&access),
        Some(json!({ "refresh_token": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Logout successful");

    // The blacklisted refresh token can no longer fund a rotation.
    let (status, _) = send(
        &app,
        "POST",
        "/users/refresh",
        None,
        Some(json!({ "refresh_token": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The access token itself stays valid until expiry: logout does not
    // revoke it.
    let (status, _) = send(
        &app,
        "POST",
        "/users/logout",
        Some(&access),
        Some(json!({ "refresh_token": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_required_field_validation() {
    let app = router(test_state());

    let (status, _) = send(
        &app,
        "POST",
        "/users/register",
        None,
        Some(json!({ "password": "pw123456" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/users/register",
        None,
        Some(json!({ "email": "alice@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, "POST", "/users/refresh", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Refresh token not provided");
}

#[tokio::test]
async fn test_health_is_public() {
    let app = router(test_state());

    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}
