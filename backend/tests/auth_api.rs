use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    routing::post,
    Router,
};
use chrono::{Duration, Utc};
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;

use gatekeeper_backend::{
    handlers::auth,
    models::session::Session,
    state::AppState,
    utils::{cookies::REFRESH_COOKIE_NAME, password::verify_password},
};

mod support;

async fn migrate_db(pool: &PgPool) {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .expect("run migrations");
}

async fn integration_guard() -> tokio::sync::MutexGuard<'static, ()> {
    static GUARD: std::sync::OnceLock<tokio::sync::Mutex<()>> = std::sync::OnceLock::new();
    GUARD
        .get_or_init(|| tokio::sync::Mutex::new(()))
        .lock()
        .await
}

fn auth_router(pool: PgPool) -> Router {
    let state = AppState::new(pool, support::test_config());
    Router::new()
        .route("/api/v1/auth/sign-up", post(auth::sign_up))
        .route("/api/v1/auth/sign-in", post(auth::sign_in))
        .with_state(state)
}

fn post_json(uri: &str, payload: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build request")
}

async fn find_user_row(pool: &PgPool, email: &str) -> Option<(String, String)> {
    sqlx::query_as::<_, (String, String)>(
        "SELECT id, password_hash FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await
    .expect("fetch user row")
}

async fn find_session_for_user(pool: &PgPool, user_id: &str) -> Option<Session> {
    sqlx::query_as::<_, Session>(
        "SELECT id, user_id, refresh_token, expires_at, created_at, user_agent, ip_address, \
         revoked FROM sessions WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .expect("fetch session row")
}

#[tokio::test]
async fn sign_up_creates_user_and_hides_password() {
    let _guard = integration_guard().await;
    let pool = support::test_pool().await;
    migrate_db(&pool).await;

    let email = support::unique_email();
    let response = auth_router(pool.clone())
        .oneshot(post_json(
            "/api/v1/auth/sign-up",
            json!({ "name": "Ann", "email": email, "password": "longpass1" }),
        ))
        .await
        .expect("sign-up request");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = support::response_json(response).await;
    assert!(payload["user"]["id"].is_string());
    assert_eq!(payload["user"]["name"], "Ann");
    assert_eq!(payload["user"]["email"], email);
    assert!(payload["user"]["createdAt"].is_string());
    assert!(payload["user"].get("password").is_none());
    assert!(payload["user"].get("password_hash").is_none());

    let (_, password_hash) = find_user_row(&pool, &email).await.expect("user stored");
    assert_ne!(password_hash, "longpass1");
    assert!(verify_password("longpass1", &password_hash).unwrap());
}

#[tokio::test]
async fn sign_up_rejects_invalid_payload() {
    let _guard = integration_guard().await;
    let pool = support::test_pool().await;
    migrate_db(&pool).await;

    let response = auth_router(pool.clone())
        .oneshot(post_json(
            "/api/v1/auth/sign-up",
            json!({ "name": "", "email": "not-an-email", "password": "short" }),
        ))
        .await
        .expect("sign-up request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = support::response_json(response).await;
    assert_eq!(payload["message"], "Validation failed");
    assert!(payload["errors"]["name"].is_array());
    assert!(payload["errors"]["email"].is_array());
    assert!(payload["errors"]["password"].is_array());
}

#[tokio::test]
async fn sign_up_rejects_whitespace_only_name() {
    let _guard = integration_guard().await;
    let pool = support::test_pool().await;
    migrate_db(&pool).await;

    let response = auth_router(pool.clone())
        .oneshot(post_json(
            "/api/v1/auth/sign-up",
            json!({ "name": "   ", "email": support::unique_email(), "password": "longpass1" }),
        ))
        .await
        .expect("sign-up request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = support::response_json(response).await;
    assert_eq!(payload["errors"]["name"][0], "Name is required");
}

#[tokio::test]
async fn sign_up_rejects_duplicate_email() {
    let _guard = integration_guard().await;
    let pool = support::test_pool().await;
    migrate_db(&pool).await;

    let email = support::unique_email();
    let payload = json!({ "name": "Ann", "email": email, "password": "longpass1" });

    let first = auth_router(pool.clone())
        .oneshot(post_json("/api/v1/auth/sign-up", payload.clone()))
        .await
        .expect("first sign-up");
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = auth_router(pool.clone())
        .oneshot(post_json("/api/v1/auth/sign-up", payload))
        .await
        .expect("second sign-up");
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let body = support::response_json(second).await;
    assert_eq!(body["message"], "User already exists");
    assert_eq!(body["errors"]["email"][0], "Email is already taken");
}

#[tokio::test]
async fn sign_in_returns_access_token_and_refresh_cookie() {
    let _guard = integration_guard().await;
    let pool = support::test_pool().await;
    migrate_db(&pool).await;

    let password = "longpass1";
    let user = support::seed_user(&pool, password).await;

    let response = auth_router(pool.clone())
        .oneshot(post_json(
            "/api/v1/auth/sign-in",
            json!({ "email": user.email, "password": password }),
        ))
        .await
        .expect("sign-in request");

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = support::set_cookie_header(response.headers(), REFRESH_COOKIE_NAME)
        .expect("refresh cookie set");
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Max-Age=604800"));

    let refresh_token = support::extract_set_cookie_value(response.headers(), REFRESH_COOKIE_NAME)
        .expect("refresh token value");

    let payload = support::response_json(response).await;
    let access_token = payload["accessToken"].as_str().expect("access token");
    assert_eq!(access_token.split('.').count(), 3);
    assert_eq!(payload["user"]["email"], user.email);
    // The refresh token must never appear in the body.
    assert!(payload.get("refreshToken").is_none());

    let session = find_session_for_user(&pool, &user.id)
        .await
        .expect("session row");
    assert_eq!(session.refresh_token, refresh_token);
    assert!(!session.revoked);

    let expected_expiry = Utc::now() + Duration::days(7);
    let drift = (session.expires_at - expected_expiry).num_seconds().abs();
    assert!(drift < 60, "session expiry should be ~7 days out");
}

#[tokio::test]
async fn sign_in_failure_bodies_are_identical() {
    let _guard = integration_guard().await;
    let pool = support::test_pool().await;
    migrate_db(&pool).await;

    let user = support::seed_user(&pool, "longpass1").await;

    let wrong_password = auth_router(pool.clone())
        .oneshot(post_json(
            "/api/v1/auth/sign-in",
            json!({ "email": user.email, "password": "wrongpass1" }),
        ))
        .await
        .expect("wrong-password sign-in");
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);

    let unknown_email = auth_router(pool.clone())
        .oneshot(post_json(
            "/api/v1/auth/sign-in",
            json!({ "email": support::unique_email(), "password": "longpass1" }),
        ))
        .await
        .expect("unknown-email sign-in");
    assert_eq!(unknown_email.status(), StatusCode::UNAUTHORIZED);

    let wrong_password_body = support::response_bytes(wrong_password).await;
    let unknown_email_body = support::response_bytes(unknown_email).await;
    assert_eq!(wrong_password_body, unknown_email_body);
}

#[tokio::test]
async fn sign_in_rejects_invalid_payload() {
    let _guard = integration_guard().await;
    let pool = support::test_pool().await;
    migrate_db(&pool).await;

    let response = auth_router(pool.clone())
        .oneshot(post_json(
            "/api/v1/auth/sign-in",
            json!({ "email": "nope", "password": "short" }),
        ))
        .await
        .expect("sign-in request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let payload = support::response_json(response).await;
    assert_eq!(payload["message"], "Validation failed");
}
