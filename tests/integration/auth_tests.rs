//! Authentication integration tests.
//!
//! Tests verify:
//! - Login issues an HttpOnly session cookie usable on admin routes
//! - Failed logins never reveal which field was wrong
//! - Login rate limiting per client address
//! - Logout, session checks and CSRF token issuance
//! - Expired and forged session tokens are refused

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use coloring_catalog::SessionSigner;

use super::test_utils::{
    body_json, empty_request, json_request, login_request, set_cookies, TestApp, ADMIN_PASSWORD,
    ADMIN_USER, CSRF_TOKEN, SECRET,
};

fn session_token_from(cookies: &[String]) -> String {
    cookies
        .iter()
        .find_map(|c| c.strip_prefix("admin-session="))
        .and_then(|rest| rest.split(';').next())
        .unwrap()
        .to_string()
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn test_login_sets_session_cookie() {
    let app = TestApp::new();
    let response = app
        .send(login_request(ADMIN_USER, ADMIN_PASSWORD, "203.0.113.1"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookies = set_cookies(&response);
    let session = cookies
        .iter()
        .find(|c| c.starts_with("admin-session="))
        .unwrap();
    assert!(session.contains("HttpOnly"));
    assert!(session.contains("SameSite=Lax"));
    assert!(session.contains("Max-Age=86400"));
    assert!(!session.contains("Secure"));

    let token = session_token_from(&cookies);
    let body = body_json(response).await;
    assert_eq!(body["data"]["authenticated"], true);
    assert_eq!(body["data"]["username"], ADMIN_USER);

    // The issued token works on an admin route.
    let request = json_request(
        Method::POST,
        "/api/categories",
        &json!({ "title": "Trains" }),
        Some(&format!("admin-session={token}; csrf-token={CSRF_TOKEN}")),
        true,
    );
    assert_eq!(app.send(request).await.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_login_failure_is_generic() {
    let app = TestApp::new();

    let wrong_password = app
        .send(login_request(ADMIN_USER, "nope", "203.0.113.2"))
        .await;
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.headers()["x-ratelimit-remaining"], "4");
    assert!(set_cookies(&wrong_password).is_empty());
    let wrong_password = body_json(wrong_password).await;

    let wrong_user = app
        .send(login_request("root", ADMIN_PASSWORD, "203.0.113.2"))
        .await;
    assert_eq!(wrong_user.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_user.headers()["x-ratelimit-remaining"], "3");
    let wrong_user = body_json(wrong_user).await;

    assert_eq!(wrong_password["message"], "Invalid credentials");
    assert_eq!(wrong_password["message"], wrong_user["message"]);
}

#[tokio::test]
async fn test_login_missing_fields_counts_as_failure() {
    let app = TestApp::new();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", "203.0.113.3")
        .body(Body::from(json!({ "username": ADMIN_USER }).to_string()))
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .send(login_request(ADMIN_USER, "nope", "203.0.113.3"))
        .await;
    assert_eq!(response.headers()["x-ratelimit-remaining"], "3");
}

#[tokio::test]
async fn test_malformed_login_body_is_not_counted() {
    let app = TestApp::new();
    for _ in 0..6 {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", "203.0.113.4")
            .body(Body::from("{ nope"))
            .unwrap();
        assert_eq!(app.send(request).await.status(), StatusCode::BAD_REQUEST);
    }

    let response = app
        .send(login_request(ADMIN_USER, ADMIN_PASSWORD, "203.0.113.4"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Rate Limiting
// =============================================================================

#[tokio::test]
async fn test_sixth_attempt_is_rate_limited_even_with_correct_password() {
    let app = TestApp::new();
    for _ in 0..5 {
        let response = app
            .send(login_request(ADMIN_USER, "wrong", "198.51.100.9"))
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let response = app
        .send(login_request(ADMIN_USER, ADMIN_PASSWORD, "198.51.100.9"))
        .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));
    assert_eq!(response.headers()["x-ratelimit-remaining"], "0");
    assert!(set_cookies(&response).is_empty());

    let body = body_json(response).await;
    assert_eq!(body["error"], "RateLimited");

    // Other clients are unaffected.
    let response = app
        .send(login_request(ADMIN_USER, ADMIN_PASSWORD, "198.51.100.10"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_failed_logins_respect_limit() {
    let app = TestApp::new();

    let handles: Vec<_> = (0..30)
        .map(|_| {
            let router = app.router.clone();
            tokio::spawn(async move {
                router
                    .oneshot(login_request(ADMIN_USER, "wrong", "198.51.100.77"))
                    .await
                    .unwrap()
                    .status()
            })
        })
        .collect();

    let mut statuses = Vec::new();
    for handle in handles {
        statuses.push(handle.await.unwrap());
    }

    let unauthorized = statuses
        .iter()
        .filter(|s| **s == StatusCode::UNAUTHORIZED)
        .count();
    let limited = statuses
        .iter()
        .filter(|s| **s == StatusCode::TOO_MANY_REQUESTS)
        .count();
    assert_eq!(unauthorized, 5);
    assert_eq!(limited, 25);
}

#[tokio::test]
async fn test_successful_login_resets_counter() {
    let app = TestApp::new();
    for _ in 0..4 {
        app.send(login_request(ADMIN_USER, "wrong", "192.0.2.50"))
            .await;
    }
    let response = app
        .send(login_request(ADMIN_USER, ADMIN_PASSWORD, "192.0.2.50"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    for expected_remaining in ["4", "3", "2", "1", "0"] {
        let response = app
            .send(login_request(ADMIN_USER, "wrong", "192.0.2.50"))
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers()["x-ratelimit-remaining"],
            expected_remaining
        );
    }

    let response = app
        .send(login_request(ADMIN_USER, ADMIN_PASSWORD, "192.0.2.50"))
        .await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

// =============================================================================
// Logout, Check and CSRF
// =============================================================================

#[tokio::test]
async fn test_logout_clears_cookie() {
    let app = TestApp::new();
    let response = app
        .send(empty_request(
            Method::POST,
            "/api/auth/logout",
            Some(&app.admin_cookies()),
            true,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookies = set_cookies(&response);
    assert!(cookies
        .iter()
        .any(|c| c.starts_with("admin-session=;") && c.contains("Max-Age=0")));
}

#[tokio::test]
async fn test_check_reports_session() {
    let app = TestApp::new();

    let body = body_json(app.get("/api/auth/check").await).await;
    assert_eq!(body["data"]["authenticated"], false);

    let response = app
        .send(empty_request(
            Method::GET,
            "/api/auth/check",
            Some(&app.admin_cookies()),
            false,
        ))
        .await;
    let body = body_json(response).await;
    assert_eq!(body["data"]["authenticated"], true);
    assert_eq!(body["data"]["username"], ADMIN_USER);
}

#[tokio::test]
async fn test_csrf_endpoint_issues_matching_cookie() {
    let app = TestApp::new();
    let response = app.get("/api/auth/csrf").await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookies = set_cookies(&response);
    let cookie = cookies
        .iter()
        .find(|c| c.starts_with("csrf-token="))
        .unwrap()
        .clone();
    assert!(cookie.contains("SameSite=Strict"));
    assert!(!cookie.contains("HttpOnly"));

    let body = body_json(response).await;
    let token = body["data"]["csrfToken"].as_str().unwrap();
    assert_eq!(token.len(), 64);
    assert!(cookie.starts_with(&format!("csrf-token={token};")));
}

// =============================================================================
// Token Verification
// =============================================================================

#[tokio::test]
async fn test_expired_session_is_refused() {
    let app = TestApp::new();
    let stale = app.signer.issue_at(ADMIN_USER, 1_000);
    let request = json_request(
        Method::POST,
        "/api/categories",
        &json!({ "title": "Boats" }),
        Some(&format!("admin-session={stale}; csrf-token={CSRF_TOKEN}")),
        true,
    );
    assert_eq!(app.send(request).await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_forged_session_is_refused() {
    let app = TestApp::new();
    let forged = SessionSigner::new("some-other-secret-of-sufficient-length", ADMIN_USER)
        .issue(ADMIN_USER);
    let request = json_request(
        Method::POST,
        "/api/categories",
        &json!({ "title": "Boats" }),
        Some(&format!("admin-session={forged}; csrf-token={CSRF_TOKEN}")),
        true,
    );
    assert_eq!(app.send(request).await.status(), StatusCode::UNAUTHORIZED);

    // A token for another user signed with the right secret is refused too.
    let other_user = SessionSigner::new(SECRET, "mallory").issue("mallory");
    let request = json_request(
        Method::POST,
        "/api/categories",
        &json!({ "title": "Boats" }),
        Some(&format!("admin-session={other_user}; csrf-token={CSRF_TOKEN}")),
        true,
    );
    assert_eq!(app.send(request).await.status(), StatusCode::UNAUTHORIZED);
}
