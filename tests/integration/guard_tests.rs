//! Edge guard integration tests.
//!
//! Tests verify:
//! - CSRF enforcement on mutating API calls, with its exemptions
//! - Session enforcement and redirects on admin pages
//! - Catalog images bypass the guard; admin images do not

use axum::http::{header, Method, StatusCode};
use serde_json::json;

use super::test_utils::{
    body_json, empty_request, json_request, login_request, multipart_body, noisy_png,
    upload_request, TestApp,
};

// =============================================================================
// CSRF
// =============================================================================

#[tokio::test]
async fn test_mutation_without_csrf_is_forbidden() {
    let app = TestApp::new();
    let session = format!("admin-session={}", app.signer.issue("admin"));

    let request = json_request(
        Method::POST,
        "/api/categories",
        &json!({ "title": "Trains" }),
        Some(&session),
        false,
    );
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Forbidden");
    assert_eq!(body["message"], "Invalid CSRF token");
    assert!(!app.pages_dir().join("trains").exists());
}

#[tokio::test]
async fn test_mismatched_csrf_is_forbidden() {
    let app = TestApp::new();
    let request = json_request(
        Method::DELETE,
        "/api/categories/cars",
        &json!({}),
        Some(&format!(
            "admin-session={}; csrf-token=somethingelse",
            app.signer.issue("admin")
        )),
        true,
    );
    assert_eq!(app.send(request).await.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.categories().await.len(), 6);
}

#[tokio::test]
async fn test_csrf_checked_before_session() {
    let app = TestApp::new();
    let response = app
        .send(empty_request(Method::DELETE, "/api/categories/cars", None, false))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_reads_skip_csrf() {
    let app = TestApp::new();
    let response = app
        .send(empty_request(Method::GET, "/api/categories", None, false))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_and_upload_skip_csrf() {
    let app = TestApp::new();

    let response = app
        .send(login_request("admin", "wrong", "10.9.8.7"))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let image = noisy_png(40, 40);
    let session = format!("admin-session={}", app.signer.issue("admin"));
    let body = multipart_body(Some(("x.png", &image)), Some("cars"));
    let response = app.send(upload_request(body, Some(&session))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_print_source_requires_csrf() {
    let app = TestApp::new();
    let request = json_request(
        Method::POST,
        "/api/print-source",
        &json!({ "imageUrl": "/coloring-pages/cars/original/cars-001.png" }),
        None,
        false,
    );
    assert_eq!(app.send(request).await.status(), StatusCode::FORBIDDEN);
}

// =============================================================================
// Admin Pages
// =============================================================================

#[tokio::test]
async fn test_admin_page_without_session_redirects() {
    let app = TestApp::new();
    let response = app.get("/admin/dashboard.html").await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()[header::LOCATION], "/admin");

    let cleared = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .any(|v| v.to_str().unwrap().contains("Max-Age=0"));
    assert!(cleared);
}

#[tokio::test]
async fn test_admin_page_with_invalid_session_redirects() {
    let app = TestApp::new();
    let response = app
        .send(empty_request(
            Method::GET,
            "/admin/dashboard.html",
            Some("admin-session=garbage.deadbeef"),
            false,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
}

#[tokio::test]
async fn test_admin_page_with_session_is_served() {
    let app = TestApp::new();
    let response = app
        .send(empty_request(
            Method::GET,
            "/admin/dashboard.html",
            Some(&app.admin_cookies()),
            false,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_admin_login_page_is_public() {
    let app = TestApp::new();
    for path in ["/admin", "/admin/"] {
        let response = app.get(path).await;
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|l| l.to_str().ok());
        assert_ne!(location, Some("/admin"), "{path}");
        assert!(response.headers().get(header::SET_COOKIE).is_none());
    }
}

#[tokio::test]
async fn test_catalog_images_bypass_guard() {
    let app = TestApp::new();
    app.categories().await;
    std::fs::create_dir_all(app.original_dir("cars")).unwrap();
    std::fs::write(app.original_dir("cars").join("cars-001.png"), noisy_png(20, 20)).unwrap();

    let response = app.get("/coloring-pages/cars/original/cars-001.png").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_admin_images_require_session() {
    let app = TestApp::new();
    std::fs::write(app.root.path().join("admin").join("logo.png"), noisy_png(20, 20)).unwrap();

    let response = app.get("/admin/logo.png").await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.headers()[header::LOCATION], "/admin");

    let response = app
        .send(empty_request(
            Method::GET,
            "/admin/logo.png",
            Some(&app.admin_cookies()),
            false,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_non_api_mutation_skips_csrf() {
    let app = TestApp::new();
    let request = json_request(Method::POST, "/health", &json!({}), None, false);
    assert_ne!(app.send(request).await.status(), StatusCode::FORBIDDEN);
}
