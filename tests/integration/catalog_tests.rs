//! Catalog API integration tests.
//!
//! Tests verify:
//! - Default seeding and list filters
//! - Category CRUD behind the admin session
//! - Discovery of new category directories on list

use axum::http::{Method, StatusCode};
use serde_json::json;

use super::test_utils::{body_json, empty_request, json_request, TestApp};

// =============================================================================
// Reads
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = TestApp::new();
    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_list_seeds_default_categories() {
    let app = TestApp::new();
    let response = app.get("/api/categories").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 6);
    assert_eq!(body["data"][0]["slug"], "elsa-coloring-pages");
    assert_eq!(body["data"][0]["images"], json!([]));
    assert!(app.index_path().exists());
}

#[tokio::test]
async fn test_list_filters() {
    let app = TestApp::new();

    let body = body_json(app.get("/api/categories?featured=true").await).await;
    assert_eq!(body["count"], 4);

    let body = body_json(app.get("/api/categories?featured=false").await).await;
    assert_eq!(body["count"], 2);

    let body = body_json(app.get("/api/categories?q=DINOSAUR").await).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["slug"], "dinosaurs-coloring-pages");
}

#[tokio::test]
async fn test_get_category_accepts_short_slug() {
    let app = TestApp::new();
    let response = app.get("/api/categories/cars").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["slug"], "cars-coloring-pages");
    assert!(body["data"]["metaDescription"].is_string());
}

#[tokio::test]
async fn test_get_unknown_category() {
    let app = TestApp::new();
    let response = app.get("/api/categories/unicorns").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "NotFound");
    assert_eq!(body["status"], 404);
}

#[tokio::test]
async fn test_list_discovers_new_directories() {
    let app = TestApp::new();
    app.categories().await;
    std::fs::create_dir_all(app.pages_dir().join("sea-turtles")).unwrap();

    let categories = app.categories().await;
    assert_eq!(categories.len(), 7);
    let turtles = categories
        .iter()
        .find(|c| c["slug"] == "sea-turtles-coloring-pages")
        .unwrap();
    assert_eq!(turtles["title"], "Sea Turtles Coloring Pages");
    assert_eq!(turtles["featured"], false);
}

// =============================================================================
// Writes
// =============================================================================

#[tokio::test]
async fn test_create_requires_session() {
    let app = TestApp::new();
    app.categories().await;
    let before = std::fs::read_to_string(app.index_path()).unwrap();

    let request = json_request(
        Method::POST,
        "/api/categories",
        &json!({ "title": "Space Rockets" }),
        Some(&format!("csrf-token={}", super::test_utils::CSRF_TOKEN)),
        true,
    );
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Unauthorized");
    assert_eq!(std::fs::read_to_string(app.index_path()).unwrap(), before);
    assert!(!app.pages_dir().join("space-rockets").exists());
}

#[tokio::test]
async fn test_create_fills_generated_fields() {
    let app = TestApp::new();
    let request = json_request(
        Method::POST,
        "/api/categories",
        &json!({ "title": "Space Rockets!", "keywords": ["  rockets ", "", "space"] }),
        Some(&app.admin_cookies()),
        true,
    );
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["data"]["slug"], "space-rockets-coloring-pages");

    let body = body_json(app.get("/api/categories/space-rockets").await).await;
    let category = &body["data"];
    assert_eq!(category["title"], "Space Rockets!");
    assert_eq!(
        category["description"],
        "Beautiful Space Rockets! coloring pages for kids."
    );
    assert_eq!(category["keywords"], json!(["rockets", "space"]));
    assert!(app.original_dir("space-rockets").is_dir());
    assert!(app.thumbnail_dir("space-rockets").is_dir());
}

#[tokio::test]
async fn test_create_duplicate_conflicts() {
    let app = TestApp::new();
    let request = json_request(
        Method::POST,
        "/api/categories",
        &json!({ "title": "Cars" }),
        Some(&app.admin_cookies()),
        true,
    );
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["error"], "Conflict");
}

#[tokio::test]
async fn test_create_requires_title() {
    let app = TestApp::new();
    let request = json_request(
        Method::POST,
        "/api/categories",
        &json!({ "title": "   ", "description": "x" }),
        Some(&app.admin_cookies()),
        true,
    );
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "ValidationError");
    assert_eq!(body["message"], "Title is required");
}

#[tokio::test]
async fn test_update_category() {
    let app = TestApp::new();
    let request = json_request(
        Method::PUT,
        "/api/categories/cars",
        &json!({ "title": "Fast Cars", "featured": false }),
        Some(&app.admin_cookies()),
        true,
    );
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["data"]["slug"], "cars-coloring-pages");
    assert_eq!(body["data"]["title"], "Fast Cars");
    assert_eq!(body["data"]["featured"], false);

    let body = body_json(app.get("/api/categories?featured=true").await).await;
    assert_eq!(body["count"], 3);
}

#[tokio::test]
async fn test_update_requires_session() {
    let app = TestApp::new();
    app.categories().await;
    let before = std::fs::read_to_string(app.index_path()).unwrap();

    let request = json_request(
        Method::PUT,
        "/api/categories/cars",
        &json!({ "title": "Hijacked", "featured": false }),
        Some(&format!("csrf-token={}", super::test_utils::CSRF_TOKEN)),
        true,
    );
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Unauthorized");
    assert_eq!(std::fs::read_to_string(app.index_path()).unwrap(), before);
}

#[tokio::test]
async fn test_delete_requires_session() {
    let app = TestApp::new();
    app.categories().await;
    std::fs::create_dir_all(app.original_dir("cars")).unwrap();
    std::fs::write(app.original_dir("cars").join("notes.txt"), "x").unwrap();
    let before = std::fs::read_to_string(app.index_path()).unwrap();

    let response = app
        .send(empty_request(
            Method::DELETE,
            "/api/categories/cars",
            Some(&format!("csrf-token={}", super::test_utils::CSRF_TOKEN)),
            true,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(std::fs::read_to_string(app.index_path()).unwrap(), before);
    assert!(app.original_dir("cars").join("notes.txt").exists());
    assert_eq!(app.categories().await.len(), 6);
}

#[tokio::test]
async fn test_update_unknown_category() {
    let app = TestApp::new();
    let request = json_request(
        Method::PUT,
        "/api/categories/unicorns",
        &json!({ "title": "Unicorns" }),
        Some(&app.admin_cookies()),
        true,
    );
    assert_eq!(app.send(request).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_category_removes_files() {
    let app = TestApp::new();
    app.categories().await;
    std::fs::create_dir_all(app.original_dir("cars")).unwrap();
    std::fs::write(app.original_dir("cars").join("notes.txt"), "x").unwrap();

    let cookies = app.admin_cookies();
    let response = app
        .send(empty_request(
            Method::DELETE,
            "/api/categories/cars",
            Some(&cookies),
            true,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["message"],
        "Category deleted successfully"
    );
    assert!(!app.pages_dir().join("cars").exists());
    assert_eq!(app.categories().await.len(), 5);

    let response = app
        .send(empty_request(
            Method::DELETE,
            "/api/categories/cars",
            Some(&cookies),
            true,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_index_survives_invalid_json_body() {
    let app = TestApp::new();
    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/categories")
        .header("content-type", "application/json")
        .header("cookie", app.admin_cookies())
        .header("x-csrf-token", super::test_utils::CSRF_TOKEN)
        .body(axum::body::Body::from("{ not json"))
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "ValidationError");
    assert_eq!(app.categories().await.len(), 6);
}
