//! Upload, image deletion and print source integration tests.
//!
//! Tests verify:
//! - Accepted uploads are stored with sequential names and a thumbnail
//! - Rejected uploads leave no files behind
//! - Image deletion by basename
//! - Print-ready payloads for stored images

use axum::http::{Method, StatusCode};
use serde_json::json;

use super::test_utils::{
    body_json, empty_request, file_names, json_request, multipart_body, noisy_jpeg, noisy_png,
    upload_request, TestApp, CSRF_TOKEN,
};

// =============================================================================
// Accepted Uploads
// =============================================================================

#[tokio::test]
async fn test_upload_round_trip() {
    let app = TestApp::new();
    let image = noisy_png(64, 48);

    let body = multipart_body(Some(("drawing.png", &image)), Some("cars"));
    let response = app
        .send(upload_request(body, Some(&app.admin_cookies())))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    let uploaded = &body["data"]["image"];
    assert_eq!(uploaded["originalFilename"], "cars-001.png");
    assert_eq!(uploaded["originalSize"], image.len() as u64);
    assert_eq!(uploaded["width"], 64);
    assert_eq!(uploaded["height"], 48);
    assert_eq!(uploaded["id"], "cars-coloring-pages-cars-001");
    assert_eq!(
        uploaded["originalPath"],
        "/coloring-pages/cars/original/cars-001.png"
    );
    assert_eq!(
        uploaded["thumbnailPath"],
        "/coloring-pages/cars/thumbnails/cars-001.webp"
    );
    assert_eq!(body["data"]["category"]["images"].as_array().unwrap().len(), 1);

    let stored = std::fs::read(app.original_dir("cars").join("cars-001.png")).unwrap();
    assert_eq!(stored, image);
    assert_eq!(file_names(&app.thumbnail_dir("cars")), vec!["cars-001.webp"]);

    // The stored files are reachable under the public prefix.
    let response = app.get("/coloring-pages/cars/thumbnails/cars-001.webp").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_jpeg_upload_uses_jpg_extension() {
    let app = TestApp::new();
    let image = noisy_jpeg(80, 60);

    let body = multipart_body(Some(("photo.jpeg", &image)), Some("animals"));
    let response = app
        .send(upload_request(body, Some(&app.admin_cookies())))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        file_names(&app.original_dir("animals")),
        vec!["animals-001.jpg"]
    );
}

#[tokio::test]
async fn test_uploads_are_numbered_sequentially() {
    let app = TestApp::new();
    let cookies = app.admin_cookies();

    for width in [40, 41, 42] {
        let image = noisy_png(width, 40);
        let body = multipart_body(Some(("x.png", &image)), Some("elsa"));
        let response = app.send(upload_request(body, Some(&cookies))).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(
        file_names(&app.original_dir("elsa")),
        vec!["elsa-001.png", "elsa-002.png", "elsa-003.png"]
    );

    let body = body_json(app.get("/api/categories/elsa").await).await;
    let names: Vec<_> = body["data"]["images"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["originalFilename"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["elsa-001.png", "elsa-002.png", "elsa-003.png"]);
}

// =============================================================================
// Rejected Uploads
// =============================================================================

#[tokio::test]
async fn test_oversized_upload_rejected_without_writes() {
    let app = TestApp::new();
    let mut data = noisy_png(64, 64);
    data.resize(4 * 1024 * 1024, 0);

    let body = multipart_body(Some(("huge.png", &data)), Some("cars"));
    let response = app
        .send(upload_request(body, Some(&app.admin_cookies())))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "ValidationError");
    assert_eq!(body["message"], "File size too large. Maximum size is 3MB");
    assert!(file_names(&app.original_dir("cars")).is_empty());
    assert!(file_names(&app.thumbnail_dir("cars")).is_empty());
}

#[tokio::test]
async fn test_fake_png_rejected_without_writes() {
    let app = TestApp::new();
    let data = "this is not an image ".repeat(100);

    let body = multipart_body(Some(("fake.png", data.as_bytes())), Some("cars"));
    let response = app
        .send(upload_request(body, Some(&app.admin_cookies())))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(
        body["message"],
        "Invalid image file. Only PNG and JPEG files are allowed."
    );
    assert!(file_names(&app.original_dir("cars")).is_empty());
}

#[tokio::test]
async fn test_truncated_png_rejected() {
    let app = TestApp::new();
    let mut data = noisy_png(64, 64);
    data.truncate(data.len() / 2);

    let body = multipart_body(Some(("broken.png", &data)), Some("cars"));
    let response = app
        .send(upload_request(body, Some(&app.admin_cookies())))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(file_names(&app.original_dir("cars")).is_empty());
}

#[tokio::test]
async fn test_upload_requires_session() {
    let app = TestApp::new();
    let image = noisy_png(40, 40);

    let body = multipart_body(Some(("x.png", &image)), Some("cars"));
    let response = app.send(upload_request(body, None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(file_names(&app.original_dir("cars")).is_empty());
}

#[tokio::test]
async fn test_upload_missing_fields() {
    let app = TestApp::new();
    let cookies = app.admin_cookies();
    let image = noisy_png(40, 40);

    let response = app
        .send(upload_request(multipart_body(None, Some("cars")), Some(&cookies)))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "No file provided");

    let response = app
        .send(upload_request(
            multipart_body(Some(("x.png", &image)), None),
            Some(&cookies),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "Category is required");
}

#[tokio::test]
async fn test_upload_rejects_non_multipart_body() {
    let app = TestApp::new();
    let request = json_request(
        Method::POST,
        "/api/upload",
        &json!({ "category": "cars" }),
        Some(&app.admin_cookies()),
        false,
    );
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "ValidationError");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Invalid multipart body"));
    assert!(file_names(&app.original_dir("cars")).is_empty());
}

#[tokio::test]
async fn test_upload_unknown_category() {
    let app = TestApp::new();
    let image = noisy_png(40, 40);

    let body = multipart_body(Some(("x.png", &image)), Some("unicorns"));
    let response = app
        .send(upload_request(body, Some(&app.admin_cookies())))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(!app.pages_dir().join("unicorns").exists());
}

// =============================================================================
// Image Deletion
// =============================================================================

#[tokio::test]
async fn test_delete_image_by_basename() {
    let app = TestApp::new();
    let cookies = app.admin_cookies();
    let image = noisy_png(40, 40);
    let body = multipart_body(Some(("x.png", &image)), Some("cars"));
    assert_eq!(
        app.send(upload_request(body, Some(&cookies))).await.status(),
        StatusCode::OK
    );

    let response = app
        .send(empty_request(
            Method::DELETE,
            "/api/categories/cars/images/cars-001",
            Some(&cookies),
            true,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["images"], json!([]));
    assert!(file_names(&app.original_dir("cars")).is_empty());
    assert!(file_names(&app.thumbnail_dir("cars")).is_empty());

    let response = app
        .send(empty_request(
            Method::DELETE,
            "/api/categories/cars/images/cars-001",
            Some(&cookies),
            true,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_image_requires_session() {
    let app = TestApp::new();
    let image = noisy_png(40, 40);
    let body = multipart_body(Some(("x.png", &image)), Some("cars"));
    app.send(upload_request(body, Some(&app.admin_cookies())))
        .await;

    let response = app
        .send(empty_request(
            Method::DELETE,
            "/api/categories/cars/images/cars-001",
            Some(&format!("csrf-token={CSRF_TOKEN}")),
            true,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(file_names(&app.original_dir("cars")), vec!["cars-001.png"]);
}

// =============================================================================
// Print Source
// =============================================================================

#[tokio::test]
async fn test_print_source_for_uploaded_image() {
    let app = TestApp::new();
    let image = noisy_png(50, 30);
    let body = multipart_body(Some(("x.png", &image)), Some("flowers"));
    app.send(upload_request(body, Some(&app.admin_cookies())))
        .await;

    let request = json_request(
        Method::POST,
        "/api/print-source",
        &json!({ "imageUrl": "/coloring-pages/flowers/original/flowers-001.png" }),
        Some(&format!("csrf-token={CSRF_TOKEN}")),
        true,
    );
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let data = &body["data"];
    assert!(data["imageData"]
        .as_str()
        .unwrap()
        .starts_with("data:image/png;base64,"));
    assert_eq!(data["mime"], "image/png");
    assert_eq!(data["width"], 50);
    assert_eq!(data["height"], 30);
    assert_eq!(data["filename"], "coloring-page.pdf");
}

#[tokio::test]
async fn test_print_source_rejects_paths_outside_catalog() {
    let app = TestApp::new();
    for url in ["/etc/passwd", "/coloring-pages/../data/categories.json"] {
        let request = json_request(
            Method::POST,
            "/api/print-source",
            &json!({ "imageUrl": url }),
            Some(&format!("csrf-token={CSRF_TOKEN}")),
            true,
        );
        let response = app.send(request).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "url: {url}");
        assert_eq!(body_json(response).await["message"], "Invalid image path");
    }
}

#[tokio::test]
async fn test_print_source_missing_image() {
    let app = TestApp::new();
    let request = json_request(
        Method::POST,
        "/api/print-source",
        &json!({ "imageUrl": "/coloring-pages/cars/original/cars-999.png" }),
        Some(&format!("csrf-token={CSRF_TOKEN}")),
        true,
    );
    assert_eq!(app.send(request).await.status(), StatusCode::NOT_FOUND);
}
