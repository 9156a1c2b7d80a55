//! HTTP request handlers for the catalog API.
//!
//! # Endpoints
//!
//! - `GET /api/categories` - List categories with images
//! - `GET /api/categories/{slug}` - One category
//! - `POST /api/categories` - Create (admin)
//! - `PUT /api/categories/{slug}` - Update (admin)
//! - `DELETE /api/categories/{slug}` - Delete with files (admin)
//! - `DELETE /api/categories/{slug}/images/{identifier}` - Delete one image (admin)
//! - `POST /api/upload` - Multipart upload (admin)
//! - `POST /api/print-source` - Print-ready image payload
//! - `GET /health` - Health check

use std::sync::Arc;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
        Multipart, Path, Query, State,
    },
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::auth::{AdminCredentials, LoginRateLimiter, SessionSigner};
use crate::catalog::{
    generated_description, generated_keywords, generated_meta_description, CatalogStore,
    Category, CategoryUpdate, NewCategory, UploadedImage,
};
use crate::error::{CatalogError, IngestError};
use crate::ingest::{self, MAX_UPLOAD_BYTES};
use crate::slug;

use super::session::AdminSession;

// =============================================================================
// Application State
// =============================================================================

/// Shared application state passed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Category index and image directories
    pub catalog: Arc<CatalogStore>,

    /// The admin account
    pub credentials: Arc<AdminCredentials>,

    /// Session token issuer and verifier, shared with the edge guard
    pub signer: Arc<SessionSigner>,

    /// Failed-login throttling
    pub rate_limiter: Arc<LoginRateLimiter>,

    /// Whether cookies carry the `Secure` attribute
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(catalog: CatalogStore, credentials: AdminCredentials, signer: SessionSigner) -> Self {
        Self {
            catalog: Arc::new(catalog),
            credentials: Arc::new(credentials),
            signer: Arc::new(signer),
            rate_limiter: Arc::new(LoginRateLimiter::default()),
            secure_cookies: false,
        }
    }

    /// Replace the login rate limiter (for example, one backed by a shared store).
    pub fn with_rate_limiter(mut self, rate_limiter: LoginRateLimiter) -> Self {
        self.rate_limiter = Arc::new(rate_limiter);
        self
    }

    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Always `false`
    pub success: bool,

    /// Error type identifier (e.g., "ValidationError", "NotFound")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    pub status: u16,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>, status: StatusCode) -> Self {
        Self {
            success: false,
            error: error.into(),
            message: message.into(),
            status: status.as_u16(),
        }
    }
}

/// JSON body of every successful API response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Always `true`
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            count: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }
}

impl ApiResponse<()> {
    /// A success body carrying only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
            count: None,
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

/// Slug assigned to a newly created category.
#[derive(Debug, Serialize)]
pub struct CreatedCategory {
    pub slug: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Errors returned by API handlers.
#[derive(Debug)]
pub enum ApiError {
    /// Bad input; the message names the violated constraint
    Validation(String),

    /// Missing or invalid session
    Unauthorized(String),

    /// Request rejected before reaching a handler (CSRF)
    Forbidden(String),

    NotFound(String),

    Conflict(String),

    /// Login attempts exhausted
    RateLimited { retry_after: u64, reset_at: u64 },

    /// Unexpected failure; the detail is logged, never returned
    Internal(String),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::Validation(message) => {
                (StatusCode::BAD_REQUEST, "ValidationError", message.clone())
            }
            ApiError::Unauthorized(message) => {
                (StatusCode::UNAUTHORIZED, "Unauthorized", message.clone())
            }
            ApiError::Forbidden(message) => (StatusCode::FORBIDDEN, "Forbidden", message.clone()),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "NotFound", message.clone()),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "Conflict", message.clone()),
            ApiError::RateLimited { .. } => (
                StatusCode::TOO_MANY_REQUESTS,
                "RateLimited",
                "Too many login attempts. Please try again later.".to_string(),
            ),
            ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalError",
                "Internal server error".to_string(),
            ),
        }
    }
}

/// Convert ApiError to an HTTP response.
///
/// 5xx errors are logged at ERROR, 404s at DEBUG and other 4xx at WARN.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = self.parts();

        if status.is_server_error() {
            let detail = match &self {
                ApiError::Internal(detail) => detail.as_str(),
                _ => message.as_str(),
            };
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                detail
            );
        } else if status == StatusCode::NOT_FOUND {
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Not found: {}",
                message
            );
        } else {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        }

        let mut response =
            (status, Json(ErrorResponse::new(error_type, message, status))).into_response();

        if let ApiError::RateLimited {
            retry_after,
            reset_at,
        } = self
        {
            let headers = response.headers_mut();
            headers.insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
            headers.insert("x-ratelimit-remaining", HeaderValue::from(0u32));
            headers.insert("x-ratelimit-reset", HeaderValue::from(reset_at));
        }

        response
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::AlreadyExists { .. } => ApiError::Conflict(err.to_string()),
            CatalogError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            CatalogError::Io { .. } | CatalogError::Serialize(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        match err {
            e if e.is_validation() => ApiError::Validation(e.to_string()),
            IngestError::CategoryNotFound { .. } => {
                ApiError::NotFound("Category not found".to_string())
            }
            IngestError::ImageNotFound { .. } => ApiError::NotFound("Image not found".to_string()),
            e => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::Validation(
            IngestError::TooLarge {
                size: 0,
                max: MAX_UPLOAD_BYTES,
            }
            .to_string(),
        )
    } else {
        ApiError::Validation(format!("Invalid multipart body: {}", err.body_text()))
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Query parameters for the category list endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct CategoryListQuery {
    /// Only categories with this featured flag
    #[serde(default)]
    pub featured: Option<bool>,

    /// Case-insensitive substring over title, description and keywords
    #[serde(default)]
    pub q: Option<String>,
}

/// Body of `POST /api/categories`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    #[serde(default)]
    pub featured: Option<bool>,
}

/// Body of `PUT /api/categories/{slug}`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    #[serde(default)]
    pub featured: Option<bool>,
}

/// Body of `POST /api/print-source`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintSourceRequest {
    pub image_url: String,
    #[serde(default)]
    pub filename: Option<String>,
}

fn required_title(title: Option<String>) -> Result<String, ApiError> {
    match title.map(|t| t.trim().to_string()) {
        Some(title) if !title.is_empty() => Ok(title),
        _ => Err(ApiError::Validation("Title is required".to_string())),
    }
}

fn clean_keywords(keywords: Vec<String>) -> Vec<String> {
    keywords
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// =============================================================================
// Catalog Handlers
// =============================================================================

/// Handle category list requests.
///
/// Discovers new category directories first; a failed sync is logged and the
/// listing proceeds.
pub async fn list_categories_handler(
    State(state): State<AppState>,
    Query(query): Query<CategoryListQuery>,
) -> Json<ApiResponse<Vec<Category>>> {
    if let Err(e) = state.catalog.sync_with_file_system().await {
        error!(error = %e, "Category sync failed");
    }

    let query_text = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
    let categories: Vec<Category> = state
        .catalog
        .list_categories_with_images()
        .await
        .into_iter()
        .filter(|c| query.featured.map_or(true, |featured| c.featured == featured))
        .filter(|c| query_text.map_or(true, |q| c.matches_query(q)))
        .collect();

    let count = categories.len();
    Json(ApiResponse::data(categories).with_count(count))
}

/// Handle single category requests.
pub async fn get_category_handler(
    State(state): State<AppState>,
    Path(category_slug): Path<String>,
) -> Result<Json<ApiResponse<Category>>, ApiError> {
    let category = state
        .catalog
        .get_category(&category_slug)
        .await
        .ok_or_else(|| ApiError::NotFound("Category not found".to_string()))?;
    Ok(Json(ApiResponse::data(category)))
}

/// Handle category creation.
///
/// The slug is derived from the title. Empty descriptive fields are filled
/// with generated text.
pub async fn create_category_handler(
    _session: AdminSession,
    State(state): State<AppState>,
    body: Result<Json<CreateCategoryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<CreatedCategory>>), ApiError> {
    let Json(body) = body?;
    let title = required_title(body.title)?;
    let subject = title.to_lowercase();

    let keywords = clean_keywords(body.keywords.unwrap_or_default());
    let input = NewCategory {
        slug: slug::slug_from_title(&title),
        description: non_empty(body.description)
            .unwrap_or_else(|| generated_description(&title)),
        meta_description: non_empty(body.meta_description)
            .unwrap_or_else(|| generated_meta_description(&title)),
        keywords: if keywords.is_empty() {
            generated_keywords(&subject)
        } else {
            keywords
        },
        featured: body.featured.unwrap_or(false),
        title,
    };

    let category = state.catalog.add_category(input).await?;
    info!(slug = %category.slug, "Category created via API");

    Ok((
        StatusCode::CREATED,
        Json(
            ApiResponse::data(CreatedCategory {
                slug: category.slug,
            })
            .with_message("Category created successfully"),
        ),
    ))
}

/// Handle category updates. The title stays required.
pub async fn update_category_handler(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(category_slug): Path<String>,
    body: Result<Json<UpdateCategoryRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Category>>, ApiError> {
    let Json(body) = body?;
    let update = CategoryUpdate {
        title: Some(required_title(body.title)?),
        description: body.description,
        meta_description: body.meta_description,
        keywords: body.keywords.map(clean_keywords),
        featured: body.featured,
    };

    let category = state
        .catalog
        .update_category(&category_slug, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Category not found".to_string()))?;

    Ok(Json(
        ApiResponse::data(category).with_message("Category updated successfully"),
    ))
}

/// Handle category deletion, including its image files.
pub async fn delete_category_handler(
    _session: AdminSession,
    State(state): State<AppState>,
    Path(category_slug): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    if !state.catalog.delete_category(&category_slug).await? {
        return Err(ApiError::NotFound("Category not found".to_string()));
    }
    Ok(Json(ApiResponse::message("Category deleted successfully")))
}

/// Handle deletion of one image by id or basename.
pub async fn delete_image_handler(
    _session: AdminSession,
    State(state): State<AppState>,
    Path((category_slug, identifier)): Path<(String, String)>,
) -> Result<Json<ApiResponse<Category>>, ApiError> {
    let category = state
        .catalog
        .delete_image(&category_slug, &identifier)
        .await?;
    Ok(Json(
        ApiResponse::data(category).with_message("Image deleted successfully"),
    ))
}

/// Handle multipart uploads with `file` and `category` fields.
///
/// The session is checked before the body is read.
pub async fn upload_handler(
    _session: AdminSession,
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ApiResponse<UploadedImage>>, ApiError> {
    let mut multipart = multipart
        .map_err(|e| ApiError::Validation(format!("Invalid multipart body: {}", e.body_text())))?;
    let mut file: Option<Bytes> = None;
    let mut category: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name() {
            Some("file") => file = Some(field.bytes().await.map_err(multipart_error)?),
            Some("category") => category = Some(field.text().await.map_err(multipart_error)?),
            _ => {}
        }
    }

    let file = file.ok_or_else(|| ApiError::Validation("No file provided".to_string()))?;
    let category = non_empty(category)
        .ok_or_else(|| ApiError::Validation("Category is required".to_string()))?;

    let uploaded = state.catalog.upload_image(&category, file).await?;

    Ok(Json(
        ApiResponse::data(uploaded).with_message("File uploaded successfully"),
    ))
}

/// Handle print-source requests for a public catalog image URL.
pub async fn print_source_handler(
    State(state): State<AppState>,
    body: Result<Json<PrintSourceRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ingest::PrintSource>>, ApiError> {
    let Json(body) = body?;
    let path = state
        .catalog
        .layout()
        .resolve_public_path(&body.image_url)
        .ok_or_else(|| ApiError::Validation("Invalid image path".to_string()))?;

    let source = ingest::print::prepare(&path, body.filename).await?;
    Ok(Json(ApiResponse::data(source)))
}

/// Handle health check requests.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
