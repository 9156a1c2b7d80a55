//! Router configuration for the catalog server.
//!
//! # Route Structure
//!
//! ```text
//! /health                                          - Health check
//! /api/categories                                  - List (GET), create (POST)
//! /api/categories/{slug}                           - Get, update, delete
//! /api/categories/{slug}/images/{identifier}       - Delete one image
//! /api/upload                                      - Multipart image upload
//! /api/print-source                                - Print-ready image payload
//! /api/auth/{login,logout,check,csrf}              - Session management
//! /coloring-pages/...                              - Category images (static)
//! /admin/...                                       - Admin front-end (static, optional)
//! ```
//!
//! Every route sits behind the [`edge_guard`](super::guard::edge_guard).
//!
//! # Example
//!
//! ```ignore
//! use coloring_catalog::server::{create_router, AppState, RouterConfig};
//!
//! let state = AppState::new(store, credentials, signer);
//! let router = create_router(state, RouterConfig::new());
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::path::PathBuf;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post},
    Router,
};
use http::header::CONTENT_TYPE;
use http::{HeaderName, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::guard::edge_guard;
use super::handlers::{
    create_category_handler, delete_category_handler, delete_image_handler,
    get_category_handler, health_handler, list_categories_handler, print_source_handler,
    update_category_handler, upload_handler, AppState,
};
use super::session::{check_handler, csrf_handler, login_handler, logout_handler};
use crate::auth::CSRF_HEADER;
use crate::ingest::MAX_UPLOAD_BYTES;

/// Request body limit on the upload route. Leaves room for multipart framing
/// so oversized files reach the size check and get a proper message.
pub const DEFAULT_UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 1024 * 1024;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Whether to enable request tracing
    pub enable_tracing: bool,

    /// Directory holding the admin front-end, served under `/admin`
    pub admin_dir: Option<PathBuf>,

    /// Maximum request body accepted by the upload route
    pub upload_body_limit: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterConfig {
    /// Create a new router configuration.
    ///
    /// By default:
    /// - CORS allows any origin
    /// - Tracing is enabled
    /// - No admin front-end is served
    pub fn new() -> Self {
        Self {
            cors_origins: None,
            enable_tracing: true,
            admin_dir: None,
            upload_body_limit: DEFAULT_UPLOAD_BODY_LIMIT,
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }

    /// Serve a static admin front-end from `dir`.
    pub fn with_admin_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.admin_dir = Some(dir.into());
        self
    }

    pub fn with_upload_body_limit(mut self, bytes: usize) -> Self {
        self.upload_body_limit = bytes;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// Builds the API routes, static file services, the edge guard, CORS and
/// (optionally) request tracing.
pub fn create_router(state: AppState, config: RouterConfig) -> Router {
    let api_routes = Router::new()
        .route(
            "/categories",
            get(list_categories_handler).post(create_category_handler),
        )
        .route(
            "/categories/{slug}",
            get(get_category_handler)
                .put(update_category_handler)
                .delete(delete_category_handler),
        )
        .route(
            "/categories/{slug}/images/{identifier}",
            delete(delete_image_handler),
        )
        .route(
            "/upload",
            post(upload_handler).layer(DefaultBodyLimit::max(config.upload_body_limit)),
        )
        .route("/print-source", post(print_source_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/logout", post(logout_handler))
        .route("/auth/check", get(check_handler))
        .route("/auth/csrf", get(csrf_handler));

    let layout = state.catalog.layout();
    let mut router = Router::new()
        .nest("/api", api_routes)
        .route("/health", get(health_handler))
        .nest_service(
            layout.public_prefix(),
            ServeDir::new(layout.pages_dir()),
        );

    if let Some(admin_dir) = &config.admin_dir {
        router = router.nest_service(
            "/admin",
            ServeDir::new(admin_dir).append_index_html_on_directories(true),
        );
    }

    let router = router
        .layer(middleware::from_fn_with_state(state.clone(), edge_guard))
        .with_state(state)
        .layer(build_cors_layer(&config));

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(CSRF_HEADER)])
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
