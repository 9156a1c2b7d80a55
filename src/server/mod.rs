//! HTTP server layer.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           HTTP Layer                             │
//! │                                                                  │
//! │  request ─▶ CORS ─▶ edge_guard ─▶ router ─▶ handlers / ServeDir  │
//! │                    (CSRF, /admin)            │                   │
//! │                                              ▼                   │
//! │                           AdminSession ◀── session cookies       │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

pub mod guard;
pub mod handlers;
pub mod routes;
pub mod session;

pub use guard::{edge_guard, requires_csrf, ADMIN_LOGIN_PATH, API_PREFIX, CSRF_EXEMPT_PATHS};
pub use handlers::{
    create_category_handler, delete_category_handler, delete_image_handler,
    get_category_handler, health_handler, list_categories_handler, print_source_handler,
    update_category_handler, upload_handler, ApiError, ApiResponse, AppState, CategoryListQuery,
    CreateCategoryRequest, CreatedCategory, ErrorResponse, HealthResponse, PrintSourceRequest,
    UpdateCategoryRequest,
};
pub use routes::{create_router, RouterConfig, DEFAULT_UPLOAD_BODY_LIMIT};
pub use session::{
    check_handler, clear_session_cookie, cookie_value, csrf_cookie, csrf_handler, login_handler,
    logout_handler, session_cookie, AdminSession, ClientIp, LoginRequest, SessionStatus,
    SESSION_COOKIE,
};
