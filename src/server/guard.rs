//! Edge guard middleware.
//!
//! Runs before routing reaches any handler:
//!
//! 1. Image assets outside `/api` and the protected admin pages pass
//!    straight through.
//! 2. Mutating API calls must echo the CSRF cookie in the `x-csrf-token`
//!    header. Login and upload are exempt; they carry their own checks.
//! 3. Anything below `/admin/` needs a valid session cookie. Failures are
//!    redirected to the `/admin` login page with the stale cookie cleared.
//!
//! The guard has no side effects beyond rejecting, redirecting or passing
//! the request on.

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

use crate::auth::{csrf::tokens_match, CSRF_COOKIE, CSRF_HEADER};

use super::handlers::{ApiError, AppState};
use super::session::{clear_session_cookie, cookie_value, SESSION_COOKIE};

/// Prefix of every API route.
pub const API_PREFIX: &str = "/api";

/// Admin login page; reachable without a session.
pub const ADMIN_LOGIN_PATH: &str = "/admin";

/// API paths that skip the CSRF check.
pub const CSRF_EXEMPT_PATHS: &[&str] = &["/api/auth/login", "/api/upload"];

const STATIC_ASSET_EXTENSIONS: &[&str] = &["svg", "png", "jpg", "jpeg", "gif", "webp", "ico"];

fn is_api_path(path: &str) -> bool {
    path == API_PREFIX
        || path
            .strip_prefix(API_PREFIX)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn is_static_asset(path: &str) -> bool {
    let file = path.rsplit('/').next().unwrap_or(path);
    match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => STATIC_ASSET_EXTENSIONS
            .iter()
            .any(|allowed| ext.eq_ignore_ascii_case(allowed)),
        _ => false,
    }
}

fn is_mutating(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::DELETE | Method::PATCH
    )
}

fn is_protected_admin_path(path: &str) -> bool {
    path.strip_prefix(ADMIN_LOGIN_PATH)
        .and_then(|rest| rest.strip_prefix('/'))
        .is_some_and(|rest| !rest.is_empty())
}

/// Whether a path skips the guard entirely.
fn bypasses_guard(path: &str) -> bool {
    !is_api_path(path) && !is_protected_admin_path(path) && is_static_asset(path)
}

/// Whether a request needs a CSRF token match.
pub fn requires_csrf(method: &Method, path: &str) -> bool {
    is_api_path(path) && is_mutating(method) && !CSRF_EXEMPT_PATHS.contains(&path)
}

/// Axum middleware enforcing CSRF and admin-page sessions.
///
/// # Example
///
/// ```ignore
/// use axum::{middleware, Router};
///
/// let app = Router::new()
///     .route("/api/categories", post(create_category_handler))
///     .layer(middleware::from_fn_with_state(state.clone(), edge_guard))
///     .with_state(state);
/// ```
pub async fn edge_guard(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();

    if bypasses_guard(&path) {
        return next.run(request).await;
    }

    if requires_csrf(request.method(), &path) {
        let header_token = request
            .headers()
            .get(CSRF_HEADER)
            .and_then(|v| v.to_str().ok());
        let cookie_token = cookie_value(request.headers(), CSRF_COOKIE);
        if !tokens_match(header_token, cookie_token) {
            return ApiError::Forbidden("Invalid CSRF token".to_string()).into_response();
        }
    }

    if is_protected_admin_path(&path) {
        let verified = cookie_value(request.headers(), SESSION_COOKIE)
            .map(|token| state.signer.verify(token));
        match verified {
            Some(Ok(_)) => {}
            other => {
                if let Some(Err(e)) = other {
                    debug!(path = %path, error = %e, "Rejected admin session");
                }
                let mut response = Redirect::temporary(ADMIN_LOGIN_PATH).into_response();
                if let Ok(value) = HeaderValue::from_str(&clear_session_cookie(state.secure_cookies))
                {
                    response.headers_mut().append(header::SET_COOKIE, value);
                }
                return response;
            }
        }
    }

    next.run(request).await
}

// =============================================================================
// Tests
// =============================================================================
