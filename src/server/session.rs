//! Session cookies, request extractors and the auth endpoints.
//!
//! # Endpoints
//!
//! - `POST /api/auth/login` - Exchange credentials for a session cookie
//! - `POST /api/auth/logout` - Clear the session cookie
//! - `GET /api/auth/check` - Report whether the request carries a valid session
//! - `GET /api/auth/csrf` - Issue a CSRF token and cookie

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    extract::{
        rejection::JsonRejection, ConnectInfo, FromRequestParts, OptionalFromRequestParts, State,
    },
    http::{header, request::Parts, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::{
    csrf::CSRF_COOKIE_MAX_AGE, generate_csrf_token, RateLimitDecision, SessionClaims,
    CSRF_COOKIE,
};

use super::handlers::{ApiError, ApiResponse, AppState};

/// Cookie carrying the admin session token.
pub const SESSION_COOKIE: &str = "admin-session";

// =============================================================================
// Cookies
// =============================================================================

/// Value of the named cookie, if the request carries it.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
}

/// `Set-Cookie` value for a freshly issued session token.
pub fn session_cookie(token: &str, max_age: u64, secure: bool) -> String {
    let mut cookie =
        format!("{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={max_age}");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that deletes the session cookie.
pub fn clear_session_cookie(secure: bool) -> String {
    session_cookie("", 0, secure)
}

/// `Set-Cookie` value for a CSRF token. Readable by scripts so it can be
/// echoed into the header.
pub fn csrf_cookie(token: &str, secure: bool) -> String {
    let mut cookie =
        format!("{CSRF_COOKIE}={token}; Path=/; SameSite=Strict; Max-Age={CSRF_COOKIE_MAX_AGE}");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

fn set_cookie(response: &mut Response, cookie: &str) {
    match HeaderValue::from_str(cookie) {
        Ok(value) => {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
        Err(e) => warn!(error = %e, "Refusing to emit invalid Set-Cookie header"),
    }
}

// =============================================================================
// Extractors
// =============================================================================

/// A verified admin session.
///
/// Rejects with 401 when the session cookie is missing, forged or expired.
#[derive(Debug, Clone)]
pub struct AdminSession(pub SessionClaims);

impl AdminSession {
    pub fn username(&self) -> &str {
        &self.0.username
    }
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = cookie_value(&parts.headers, SESSION_COOKIE)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

        state
            .signer
            .verify(token)
            .map(AdminSession)
            .map_err(|_| ApiError::Unauthorized("Authentication required".to_string()))
    }
}

impl OptionalFromRequestParts<AppState> for AdminSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(
            <AdminSession as FromRequestParts<AppState>>::from_request_parts(parts, state)
                .await
                .ok(),
        )
    }
}

/// Best-effort client address used to key the login rate limiter.
///
/// First `x-forwarded-for` entry, then `x-real-ip`, then the peer address,
/// else `"unknown"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header_ip = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let ip = header_ip("x-forwarded-for")
            .or_else(|| header_ip("x-real-ip"))
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip().to_string())
            })
            .unwrap_or_else(|| "unknown".to_string());

        Ok(ClientIp(ip))
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Body of `POST /api/auth/login`.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Data returned by login and check.
#[derive(Debug, Serialize)]
pub struct SessionStatus {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsrfTokenResponse {
    pub csrf_token: String,
}

/// Handle login requests.
///
/// A malformed body is rejected without counting an attempt. Otherwise the
/// attempt is reserved against the rate limit before the credentials are
/// checked, so a locked-out client is refused even with the right password
/// and parallel requests cannot exceed the limit. A successful login
/// releases the reservation.
pub async fn login_handler(
    State(state): State<AppState>,
    ClientIp(client): ClientIp,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body?;

    let remaining = match state.rate_limiter.reserve(&client).await {
        RateLimitDecision::Allowed { remaining } => remaining,
        RateLimitDecision::Limited {
            retry_after,
            reset_at,
        } => {
            warn!(client = %client, retry_after, "Login rate limit exceeded");
            return Err(ApiError::RateLimited {
                retry_after,
                reset_at,
            });
        }
    };

    let (Some(username), Some(password)) = (
        body.username.filter(|u| !u.is_empty()),
        body.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::Validation(
            "Username and password are required".to_string(),
        ));
    };

    let credentials = state.credentials.clone();
    let checked_username = username.clone();
    let valid =
        tokio::task::spawn_blocking(move || credentials.validate(&checked_username, &password))
            .await
            .map_err(|e| ApiError::Internal(format!("credential check panicked: {e}")))?;

    if !valid {
        warn!(client = %client, remaining, "Failed login attempt");
        let mut response =
            ApiError::Unauthorized("Invalid credentials".to_string()).into_response();
        response
            .headers_mut()
            .insert("x-ratelimit-remaining", HeaderValue::from(remaining));
        return Ok(response);
    }

    state.rate_limiter.clear(&client).await;
    let token = state.signer.issue(&username);
    info!(client = %client, "Admin logged in");

    let mut response = Json(
        ApiResponse::data(SessionStatus {
            authenticated: true,
            username: Some(username),
        })
        .with_message("Login successful"),
    )
    .into_response();
    set_cookie(
        &mut response,
        &session_cookie(&token, state.signer.ttl().as_secs(), state.secure_cookies),
    );
    Ok(response)
}

/// Handle logout by expiring the session cookie.
pub async fn logout_handler(State(state): State<AppState>) -> Response {
    let mut response = Json(ApiResponse::message("Logged out successfully")).into_response();
    set_cookie(&mut response, &clear_session_cookie(state.secure_cookies));
    response
}

/// Report whether the request is authenticated. Never fails.
pub async fn check_handler(
    session: Option<AdminSession>,
) -> Json<ApiResponse<SessionStatus>> {
    Json(ApiResponse::data(SessionStatus {
        authenticated: session.is_some(),
        username: session.map(|s| s.0.username),
    }))
}

/// Issue a CSRF token in both the body and a cookie.
pub async fn csrf_handler(State(state): State<AppState>) -> Response {
    let token = generate_csrf_token();
    let mut response = Json(ApiResponse::data(CsrfTokenResponse {
        csrf_token: token.clone(),
    }))
    .into_response();
    set_cookie(&mut response, &csrf_cookie(&token, state.secure_cookies));
    response
}

// =============================================================================
// Tests
// =============================================================================
