//! Admin authentication.
//!
//! - [`credentials`]: the admin account and password verification
//! - [`token`]: HMAC-signed session tokens
//! - [`rate_limit`]: per-client login throttling over a pluggable store
//! - [`csrf`]: double-submit anti-forgery tokens

pub mod credentials;
pub mod csrf;
pub mod rate_limit;
pub mod token;

pub use credentials::{hash_password, AdminCredentials, CredentialError};
pub use csrf::{generate_token as generate_csrf_token, CSRF_COOKIE, CSRF_HEADER};
pub use rate_limit::{
    AttemptRecord, AttemptStore, InMemoryAttemptStore, LoginRateLimiter, RateLimitDecision,
    Reservation, LOGIN_WINDOW, MAX_LOGIN_ATTEMPTS, PURGE_INTERVAL,
};
pub use token::{SessionClaims, SessionSigner, TokenError, ADMIN_ROLE, SESSION_TTL};
