//! Signed session tokens.
//!
//! # Token format
//!
//! ```text
//! token = base64url(json(claims)) "." hex(HMAC-SHA256(secret, base64url(json(claims))))
//! ```
//!
//! The same signer issues tokens at login and verifies them both in the edge
//! guard and in handlers, so there is exactly one notion of a valid session.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

/// HMAC-SHA256 type alias
type HmacSha256 = Hmac<Sha256>;

/// Lifetime of a session token.
pub const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Role embedded in every admin token.
pub const ADMIN_ROLE: &str = "admin";

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub username: String,
    pub role: String,
    /// Issued at, Unix seconds
    pub iat: u64,
    /// Expires at, Unix seconds
    pub exp: u64,
}

/// Why a token was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Malformed session token")]
    Malformed,

    #[error("Invalid session token signature")]
    InvalidSignature,

    #[error("Session expired at {expired_at} (current time: {current_time})")]
    Expired { expired_at: u64, current_time: u64 },

    #[error("Session token does not belong to the admin account")]
    UnknownUser,
}

/// Current Unix time in seconds.
pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Issues and verifies admin session tokens.
#[derive(Clone)]
pub struct SessionSigner {
    /// Secret key for HMAC computation
    secret_key: Vec<u8>,
    admin_username: String,
    ttl: Duration,
}

impl std::fmt::Debug for SessionSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSigner")
            .field("admin_username", &self.admin_username)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl SessionSigner {
    /// Create a signer for the given admin account.
    ///
    /// The secret should be at least 32 bytes.
    pub fn new(secret_key: impl AsRef<[u8]>, admin_username: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.as_ref().to_vec(),
            admin_username: admin_username.into(),
            ttl: SESSION_TTL,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `username`, valid from now.
    pub fn issue(&self, username: &str) -> String {
        self.issue_at(username, now_secs())
    }

    /// Issue a token with an explicit issue time.
    pub fn issue_at(&self, username: &str, issued_at: u64) -> String {
        let claims = SessionClaims {
            username: username.to_string(),
            role: ADMIN_ROLE.to_string(),
            iat: issued_at,
            exp: issued_at.saturating_add(self.ttl.as_secs()),
        };
        // Serializing a struct of strings and integers cannot fail.
        let json = serde_json::to_vec(&claims).unwrap_or_default();
        let payload = URL_SAFE_NO_PAD.encode(json);
        let signature = hex::encode(self.compute_signature(&payload));
        format!("{payload}.{signature}")
    }

    /// Verify a token against the current time.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        self.verify_at(token, now_secs())
    }

    /// Verify signature, expiry, role and account.
    pub fn verify_at(&self, token: &str, current_time: u64) -> Result<SessionClaims, TokenError> {
        let (payload, signature) = token.split_once('.').ok_or(TokenError::Malformed)?;
        let provided = hex::decode(signature).map_err(|_| TokenError::Malformed)?;

        // Constant-time comparison
        let expected = self.compute_signature(payload);
        if !bool::from(provided.ct_eq(&expected)) {
            return Err(TokenError::InvalidSignature);
        }

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::Malformed)?;
        let claims: SessionClaims =
            serde_json::from_slice(&json).map_err(|_| TokenError::Malformed)?;

        if current_time > claims.exp {
            return Err(TokenError::Expired {
                expired_at: claims.exp,
                current_time,
            });
        }

        if claims.role != ADMIN_ROLE || claims.username != self.admin_username {
            return Err(TokenError::UnknownUser);
        }

        Ok(claims)
    }

    /// Compute the HMAC-SHA256 signature for an encoded payload.
    fn compute_signature(&self, payload: &str) -> Vec<u8> {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret_key).expect("HMAC can take key of any size");
        mac.update(payload.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

// =============================================================================
// Tests
// =============================================================================
