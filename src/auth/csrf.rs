//! Double-submit CSRF tokens.

use rand::RngCore;
use subtle::ConstantTimeEq;

/// Cookie carrying the CSRF token.
pub const CSRF_COOKIE: &str = "csrf-token";

/// Header the client echoes the token into.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Lifetime of the CSRF cookie, in seconds.
pub const CSRF_COOKIE_MAX_AGE: u64 = 60 * 60;

/// 32 random bytes, hex encoded.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Whether the header and cookie tokens are both present, non-empty and equal.
pub fn tokens_match(header: Option<&str>, cookie: Option<&str>) -> bool {
    match (header, cookie) {
        (Some(header), Some(cookie)) if !header.is_empty() && !cookie.is_empty() => {
            header.as_bytes().ct_eq(cookie.as_bytes()).into()
        }
        _ => false,
    }
}
