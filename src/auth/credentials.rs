//! Admin credential checking and password hashing.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::RngCore;
use subtle::ConstantTimeEq;
use thiserror::Error;

/// Errors from configuring credentials or hashing a password.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("invalid password hash: {0}")]
    InvalidHash(String),

    #[error("failed to hash password: {0}")]
    Hashing(String),
}

/// How the admin password is checked.
#[derive(Clone)]
enum PasswordCheck {
    /// Argon2 PHC string
    Hash(String),
    /// Direct comparison; development only, requires explicit opt-in
    Plaintext(String),
}

/// The single admin account.
#[derive(Clone)]
pub struct AdminCredentials {
    username: String,
    password: PasswordCheck,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match self.password {
            PasswordCheck::Hash(_) => "hash",
            PasswordCheck::Plaintext(_) => "plaintext",
        };
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password", &mode)
            .finish()
    }
}

impl AdminCredentials {
    /// Credentials checked against an Argon2 PHC hash.
    pub fn with_hash(
        username: impl Into<String>,
        phc: impl Into<String>,
    ) -> Result<Self, CredentialError> {
        let phc = phc.into();
        PasswordHash::new(&phc).map_err(|e| CredentialError::InvalidHash(e.to_string()))?;
        Ok(Self {
            username: username.into(),
            password: PasswordCheck::Hash(phc),
        })
    }

    /// Credentials checked against a plaintext password.
    pub fn with_plaintext(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: PasswordCheck::Plaintext(password.into()),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn uses_plaintext(&self) -> bool {
        matches!(self.password, PasswordCheck::Plaintext(_))
    }

    /// Check a username/password pair.
    ///
    /// The password is always checked, even when the username is wrong, so
    /// both outcomes take the same path. Hash verification is CPU-heavy; call
    /// from a blocking task.
    pub fn validate(&self, username: &str, password: &str) -> bool {
        let username_ok: bool = username.as_bytes().ct_eq(self.username.as_bytes()).into();

        let password_ok = match &self.password {
            PasswordCheck::Hash(phc) => match PasswordHash::new(phc) {
                Ok(parsed) => Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok(),
                Err(_) => false,
            },
            PasswordCheck::Plaintext(expected) => {
                password.as_bytes().ct_eq(expected.as_bytes()).into()
            }
        };

        username_ok && password_ok
    }
}

/// Hash a password into an Argon2id PHC string.
pub fn hash_password(password: &str) -> Result<String, CredentialError> {
    let mut salt_bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt_bytes);
    let salt =
        SaltString::encode_b64(&salt_bytes).map_err(|e| CredentialError::Hashing(e.to_string()))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CredentialError::Hashing(e.to_string()))
}
