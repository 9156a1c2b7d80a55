//! Configuration management for the catalog server.
//!
//! This module provides a flexible configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables with `CATALOG_` prefix
//! - Sensible defaults for all optional settings
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use coloring_catalog::config::{Cli, Command};
//!
//! match Cli::parse().into_command() {
//!     Command::Serve(config) => println!("Listening on {}", config.bind_address()),
//!     _ => {}
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `CATALOG_HOST` - Server bind address (default: 0.0.0.0)
//! - `CATALOG_PORT` - Server port (default: 3000)
//! - `CATALOG_DATA_DIR` - Directory holding `categories.json` (default: data)
//! - `CATALOG_PAGES_DIR` - Root of the category image directories
//! - `CATALOG_PUBLIC_PREFIX` - URL prefix the images are served under
//! - `CATALOG_ADMIN_USERNAME` - Admin account name (default: admin)
//! - `CATALOG_ADMIN_PASSWORD_HASH` - Argon2 PHC string for the admin password
//! - `CATALOG_ADMIN_PASSWORD` - Plaintext password (needs `--allow-plaintext-password`)
//! - `CATALOG_SESSION_SECRET` - HMAC secret for session tokens (required)
//! - `CATALOG_SECURE_COOKIES` - Mark cookies `Secure`
//! - `CATALOG_THUMBNAIL_MAX_EDGE` - Longest thumbnail edge in pixels (default: 1200)
//! - `CATALOG_THUMBNAIL_QUALITY` - WebP thumbnail quality (default: 85)
//! - `CATALOG_ADMIN_DIR` - Static admin front-end directory
//! - `CATALOG_CORS_ORIGINS` - Allowed CORS origins, comma-separated

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::auth::AdminCredentials;
use crate::catalog::{CatalogLayout, DEFAULT_PUBLIC_PREFIX};
use crate::ingest::{ThumbnailSettings, DEFAULT_THUMBNAIL_MAX_EDGE, DEFAULT_THUMBNAIL_QUALITY};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default directory for the category index.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Default root of the category image directories.
pub const DEFAULT_PAGES_DIR: &str = "public/coloring-pages";

/// Default admin account name.
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// Minimum session secret length in bytes.
pub const MIN_SESSION_SECRET_LEN: usize = 32;

/// Accepted range for the thumbnail's longest edge.
pub const THUMBNAIL_EDGE_RANGE: (u32, u32) = (16, 10_000);

// =============================================================================
// CLI Arguments
// =============================================================================

/// Coloring Catalog - a coloring page catalog server.
///
/// Serves category galleries from a directory tree, with an authenticated
/// admin API for managing categories and uploading images.
#[derive(Parser, Debug, Clone)]
#[command(name = "coloring-catalog")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn into_command(self) -> Command {
        self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP server.
    Serve(ServeConfig),

    /// Print an Argon2id hash for an admin password.
    HashPassword(HashPasswordConfig),

    /// Register category directories missing from the index and report image counts.
    Sync(SyncConfig),
}

/// Catalog storage locations, shared by `serve` and `sync`.
#[derive(Args, Debug, Clone)]
pub struct StorageArgs {
    /// Directory holding the category index (`categories.json`).
    #[arg(long, default_value = DEFAULT_DATA_DIR, env = "CATALOG_DATA_DIR")]
    pub data_dir: PathBuf,

    /// Root directory of the per-category image folders.
    #[arg(long, default_value = DEFAULT_PAGES_DIR, env = "CATALOG_PAGES_DIR")]
    pub pages_dir: PathBuf,

    /// URL prefix the pages directory is served under.
    #[arg(long, default_value = DEFAULT_PUBLIC_PREFIX, env = "CATALOG_PUBLIC_PREFIX")]
    pub public_prefix: String,

    /// Longest thumbnail edge in pixels.
    #[arg(long, default_value_t = DEFAULT_THUMBNAIL_MAX_EDGE, env = "CATALOG_THUMBNAIL_MAX_EDGE")]
    pub thumbnail_max_edge: u32,

    /// WebP thumbnail quality (1-100).
    #[arg(long, default_value_t = DEFAULT_THUMBNAIL_QUALITY, env = "CATALOG_THUMBNAIL_QUALITY")]
    pub thumbnail_quality: u8,
}

impl StorageArgs {
    pub fn validate(&self) -> Result<(), String> {
        if self.public_prefix.trim_matches('/').is_empty() {
            return Err("public_prefix must not be the site root".to_string());
        }

        if self.thumbnail_quality == 0 || self.thumbnail_quality > 100 {
            return Err("thumbnail_quality must be between 1 and 100".to_string());
        }

        let (min_edge, max_edge) = THUMBNAIL_EDGE_RANGE;
        if self.thumbnail_max_edge < min_edge || self.thumbnail_max_edge > max_edge {
            return Err(format!(
                "thumbnail_max_edge must be between {min_edge} and {max_edge}"
            ));
        }

        Ok(())
    }

    pub fn layout(&self) -> CatalogLayout {
        CatalogLayout::new(&self.data_dir, &self.pages_dir).with_public_prefix(&self.public_prefix)
    }

    pub fn thumbnail_settings(&self) -> ThumbnailSettings {
        ThumbnailSettings::new(self.thumbnail_max_edge, self.thumbnail_quality)
    }
}

/// Arguments of the `serve` command.
#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "CATALOG_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "CATALOG_PORT")]
    pub port: u16,

    #[command(flatten)]
    pub storage: StorageArgs,

    /// Directory with the admin front-end, served under /admin.
    #[arg(long, env = "CATALOG_ADMIN_DIR")]
    pub admin_dir: Option<PathBuf>,

    // =========================================================================
    // Authentication Configuration
    // =========================================================================
    /// Admin account name.
    #[arg(long, default_value = DEFAULT_ADMIN_USERNAME, env = "CATALOG_ADMIN_USERNAME")]
    pub admin_username: String,

    /// Argon2 PHC string for the admin password (see `hash-password`).
    #[arg(long, env = "CATALOG_ADMIN_PASSWORD_HASH")]
    pub admin_password_hash: Option<String>,

    /// Plaintext admin password. Only used with --allow-plaintext-password.
    #[arg(long, env = "CATALOG_ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,

    /// Accept --admin-password when no hash is configured.
    ///
    /// WARNING: Only for development.
    #[arg(long, default_value_t = false, env = "CATALOG_ALLOW_PLAINTEXT_PASSWORD")]
    pub allow_plaintext_password: bool,

    /// Secret key for HMAC-SHA256 session tokens (at least 32 bytes).
    #[arg(long, env = "CATALOG_SESSION_SECRET", hide_env_values = true)]
    pub session_secret: Option<String>,

    /// Set the `Secure` attribute on cookies (serve over HTTPS).
    #[arg(long, default_value_t = false, env = "CATALOG_SECURE_COOKIES")]
    pub secure_cookies: bool,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "CATALOG_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        match self.session_secret.as_deref() {
            None | Some("") => {
                return Err(
                    "No session secret provided. Set --session-secret or CATALOG_SESSION_SECRET"
                        .to_string(),
                );
            }
            Some(secret) if secret.len() < MIN_SESSION_SECRET_LEN => {
                return Err(format!(
                    "session_secret must be at least {MIN_SESSION_SECRET_LEN} bytes"
                ));
            }
            Some(_) => {}
        }

        if self.admin_username.trim().is_empty() {
            return Err("admin_username must not be empty".to_string());
        }

        let has_hash = self
            .admin_password_hash
            .as_deref()
            .is_some_and(|h| !h.is_empty());
        let has_plaintext = self
            .admin_password
            .as_deref()
            .is_some_and(|p| !p.is_empty());
        if !has_hash {
            if !has_plaintext {
                return Err(
                    "No admin password configured. Set --admin-password-hash or \
                     CATALOG_ADMIN_PASSWORD_HASH (generate one with `hash-password`)"
                        .to_string(),
                );
            }
            if !self.allow_plaintext_password {
                return Err(
                    "A plaintext admin password requires --allow-plaintext-password; \
                     prefer --admin-password-hash"
                        .to_string(),
                );
            }
        }

        self.storage.validate()
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Session secret, empty if unset (call validate() first).
    pub fn session_secret_or_empty(&self) -> &str {
        self.session_secret.as_deref().unwrap_or("")
    }

    /// Build the admin credentials. A configured hash always wins over a
    /// plaintext password.
    pub fn credentials(&self) -> Result<AdminCredentials, String> {
        match self.admin_password_hash.as_deref().filter(|h| !h.is_empty()) {
            Some(hash) => AdminCredentials::with_hash(&self.admin_username, hash)
                .map_err(|e| e.to_string()),
            None => match self.admin_password.as_deref() {
                Some(password) if self.allow_plaintext_password && !password.is_empty() => Ok(
                    AdminCredentials::with_plaintext(&self.admin_username, password),
                ),
                _ => Err("No usable admin password configured".to_string()),
            },
        }
    }
}

/// Arguments of the `hash-password` command.
#[derive(Args, Debug, Clone)]
pub struct HashPasswordConfig {
    /// Password to hash. Read from stdin when omitted.
    pub password: Option<String>,
}

/// Arguments of the `sync` command.
#[derive(Args, Debug, Clone)]
pub struct SyncConfig {
    #[command(flatten)]
    pub storage: StorageArgs,

    /// Enable verbose logging.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

// =============================================================================
// Tests
// =============================================================================
