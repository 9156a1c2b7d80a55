//! # Coloring Catalog
//!
//! A catalog server for categorized coloring-page galleries stored on the
//! local filesystem.
//!
//! The catalog keeps category metadata in a JSON index and derives each
//! category's image list from its directory on every read. An administrator
//! manages categories and uploads or deletes images through a
//! session-authenticated API; visitors browse the galleries and fetch
//! print-ready images.
//!
//! ## Features
//!
//! - **Self-healing catalog**: unreadable or near-empty images are pruned while scanning
//! - **Safe ingestion**: magic-byte detection, decode and dimension checks, atomic writes
//! - **Thumbnails**: WebP thumbnails generated on upload or on first scan
//! - **Admin sessions**: Argon2 passwords, HMAC-SHA256 session cookies, login rate limiting
//! - **CSRF protection**: double-submit tokens enforced by an edge middleware
//!
//! ## Architecture
//!
//! - [`slug`] - Slug normalization and directory naming
//! - [`catalog`] - Category index, on-disk layout and the catalog store
//! - [`ingest`] - Upload validation, thumbnails, directory scans and print sources
//! - [`auth`] - Credentials, session tokens, rate limiting and CSRF tokens
//! - [`server`] - Axum-based HTTP API, edge guard and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use coloring_catalog::{
//!     create_router, AdminCredentials, AppState, CatalogLayout, CatalogStore, RouterConfig,
//!     SessionSigner,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let layout = CatalogLayout::new("data", "public/coloring-pages");
//!     let store = CatalogStore::new(layout);
//!     let credentials = AdminCredentials::with_plaintext("admin", "change-me");
//!     let signer = SessionSigner::new("a-session-secret-of-at-least-32-bytes", "admin");
//!
//!     let router = create_router(
//!         AppState::new(store, credentials, signer),
//!         RouterConfig::new(),
//!     );
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod ingest;
pub mod server;
pub mod slug;
pub mod storage;

// Re-export commonly used types
pub use auth::{
    hash_password, AdminCredentials, AttemptStore, InMemoryAttemptStore, LoginRateLimiter,
    RateLimitDecision, SessionClaims, SessionSigner, TokenError,
};
pub use catalog::{
    CatalogLayout, CatalogStore, Category, CategoryImage, CategoryUpdate, NewCategory,
    UploadedImage,
};
pub use config::{Cli, Command, HashPasswordConfig, ServeConfig, StorageArgs, SyncConfig};
pub use error::{CatalogError, IngestError};
pub use ingest::{validate_upload, ImageKind, PrintSource, ThumbnailSettings};
pub use server::{create_router, edge_guard, ApiError, AppState, RouterConfig};
