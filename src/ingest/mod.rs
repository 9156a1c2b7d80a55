//! Image ingestion pipeline.
//!
//! ```text
//! upload bytes ──► detect (size, magic bytes, header, decode)
//!                      │
//!                      ▼
//!                  upload (sequential name, temp file + rename)
//!                      │
//!                      ▼
//!                  thumbnail (resize, WebP, fallback copy)
//! ```
//!
//! [`scan`] derives a category's image list from disk and repairs it along
//! the way; [`print`] packages a stored image for printing.

pub mod detect;
pub mod print;
pub mod scan;
pub mod thumbnail;
pub mod upload;

pub use detect::{
    validate_upload, ImageKind, ValidatedImage, ALLOWED_EXTENSIONS, MAX_DIMENSION,
    MAX_UPLOAD_BYTES, MIN_IMAGE_FILE_SIZE,
};
pub use print::{PrintSource, DEFAULT_PRINT_FILENAME};
pub use scan::natural_cmp;
pub use thumbnail::{
    ThumbnailOutcome, ThumbnailSettings, DEFAULT_THUMBNAIL_MAX_EDGE, DEFAULT_THUMBNAIL_QUALITY,
};
pub use upload::SavedUpload;
