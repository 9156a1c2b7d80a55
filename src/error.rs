use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the catalog store while managing category metadata.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A category with the same normalized slug is already in the index
    #[error("Category with slug \"{slug}\" already exists")]
    AlreadyExists { slug: String },

    /// No category with this slug exists
    #[error("Category not found: {slug}")]
    NotFound { slug: String },

    /// Filesystem failure while reading or writing catalog state
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The index could not be serialized
    #[error("Failed to serialize category index: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl CatalogError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CatalogError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors raised by the image ingestion pipeline.
///
/// The validation variants carry a caller-facing reason; `Io` is an internal
/// failure and should never reach a client verbatim.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Upload exceeds the maximum accepted size
    #[error("File size too large. Maximum size is {}MB", max / (1024 * 1024))]
    TooLarge { size: usize, max: usize },

    /// Magic bytes do not identify a PNG or JPEG
    #[error("Invalid image file. Only PNG and JPEG files are allowed.")]
    UnsupportedType { detected: Option<String> },

    /// Bytes look like an image but cannot be decoded
    #[error("Invalid image file: {message}")]
    Undecodable { message: String },

    /// Decoded dimensions exceed the sanity bound
    #[error("Image dimensions {width}x{height} exceed the maximum of {max}px")]
    DimensionsTooLarge { width: u32, height: u32, max: u32 },

    /// Upload or deletion targets a category that is not in the index
    #[error("Category not found: {slug}")]
    CategoryNotFound { slug: String },

    /// Deletion targets an image that does not exist in the category
    #[error("Image not found: {identifier}")]
    ImageNotFound { identifier: String },

    /// Filesystem failure while persisting image data
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl IngestError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IngestError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error describes bad input rather than a server failure.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            IngestError::TooLarge { .. }
                | IngestError::UnsupportedType { .. }
                | IngestError::Undecodable { .. }
                | IngestError::DimensionsTooLarge { .. }
        )
    }
}

impl From<CatalogError> for IngestError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound { slug } => IngestError::CategoryNotFound { slug },
            CatalogError::Io { path, source } => IngestError::Io { path, source },
            other => IngestError::Io {
                path: PathBuf::new(),
                source: std::io::Error::other(other.to_string()),
            },
        }
    }
}
