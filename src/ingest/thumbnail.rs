//! WebP thumbnail generation.
//!
//! Thumbnails are bounded by a maximum edge length, never enlarged, and
//! encoded as lossy WebP. When encoding fails the original bytes are copied
//! in place of the thumbnail so a listing never points at a missing file.

use std::path::Path;

use image::imageops::FilterType;
use image::DynamicImage;
use thiserror::Error;
use tracing::warn;

use crate::storage;

/// Default bound on the longer edge of a thumbnail, in pixels.
pub const DEFAULT_THUMBNAIL_MAX_EDGE: u32 = 1200;

/// Default lossy WebP quality (0-100).
pub const DEFAULT_THUMBNAIL_QUALITY: u8 = 85;

/// Errors from decoding or encoding a thumbnail.
#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error("failed to decode source image: {0}")]
    Decode(String),

    #[error("failed to encode WebP thumbnail: {0}")]
    Encode(String),

    #[error("failed to write thumbnail: {0}")]
    Write(#[from] std::io::Error),
}

/// How a thumbnail ended up on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailOutcome {
    /// A resized WebP was written
    Encoded,
    /// Encoding failed; the original bytes were copied instead
    CopiedOriginal,
    /// Neither encoding nor the fallback copy succeeded
    Missing,
}

/// Thumbnail size and quality settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailSettings {
    pub max_edge: u32,
    pub quality: u8,
}

impl Default for ThumbnailSettings {
    fn default() -> Self {
        Self {
            max_edge: DEFAULT_THUMBNAIL_MAX_EDGE,
            quality: DEFAULT_THUMBNAIL_QUALITY,
        }
    }
}

impl ThumbnailSettings {
    pub fn new(max_edge: u32, quality: u8) -> Self {
        Self {
            max_edge: max_edge.max(1),
            quality: quality.min(100),
        }
    }

    /// Resize `image` to fit within `max_edge`, preserving aspect ratio.
    ///
    /// Images already within bounds are returned unchanged.
    pub fn fit(&self, image: &DynamicImage) -> DynamicImage {
        if image.width() > self.max_edge || image.height() > self.max_edge {
            image.resize(self.max_edge, self.max_edge, FilterType::Lanczos3)
        } else {
            image.clone()
        }
    }

    /// Resize and encode a decoded image as WebP.
    pub fn encode(&self, image: &DynamicImage) -> Result<Vec<u8>, ThumbnailError> {
        let fitted = self.fit(image);
        let rgba = fitted.to_rgba8();
        let encoder = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height());
        let encoded = encoder
            .encode_simple(false, f32::from(self.quality))
            .map_err(|e| ThumbnailError::Encode(format!("{e:?}")))?;
        Ok(encoded.to_vec())
    }

    /// Decode raw image bytes and encode a WebP thumbnail.
    pub fn encode_bytes(&self, source: &[u8]) -> Result<Vec<u8>, ThumbnailError> {
        let image =
            image::load_from_memory(source).map_err(|e| ThumbnailError::Decode(e.to_string()))?;
        self.encode(&image)
    }
}

/// Write a thumbnail for an already-decoded upload.
pub async fn write_from_image(
    image: DynamicImage,
    original: &Path,
    dest: &Path,
    settings: ThumbnailSettings,
) -> ThumbnailOutcome {
    let encoded = tokio::task::spawn_blocking(move || settings.encode(&image)).await;
    finish(encoded.map_err(join_error), original, dest).await
}

/// Generate a thumbnail for an original file on disk.
pub async fn write_from_file(
    original: &Path,
    dest: &Path,
    settings: ThumbnailSettings,
) -> ThumbnailOutcome {
    let source = original.to_path_buf();
    let encoded = tokio::task::spawn_blocking(move || {
        let bytes = std::fs::read(&source)?;
        settings.encode_bytes(&bytes)
    })
    .await;
    finish(encoded.map_err(join_error), original, dest).await
}

fn join_error(err: tokio::task::JoinError) -> ThumbnailError {
    ThumbnailError::Encode(err.to_string())
}

async fn finish(
    encoded: Result<Result<Vec<u8>, ThumbnailError>, ThumbnailError>,
    original: &Path,
    dest: &Path,
) -> ThumbnailOutcome {
    let written = match encoded.and_then(|inner| inner) {
        Ok(bytes) => storage::write_atomic(dest, &bytes)
            .await
            .map_err(ThumbnailError::from),
        Err(e) => Err(e),
    };

    match written {
        Ok(()) => ThumbnailOutcome::Encoded,
        Err(err) => {
            warn!(
                original = %original.display(),
                error = %err,
                "Thumbnail generation failed, copying original"
            );
            match copy_original(original, dest).await {
                Ok(()) => ThumbnailOutcome::CopiedOriginal,
                Err(copy_err) => {
                    warn!(
                        original = %original.display(),
                        error = %copy_err,
                        "Thumbnail fallback copy failed"
                    );
                    ThumbnailOutcome::Missing
                }
            }
        }
    }
}

async fn copy_original(original: &Path, dest: &Path) -> std::io::Result<()> {
    let bytes = tokio::fs::read(original).await?;
    storage::write_atomic(dest, &bytes).await
}

// =============================================================================
// Tests
// =============================================================================
