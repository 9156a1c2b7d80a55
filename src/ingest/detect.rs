//! Upload validation: size, magic bytes, decodability and dimensions.
//!
//! The declared content type and filename of an upload are never trusted.
//! The file type comes from the leading magic bytes, and the bytes must then
//! decode as that type.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat, ImageReader};

use crate::error::IngestError;

/// Maximum accepted upload size (3 MiB).
pub const MAX_UPLOAD_BYTES: usize = 3 * 1024 * 1024;

/// Maximum accepted width or height in pixels.
pub const MAX_DIMENSION: u32 = 10_000;

/// Files smaller than this are treated as corrupt placeholders.
pub const MIN_IMAGE_FILE_SIZE: u64 = 1024;

/// Extensions (lowercase, without dot) accepted in a category's `original/`.
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// Accepted image types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
}

impl ImageKind {
    /// Extension used when persisting an original of this type.
    pub const fn extension(&self) -> &'static str {
        match self {
            ImageKind::Png => "png",
            ImageKind::Jpeg => "jpg",
        }
    }

    pub const fn mime_type(&self) -> &'static str {
        match self {
            ImageKind::Png => "image/png",
            ImageKind::Jpeg => "image/jpeg",
        }
    }

    pub const fn format(&self) -> ImageFormat {
        match self {
            ImageKind::Png => ImageFormat::Png,
            ImageKind::Jpeg => ImageFormat::Jpeg,
        }
    }

    fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "image/png" => Some(ImageKind::Png),
            "image/jpeg" => Some(ImageKind::Jpeg),
            _ => None,
        }
    }
}

/// An upload that passed every validation step.
#[derive(Debug, Clone)]
pub struct ValidatedImage {
    pub kind: ImageKind,
    pub width: u32,
    pub height: u32,
    /// Decoded pixels, reused for thumbnail generation
    pub image: DynamicImage,
}

/// Whether a filename carries an allowed original extension.
pub fn has_allowed_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            ALLOWED_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false)
}

/// Identify the image type from magic bytes.
pub fn detect_kind(data: &[u8]) -> Result<ImageKind, IngestError> {
    match infer::get(data) {
        Some(kind) => ImageKind::from_mime(kind.mime_type()).ok_or_else(|| {
            IngestError::UnsupportedType {
                detected: Some(kind.mime_type().to_string()),
            }
        }),
        None => Err(IngestError::UnsupportedType { detected: None }),
    }
}

/// Read dimensions from the image header without decoding pixel data.
pub fn read_dimensions(data: &[u8], kind: ImageKind) -> Result<(u32, u32), IngestError> {
    ImageReader::with_format(Cursor::new(data), kind.format())
        .into_dimensions()
        .map_err(|e| IngestError::Undecodable {
            message: e.to_string(),
        })
}

/// Run the full validation sequence on an upload.
///
/// Order matters: size first (cheap), then magic bytes and the minimum
/// size a scan would keep, then header
/// dimensions, and only then a full decode, so oversized images are refused
/// before any pixel buffer is allocated.
pub fn validate_upload(data: &[u8]) -> Result<ValidatedImage, IngestError> {
    if data.len() > MAX_UPLOAD_BYTES {
        return Err(IngestError::TooLarge {
            size: data.len(),
            max: MAX_UPLOAD_BYTES,
        });
    }

    let kind = detect_kind(data)?;
    if (data.len() as u64) < MIN_IMAGE_FILE_SIZE {
        return Err(IngestError::Undecodable {
            message: format!("file is smaller than {MIN_IMAGE_FILE_SIZE} bytes"),
        });
    }
    let (width, height) = read_dimensions(data, kind)?;

    if width == 0 || height == 0 {
        return Err(IngestError::Undecodable {
            message: "image has zero width or height".to_string(),
        });
    }
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(IngestError::DimensionsTooLarge {
            width,
            height,
            max: MAX_DIMENSION,
        });
    }

    let image = ImageReader::with_format(Cursor::new(data), kind.format())
        .decode()
        .map_err(|e| IngestError::Undecodable {
            message: e.to_string(),
        })?;

    Ok(ValidatedImage {
        kind,
        width,
        height,
        image,
    })
}

/// Read dimensions of an image file on disk, guessing its format from content.
pub fn probe_file_dimensions(path: &Path) -> Result<(u32, u32), image::ImageError> {
    ImageReader::open(path)?
        .with_guessed_format()?
        .into_dimensions()
}
