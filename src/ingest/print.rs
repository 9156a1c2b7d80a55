//! Print-ready image payloads.
//!
//! Re-encodes a catalog image into a self-contained data URL that a client
//! can embed into a printable document. PNG sources stay lossless; anything
//! else becomes a high-quality JPEG.

use std::io::Cursor;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, ImageReader};
use serde::Serialize;

use crate::error::IngestError;

/// JPEG quality used for non-PNG print sources.
pub const PRINT_JPEG_QUALITY: u8 = 95;

/// Filename suggested when the caller provides none.
pub const DEFAULT_PRINT_FILENAME: &str = "coloring-page.pdf";

/// An encoded image ready for embedding.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintSource {
    /// `data:<mime>;base64,<payload>`
    pub image_data: String,
    pub width: u32,
    pub height: u32,
    pub filename: String,
    pub mime: &'static str,
}

/// Re-encode image bytes for printing.
pub fn encode_print_source(source: &[u8]) -> Result<(Vec<u8>, &'static str, u32, u32), IngestError> {
    let reader = ImageReader::new(Cursor::new(source))
        .with_guessed_format()
        .map_err(|e| IngestError::Undecodable {
            message: e.to_string(),
        })?;
    let format = reader.format();
    let image = reader.decode().map_err(|e| IngestError::Undecodable {
        message: e.to_string(),
    })?;

    let mut output = Vec::new();
    let mime = if format == Some(ImageFormat::Png) {
        image
            .write_to(&mut Cursor::new(&mut output), ImageFormat::Png)
            .map_err(|e| IngestError::Undecodable {
                message: e.to_string(),
            })?;
        "image/png"
    } else {
        let rgb = image.to_rgb8();
        let mut encoder = JpegEncoder::new_with_quality(&mut output, PRINT_JPEG_QUALITY);
        encoder
            .encode_image(&rgb)
            .map_err(|e| IngestError::Undecodable {
                message: e.to_string(),
            })?;
        "image/jpeg"
    };

    Ok((output, mime, image.width(), image.height()))
}

/// Load an image file and build its print payload.
pub async fn prepare(path: &Path, filename: Option<String>) -> Result<PrintSource, IngestError> {
    let source = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(IngestError::ImageNotFound {
                identifier: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            })
        }
        Err(e) => return Err(IngestError::io(path, e)),
    };

    let (encoded, mime, width, height) =
        tokio::task::spawn_blocking(move || encode_print_source(&source))
            .await
            .map_err(|e| IngestError::io(path, std::io::Error::other(e.to_string())))??;

    Ok(PrintSource {
        image_data: format!("data:{mime};base64,{}", STANDARD.encode(encoded)),
        width,
        height,
        filename: filename
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PRINT_FILENAME.to_string()),
        mime,
    })
}
