//! Persisting validated uploads under sequential names.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::{debug, info};

use super::detect::{ValidatedImage, ALLOWED_EXTENSIONS};
use super::scan;
use super::thumbnail::{self, ThumbnailOutcome, ThumbnailSettings};
use crate::catalog::{CatalogLayout, CategoryDirs};
use crate::error::IngestError;
use crate::storage;

/// Width of the zero-padded sequence number in generated names.
pub const SEQUENCE_WIDTH: usize = 3;

/// Files written for one accepted upload.
#[derive(Debug, Clone)]
pub struct SavedUpload {
    pub basename: String,
    pub original: PathBuf,
    pub thumbnail: PathBuf,
    pub thumbnail_outcome: ThumbnailOutcome,
}

/// `{dir}-{NNN}` for a sequence number.
pub fn sequential_basename(dir_name: &str, index: u32) -> String {
    format!("{dir_name}-{index:0width$}", width = SEQUENCE_WIDTH)
}

/// Trailing `-NNN` sequence number of a filename, if any.
pub fn trailing_index(filename: &str) -> Option<u32> {
    let stem = Path::new(filename).file_stem()?.to_str()?;
    let (_, digits) = stem.rsplit_once('-')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Whether any original (under any allowed extension) or the thumbnail
/// already uses `basename`.
async fn basename_taken(dirs: &CategoryDirs, basename: &str) -> bool {
    for ext in ALLOWED_EXTENSIONS {
        if storage::exists(&dirs.original.join(format!("{basename}.{ext}"))).await {
            return true;
        }
    }
    storage::exists(&dirs.thumbnail_for(basename)).await
}

/// Pick the next free sequential basename for a category.
///
/// Starts one past the highest existing sequence number and probes upward
/// until no file in either subdirectory uses the name.
pub async fn next_basename(dirs: &CategoryDirs) -> Result<String, IngestError> {
    let existing = scan::list_original_files(&dirs.original).await?;
    let mut index = existing
        .iter()
        .filter_map(|name| trailing_index(name))
        .max()
        .unwrap_or(0)
        .saturating_add(1);

    loop {
        let candidate = sequential_basename(&dirs.dir_name, index);
        if !basename_taken(dirs, &candidate).await {
            return Ok(candidate);
        }
        debug!(candidate = %candidate, "Sequential name taken, probing next");
        index = index.saturating_add(1);
    }
}

/// Write a validated upload and its thumbnail into a category.
///
/// The caller must hold the category's write lock so sequence numbers are
/// not handed out twice.
pub async fn save(
    layout: &CatalogLayout,
    category_slug: &str,
    validated: ValidatedImage,
    data: Bytes,
    settings: ThumbnailSettings,
) -> Result<SavedUpload, IngestError> {
    let dirs = layout
        .ensure_category_dirs(category_slug)
        .await
        .map_err(|e| IngestError::io(layout.category_dirs(category_slug).base, e))?;

    let basename = next_basename(&dirs).await?;
    let original = dirs
        .original
        .join(format!("{basename}.{}", validated.kind.extension()));
    let thumbnail_path = dirs.thumbnail_for(&basename);

    storage::write_atomic(&original, &data)
        .await
        .map_err(|e| IngestError::io(&original, e))?;

    let thumbnail_outcome =
        thumbnail::write_from_image(validated.image, &original, &thumbnail_path, settings).await;

    info!(
        category = %category_slug,
        file = %original.display(),
        width = validated.width,
        height = validated.height,
        bytes = data.len(),
        thumbnail = ?thumbnail_outcome,
        "Stored uploaded image"
    );

    Ok(SavedUpload {
        basename,
        original,
        thumbnail: thumbnail_path,
        thumbnail_outcome,
    })
}
