//! Derive a category's image list from its `original/` directory.
//!
//! The directory listing is the source of truth. Each scan also repairs the
//! directory: undersized or unreadable originals are pruned together with
//! their thumbnails, and missing thumbnails are generated.

use std::cmp::Ordering;
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use super::detect::{self, MIN_IMAGE_FILE_SIZE};
use super::thumbnail::{self, ThumbnailSettings};
use crate::catalog::{CatalogLayout, CategoryDirs, CategoryImage, ORIGINAL_DIR_NAME, THUMBNAIL_DIR_NAME};
use crate::error::IngestError;
use crate::slug;
use crate::storage;

/// Maximum number of files inspected concurrently within one category.
pub const SCAN_CONCURRENCY: usize = 8;

/// Compare two filenames case-insensitively, ordering embedded digit runs by
/// numeric value (`img-2` before `img-10`).
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let l = take_digits(&mut left);
                let r = take_digits(&mut right);
                let l = l.trim_start_matches('0');
                let r = r.trim_start_matches('0');
                let ord = l.len().cmp(&r.len()).then_with(|| l.cmp(r));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                let ord = x.to_lowercase().cmp(y.to_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.next_if(|c| c.is_ascii_digit()) {
        digits.push(c);
    }
    digits
}

/// List allowed original filenames in a directory, naturally sorted.
///
/// A missing directory yields an empty list.
pub async fn list_original_files(dir: &Path) -> Result<Vec<String>, IngestError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(IngestError::io(dir, e)),
    };

    let mut names = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| IngestError::io(dir, e))?
    {
        let is_file = entry
            .file_type()
            .await
            .map(|t| t.is_file())
            .unwrap_or(false);
        if !is_file {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        if !name.starts_with('.') && detect::has_allowed_extension(Path::new(&name)) {
            names.push(name);
        }
    }

    names.sort_by(|a, b| natural_cmp(a, b));
    Ok(names)
}

/// Enumerate, repair and describe every image of a category.
pub async fn enumerate(
    layout: &CatalogLayout,
    category_slug: &str,
    settings: ThumbnailSettings,
) -> Result<Vec<CategoryImage>, IngestError> {
    let normalized = slug::normalize(category_slug);
    let dirs = layout
        .ensure_category_dirs(&normalized)
        .await
        .map_err(|e| IngestError::io(layout.category_dirs(&normalized).base, e))?;

    let names = list_original_files(&dirs.original).await?;

    let images = stream::iter(names)
        .map(|name| inspect(layout, &dirs, &normalized, name, settings))
        .buffered(SCAN_CONCURRENCY)
        .filter_map(|image| async move { image })
        .collect::<Vec<_>>()
        .await;

    Ok(images)
}

/// Inspect one original; `None` means it was skipped or pruned.
async fn inspect(
    layout: &CatalogLayout,
    dirs: &CategoryDirs,
    category_slug: &str,
    filename: String,
    settings: ThumbnailSettings,
) -> Option<CategoryImage> {
    let original = dirs.original.join(&filename);
    let basename = Path::new(&filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(&filename)
        .to_string();
    let thumbnail = dirs.thumbnail_for(&basename);

    let metadata = match tokio::fs::metadata(&original).await {
        Ok(metadata) => metadata,
        Err(e) => {
            warn!(file = %original.display(), error = %e, "Skipping unreadable image");
            return None;
        }
    };

    if metadata.len() < MIN_IMAGE_FILE_SIZE {
        warn!(
            file = %original.display(),
            size = metadata.len(),
            "Pruning undersized image"
        );
        prune(&original, &thumbnail).await;
        return None;
    }

    let probe_path = original.clone();
    let dimensions =
        tokio::task::spawn_blocking(move || detect::probe_file_dimensions(&probe_path)).await;
    let (width, height) = match dimensions {
        Ok(Ok(dims)) => dims,
        Ok(Err(e)) => {
            warn!(file = %original.display(), error = %e, "Pruning unreadable image");
            prune(&original, &thumbnail).await;
            return None;
        }
        Err(e) => {
            warn!(file = %original.display(), error = %e, "Image probe task failed");
            return None;
        }
    };

    if !storage::exists(&thumbnail).await {
        debug!(file = %original.display(), "Generating missing thumbnail");
        thumbnail::write_from_file(&original, &thumbnail, settings).await;
    }

    let thumbnail_size = match tokio::fs::metadata(&thumbnail).await {
        Ok(metadata) => metadata.len(),
        Err(e) => {
            warn!(file = %thumbnail.display(), error = %e, "Skipping image without thumbnail");
            return None;
        }
    };

    let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
    let thumbnail_filename = thumbnail
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();

    Some(CategoryImage {
        id: format!("{category_slug}-{basename}"),
        original_path: layout.public_path(&dirs.dir_name, ORIGINAL_DIR_NAME, &filename),
        thumbnail_path: layout.public_path(&dirs.dir_name, THUMBNAIL_DIR_NAME, &thumbnail_filename),
        original_filename: filename,
        original_size: metadata.len(),
        thumbnail_size,
        width,
        height,
        upload_date: DateTime::<Utc>::from(modified),
    })
}

async fn prune(original: &Path, thumbnail: &Path) {
    for path in [original, thumbnail] {
        if let Err(e) = storage::remove_if_exists(path).await {
            warn!(file = %path.display(), error = %e, "Failed to prune file");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
