//! Filesystem-backed catalog store.
//!
//! The store keeps two sources of truth consistent:
//! - the JSON index holds category metadata only
//! - each category's `original/` directory holds its images
//!
//! Image lists are never read from the index; every read derives them from
//! disk through [`crate::ingest::scan`].
//!
//! # Concurrency
//!
//! Index mutations are serialised by a single mutex and land through an
//! atomic temp-file rename, so readers never observe a partial index.
//! Uploads, image deletions and category deletions take a per-category
//! lock, always before the index lock, so sequence numbers are handed out
//! once and an upload never recreates the directory of a category that was
//! deleted meanwhile.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde_json::Value;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error, info, warn};

use super::defaults::{
    default_categories, generated_description, generated_keywords, generated_meta_description,
};
use super::layout::CatalogLayout;
use super::model::{Category, CategoryImage, CategoryUpdate, NewCategory, UploadedImage};
use crate::error::{CatalogError, IngestError};
use crate::ingest::{detect, scan, upload, ThumbnailSettings};
use crate::slug;
use crate::storage;

/// Categories scanned concurrently when listing with images.
const CATEGORY_SCAN_CONCURRENCY: usize = 4;

// =============================================================================
// Keyed locks
// =============================================================================

/// One async mutex per key, created on first use.
#[derive(Default)]
struct KeyedLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl KeyedLocks {
    async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.entry(key.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }
}

// =============================================================================
// CatalogStore
// =============================================================================

/// Catalog of categories and their images, rooted at a [`CatalogLayout`].
pub struct CatalogStore {
    layout: CatalogLayout,
    thumbnails: ThumbnailSettings,
    index_lock: Mutex<()>,
    category_locks: KeyedLocks,
}

impl CatalogStore {
    /// Create a store with default thumbnail settings.
    pub fn new(layout: CatalogLayout) -> Self {
        Self {
            layout,
            thumbnails: ThumbnailSettings::default(),
            index_lock: Mutex::new(()),
            category_locks: KeyedLocks::default(),
        }
    }

    pub fn with_thumbnail_settings(mut self, settings: ThumbnailSettings) -> Self {
        self.thumbnails = settings;
        self
    }

    pub fn layout(&self) -> &CatalogLayout {
        &self.layout
    }

    pub fn thumbnail_settings(&self) -> ThumbnailSettings {
        self.thumbnails
    }

    // -------------------------------------------------------------------------
    // Index persistence
    // -------------------------------------------------------------------------

    /// Read the index, seeding or falling back to defaults as needed.
    ///
    /// - missing file: defaults are written and returned
    /// - unreadable or unparsable file, non-array content, or no usable
    ///   entries: defaults are returned and the file is left alone
    async fn load_index(&self) -> Vec<Category> {
        let path = self.layout.index_path();
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let defaults = default_categories();
                match self.write_index(&defaults).await {
                    Ok(()) => info!(path = %path.display(), "Seeded category index with defaults"),
                    Err(e) => error!(error = %e, "Failed to seed category index"),
                }
                return defaults;
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to read category index, using defaults");
                return default_categories();
            }
        };

        let entries = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(entries)) => entries,
            Ok(_) => {
                error!(path = %path.display(), "Category index is not an array, using defaults");
                return default_categories();
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to parse category index, using defaults");
                return default_categories();
            }
        };

        let mut seen = HashSet::new();
        let categories: Vec<Category> = entries
            .iter()
            .filter_map(Category::from_index_value)
            .filter(|category| seen.insert(category.slug.clone()))
            .collect();

        if categories.is_empty() {
            warn!(path = %path.display(), "Category index has no usable entries, using defaults");
            return default_categories();
        }

        categories
    }

    /// Atomically replace the index. Images are never persisted.
    async fn write_index(&self, categories: &[Category]) -> Result<(), CatalogError> {
        let data_dir = self.layout.data_dir();
        tokio::fs::create_dir_all(data_dir)
            .await
            .map_err(|e| CatalogError::io(data_dir, e))?;

        let stripped: Vec<Category> = categories.iter().map(Category::without_images).collect();
        let mut json = serde_json::to_string_pretty(&stripped)?;
        json.push('\n');

        let path = self.layout.index_path();
        storage::write_atomic(&path, json.as_bytes())
            .await
            .map_err(|e| CatalogError::io(&path, e))?;
        debug!(path = %path.display(), count = categories.len(), "Wrote category index");
        Ok(())
    }

    /// Images of one category, derived from disk. Scan failures yield an
    /// empty list.
    async fn images_for(&self, category_slug: &str) -> Vec<CategoryImage> {
        match scan::enumerate(&self.layout, category_slug, self.thumbnails).await {
            Ok(images) => images,
            Err(e) => {
                error!(slug = %category_slug, error = %e, "Failed to scan category images");
                Vec::new()
            }
        }
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// All categories in index order, with empty image lists.
    pub async fn list_categories(&self) -> Vec<Category> {
        self.load_index().await
    }

    /// All categories in index order, each with its derived images.
    pub async fn list_categories_with_images(&self) -> Vec<Category> {
        let categories = self.load_index().await;
        stream::iter(categories)
            .map(|mut category| async move {
                category.images = self.images_for(&category.slug).await;
                category
            })
            .buffered(CATEGORY_SCAN_CONCURRENCY)
            .collect()
            .await
    }

    /// One category with its derived images, looked up by normalized slug.
    pub async fn get_category(&self, category_slug: &str) -> Option<Category> {
        let normalized = slug::normalize(category_slug);
        let mut category = self
            .load_index()
            .await
            .into_iter()
            .find(|c| c.slug == normalized)?;
        category.images = self.images_for(&category.slug).await;
        Some(category)
    }

    /// Whether a category exists, without scanning its images.
    pub async fn contains(&self, category_slug: &str) -> bool {
        let normalized = slug::normalize(category_slug);
        self.load_index().await.iter().any(|c| c.slug == normalized)
    }

    // -------------------------------------------------------------------------
    // Category mutations
    // -------------------------------------------------------------------------

    /// Append a new category and create its directories.
    pub async fn add_category(&self, input: NewCategory) -> Result<Category, CatalogError> {
        let mut category = input.into_category();

        {
            let _guard = self.index_lock.lock().await;
            let mut categories = self.load_index().await;
            if categories.iter().any(|c| c.slug == category.slug) {
                return Err(CatalogError::AlreadyExists {
                    slug: category.slug,
                });
            }
            categories.push(category.clone());
            self.write_index(&categories).await?;
        }

        if let Err(e) = self.layout.ensure_category_dirs(&category.slug).await {
            warn!(slug = %category.slug, error = %e, "Failed to create category directories");
        }

        info!(slug = %category.slug, "Added category");
        category.images = self.images_for(&category.slug).await;
        Ok(category)
    }

    /// Merge `update` into an existing category. The slug never changes.
    ///
    /// Returns `Ok(None)` when no category has this slug.
    pub async fn update_category(
        &self,
        category_slug: &str,
        update: CategoryUpdate,
    ) -> Result<Option<Category>, CatalogError> {
        let normalized = slug::normalize(category_slug);

        let mut updated = {
            let _guard = self.index_lock.lock().await;
            let mut categories = self.load_index().await;
            let Some(category) = categories.iter_mut().find(|c| c.slug == normalized) else {
                return Ok(None);
            };
            update.apply_to(category);
            let updated = category.clone();
            self.write_index(&categories).await?;
            updated
        };

        info!(slug = %normalized, "Updated category");
        updated.images = self.images_for(&normalized).await;
        Ok(Some(updated))
    }

    /// Remove a category from the index and delete its directory tree.
    ///
    /// Returns `Ok(false)` when no category has this slug. Failure to remove
    /// the directory is logged; the index entry is already gone.
    pub async fn delete_category(&self, category_slug: &str) -> Result<bool, CatalogError> {
        let normalized = slug::normalize(category_slug);
        let _category_guard = self.category_locks.lock(&normalized).await;

        {
            let _guard = self.index_lock.lock().await;
            let categories = self.load_index().await;
            let before = categories.len();
            let remaining: Vec<Category> = categories
                .into_iter()
                .filter(|c| c.slug != normalized)
                .collect();
            if remaining.len() == before {
                return Ok(false);
            }
            self.write_index(&remaining).await?;
        }

        let base = self.layout.category_dirs(&normalized).base;
        match tokio::fs::remove_dir_all(&base).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(slug = %normalized, path = %base.display(), error = %e, "Failed to remove category directory");
            }
        }

        info!(slug = %normalized, "Deleted category");
        Ok(true)
    }

    /// Register every directory under the pages root that has no index
    /// entry, with generated metadata.
    ///
    /// Hidden directories are skipped. The index is written only when
    /// something was added. Returns the slugs that were added.
    pub async fn sync_with_file_system(&self) -> Result<Vec<String>, CatalogError> {
        let pages_dir = self.layout.pages_dir();
        tokio::fs::create_dir_all(pages_dir)
            .await
            .map_err(|e| CatalogError::io(pages_dir, e))?;

        let mut dir_names = Vec::new();
        let mut entries = tokio::fs::read_dir(pages_dir)
            .await
            .map_err(|e| CatalogError::io(pages_dir, e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CatalogError::io(pages_dir, e))?
        {
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            if is_dir && !name.starts_with('.') {
                dir_names.push(name);
            }
        }
        dir_names.sort_by(|a, b| scan::natural_cmp(a, b));

        let _guard = self.index_lock.lock().await;
        let mut categories = self.load_index().await;
        let mut known: HashSet<String> = categories.iter().map(|c| c.slug.clone()).collect();
        let mut added = Vec::new();

        for dir_name in dir_names {
            let normalized = slug::normalize(&dir_name);
            if !known.insert(normalized.clone()) {
                continue;
            }
            let subject = slug::dir_to_title(&dir_name);
            categories.push(Category {
                slug: normalized.clone(),
                title: format!("{subject} Coloring Pages"),
                description: generated_description(&subject),
                meta_description: generated_meta_description(&subject),
                keywords: generated_keywords(&dir_name),
                images: Vec::new(),
                featured: false,
            });
            info!(slug = %normalized, dir = %dir_name, "Discovered category directory");
            added.push(normalized);
        }

        if !added.is_empty() {
            self.write_index(&categories).await?;
        }

        for category in &categories {
            if let Err(e) = self.layout.ensure_category_dirs(&category.slug).await {
                warn!(slug = %category.slug, error = %e, "Failed to create category directories");
            }
        }

        Ok(added)
    }

    // -------------------------------------------------------------------------
    // Image mutations
    // -------------------------------------------------------------------------

    /// Validate and store an uploaded image.
    ///
    /// Validation runs before anything touches the filesystem.
    pub async fn upload_image(
        &self,
        category_slug: &str,
        data: bytes::Bytes,
    ) -> Result<UploadedImage, IngestError> {
        let candidate = data.clone();
        let validated = tokio::task::spawn_blocking(move || detect::validate_upload(&candidate))
            .await
            .map_err(|e| {
                IngestError::io(
                    self.layout.pages_dir(),
                    std::io::Error::other(e.to_string()),
                )
            })??;

        let normalized = slug::normalize(category_slug);
        let saved = {
            let _guard = self.category_locks.lock(&normalized).await;
            if !self.contains(&normalized).await {
                return Err(IngestError::CategoryNotFound { slug: normalized });
            }
            upload::save(&self.layout, &normalized, validated, data, self.thumbnails).await?
        };

        let category = self
            .get_category(&normalized)
            .await
            .ok_or(IngestError::CategoryNotFound { slug: normalized })?;
        let image = category
            .images
            .iter()
            .find(|image| image.basename() == saved.basename)
            .cloned();
        Ok(UploadedImage { category, image })
    }

    /// Delete an image by id or by original/thumbnail basename.
    ///
    /// Both files are removed independently. Failure to remove the original
    /// fails the operation once the thumbnail has also been attempted;
    /// failure to remove the thumbnail is only logged.
    pub async fn delete_image(
        &self,
        category_slug: &str,
        identifier: &str,
    ) -> Result<Category, IngestError> {
        let normalized = slug::normalize(category_slug);

        {
            let _guard = self.category_locks.lock(&normalized).await;
            let category = self
                .get_category(&normalized)
                .await
                .ok_or_else(|| IngestError::CategoryNotFound {
                    slug: normalized.clone(),
                })?;
            let image = category
                .images
                .iter()
                .find(|image| image.matches_identifier(identifier))
                .ok_or_else(|| IngestError::ImageNotFound {
                    identifier: identifier.to_string(),
                })?;

            let dirs = self.layout.category_dirs(&normalized);
            let original = dirs.original.join(&image.original_filename);
            let thumbnail = dirs.thumbnail_for(image.thumbnail_basename());

            remove_image_files(&original, &thumbnail).await?;
            info!(slug = %normalized, image = %image.id, "Deleted image");
        }

        self.get_category(&normalized)
            .await
            .ok_or(IngestError::CategoryNotFound { slug: normalized })
    }
}

/// Remove an original and its thumbnail, each attempted regardless of the
/// other. Only a failure on the original is reported.
async fn remove_image_files(original: &Path, thumbnail: &Path) -> Result<(), IngestError> {
    let original_removed = storage::remove_if_exists(original).await;
    if let Err(e) = &original_removed {
        warn!(file = %original.display(), error = %e, "Failed to remove original");
    }
    if let Err(e) = storage::remove_if_exists(thumbnail).await {
        warn!(file = %thumbnail.display(), error = %e, "Failed to remove thumbnail");
    }
    original_removed
        .map(|_| ())
        .map_err(|e| IngestError::io(original, e))
}

// =============================================================================
// Tests
// =============================================================================
