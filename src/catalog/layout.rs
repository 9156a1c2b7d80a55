//! On-disk layout of the catalog.
//!
//! ```text
//! {data_dir}/categories.json
//! {pages_dir}/{dir}/original/{dir}-001.png
//! {pages_dir}/{dir}/thumbnails/{dir}-001.webp
//! ```
//!
//! `{dir}` is the category slug without its suffix. Files under `pages_dir`
//! are served publicly under `public_prefix`.

use std::path::{Path, PathBuf};

use crate::slug;

/// File name of the category index inside the data directory.
pub const INDEX_FILE_NAME: &str = "categories.json";

/// Subdirectory holding as-uploaded originals.
pub const ORIGINAL_DIR_NAME: &str = "original";

/// Subdirectory holding derived thumbnails.
pub const THUMBNAIL_DIR_NAME: &str = "thumbnails";

/// Extension used for every thumbnail.
pub const THUMBNAIL_EXTENSION: &str = "webp";

/// Default public URL prefix for category files.
pub const DEFAULT_PUBLIC_PREFIX: &str = "/coloring-pages";

/// Resolved directories for one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDirs {
    /// Directory name (slug without suffix)
    pub dir_name: String,
    pub base: PathBuf,
    pub original: PathBuf,
    pub thumbnails: PathBuf,
}

impl CategoryDirs {
    /// Thumbnail path for an original basename.
    pub fn thumbnail_for(&self, basename: &str) -> PathBuf {
        self.thumbnails
            .join(format!("{basename}.{THUMBNAIL_EXTENSION}"))
    }
}

/// Paths and URL scheme for a catalog rooted at a data and a pages directory.
#[derive(Debug, Clone)]
pub struct CatalogLayout {
    data_dir: PathBuf,
    pages_dir: PathBuf,
    public_prefix: String,
}

impl CatalogLayout {
    /// Create a layout with the default public prefix.
    pub fn new(data_dir: impl Into<PathBuf>, pages_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            pages_dir: pages_dir.into(),
            public_prefix: DEFAULT_PUBLIC_PREFIX.to_string(),
        }
    }

    /// Override the public URL prefix (leading slash added, trailing removed).
    pub fn with_public_prefix(mut self, prefix: impl AsRef<str>) -> Self {
        let trimmed = prefix.as_ref().trim_matches('/');
        self.public_prefix = format!("/{trimmed}");
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn pages_dir(&self) -> &Path {
        &self.pages_dir
    }

    pub fn public_prefix(&self) -> &str {
        &self.public_prefix
    }

    pub fn index_path(&self) -> PathBuf {
        self.data_dir.join(INDEX_FILE_NAME)
    }

    /// Directories for the category identified by `slug` (normalized first).
    pub fn category_dirs(&self, slug: &str) -> CategoryDirs {
        let dir_name = slug::slug_to_dir(slug);
        let base = self.pages_dir.join(&dir_name);
        CategoryDirs {
            original: base.join(ORIGINAL_DIR_NAME),
            thumbnails: base.join(THUMBNAIL_DIR_NAME),
            base,
            dir_name,
        }
    }

    /// Public URL for a file in one of a category's subdirectories.
    pub fn public_path(&self, dir_name: &str, folder: &str, filename: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.public_prefix,
            urlencoding::encode(dir_name),
            folder,
            urlencoding::encode(filename)
        )
    }

    /// Map a public URL back to a file under the pages directory.
    ///
    /// Returns `None` for URLs outside the public prefix or containing any
    /// component that could escape the pages directory.
    pub fn resolve_public_path(&self, url: &str) -> Option<PathBuf> {
        let trimmed = url.trim();
        let path = trimmed.split(['?', '#']).next().unwrap_or(trimmed);
        let rest = path
            .trim_start_matches('/')
            .strip_prefix(self.public_prefix.trim_start_matches('/'))?
            .strip_prefix('/')?;

        let mut resolved = self.pages_dir.clone();
        for segment in rest.split('/') {
            let decoded = urlencoding::decode(segment).ok()?;
            if decoded.is_empty()
                || decoded == "."
                || decoded == ".."
                || decoded.contains(['/', '\\', '\0'])
            {
                return None;
            }
            resolved.push(decoded.as_ref());
        }
        Some(resolved)
    }

    /// Create the data and pages roots if missing.
    pub async fn ensure_roots(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.data_dir).await?;
        tokio::fs::create_dir_all(&self.pages_dir).await
    }

    /// Create a category's `original/` and `thumbnails/` directories if missing.
    pub async fn ensure_category_dirs(&self, slug: &str) -> std::io::Result<CategoryDirs> {
        let dirs = self.category_dirs(slug);
        tokio::fs::create_dir_all(&dirs.original).await?;
        tokio::fs::create_dir_all(&dirs.thumbnails).await?;
        Ok(dirs)
    }
}
