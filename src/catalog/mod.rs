//! Category catalog: data model, on-disk layout and the store that keeps the
//! JSON index and the image directories consistent.

mod defaults;
mod layout;
mod model;
mod store;

pub use defaults::default_categories;
pub use layout::{
    CatalogLayout, CategoryDirs, DEFAULT_PUBLIC_PREFIX, INDEX_FILE_NAME, ORIGINAL_DIR_NAME,
    THUMBNAIL_DIR_NAME, THUMBNAIL_EXTENSION,
};
pub use model::{Category, CategoryImage, CategoryUpdate, NewCategory, UploadedImage};
pub use store::CatalogStore;

pub(crate) use defaults::{generated_description, generated_keywords, generated_meta_description};
