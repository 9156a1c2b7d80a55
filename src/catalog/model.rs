//! Catalog data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::slug;

/// A named collection of images with its SEO metadata.
///
/// `images` is never persisted: it is derived from the category's `original/`
/// directory on every read and is always empty in the index file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub meta_description: String,
    pub keywords: Vec<String>,
    #[serde(default)]
    pub images: Vec<CategoryImage>,
    #[serde(default)]
    pub featured: bool,
}

impl Category {
    /// Lenient conversion from one raw index entry.
    ///
    /// Missing or mistyped fields fall back to empty values and the slug is
    /// normalized. Returns `None` for anything that is not a JSON object.
    pub fn from_index_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let text = |key: &str| match object.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };

        let keywords = match object.get("keywords") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    Value::Null => String::new(),
                    other => other.to_string(),
                })
                .filter(|keyword| !keyword.is_empty())
                .collect(),
            _ => Vec::new(),
        };

        let featured = match object.get("featured") {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
            Some(Value::String(s)) => !s.is_empty(),
            _ => false,
        };

        Some(Category {
            slug: slug::normalize(&text("slug")),
            title: text("title"),
            description: text("description"),
            meta_description: text("metaDescription"),
            keywords,
            images: Vec::new(),
            featured,
        })
    }

    /// The index representation of this category: same metadata, no images.
    pub fn without_images(&self) -> Self {
        Category {
            images: Vec::new(),
            ..self.clone()
        }
    }

    /// Case-insensitive substring match over title, description and keywords.
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.title.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
            || self
                .keywords
                .iter()
                .any(|keyword| keyword.to_lowercase().contains(&query))
    }
}

/// One uploaded image, derived from the files on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryImage {
    /// `{slug}-{basename}`
    pub id: String,
    pub original_filename: String,
    /// Public URL of the original file
    pub original_path: String,
    /// Public URL of the derived thumbnail
    pub thumbnail_path: String,
    pub original_size: u64,
    pub thumbnail_size: u64,
    pub width: u32,
    pub height: u32,
    /// Modification time of the original file
    pub upload_date: DateTime<Utc>,
}

impl CategoryImage {
    /// Basename of the original file, without extension.
    pub fn basename(&self) -> &str {
        stem(&self.original_filename)
    }

    /// Basename of the thumbnail file, without extension.
    pub fn thumbnail_basename(&self) -> &str {
        let file = self
            .thumbnail_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.thumbnail_path);
        stem(file)
    }

    /// Whether `identifier` names this image by id or by either basename.
    pub fn matches_identifier(&self, identifier: &str) -> bool {
        self.id == identifier
            || self.basename() == identifier
            || self.thumbnail_basename() == identifier
    }
}

fn stem(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(0) | None => filename,
        Some(idx) => &filename[..idx],
    }
}

/// A stored upload: the refreshed category and the new image within it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadedImage {
    pub category: Category,
    pub image: Option<CategoryImage>,
}

/// Input for creating a category.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub meta_description: String,
    pub keywords: Vec<String>,
    pub featured: bool,
}

impl NewCategory {
    pub(crate) fn into_category(self) -> Category {
        Category {
            slug: slug::normalize(&self.slug),
            title: self.title,
            description: self.description,
            meta_description: self.meta_description,
            keywords: self.keywords,
            images: Vec::new(),
            featured: self.featured,
        }
    }
}

/// Partial update of a category. `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub meta_description: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub featured: Option<bool>,
}

impl CategoryUpdate {
    pub(crate) fn apply_to(self, category: &mut Category) {
        if let Some(title) = self.title {
            category.title = title;
        }
        if let Some(description) = self.description {
            category.description = description;
        }
        if let Some(meta_description) = self.meta_description {
            category.meta_description = meta_description;
        }
        if let Some(keywords) = self.keywords {
            category.keywords = keywords;
        }
        if let Some(featured) = self.featured {
            category.featured = featured;
        }
    }
}
