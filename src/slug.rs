//! Slug normalization for category identifiers.
//!
//! Every category is addressed by a canonical slug: ASCII lowercase,
//! hyphen-delimited, free of diacritics, and always ending in exactly one
//! [`SLUG_SUFFIX`]. The on-disk directory for a category is its slug with the
//! suffix removed (see [`slug_to_dir`]).
//!
//! ```
//! use coloring_catalog::slug::{normalize, slug_to_dir};
//!
//! assert_eq!(normalize("Élsa & Anna"), "elsa-anna-coloring-pages");
//! assert_eq!(slug_to_dir("elsa-anna-coloring-pages"), "elsa-anna");
//! ```

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Canonical suffix carried by every slug.
pub const SLUG_SUFFIX: &str = "-coloring-pages";

/// Slug returned when the input normalizes to nothing.
pub const FALLBACK_SLUG: &str = "untitled-coloring-pages";

/// Normalize arbitrary input into a canonical category slug.
///
/// Total and deterministic: any string maps to a valid slug, and
/// `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(input: &str) -> String {
    let sanitized = sanitize(input.trim(), |c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-', '-');

    if sanitized.is_empty() {
        return FALLBACK_SLUG.to_string();
    }

    with_single_suffix(sanitized)
}

/// Derive a slug from a human-readable title.
///
/// Unlike [`normalize`], punctuation is dropped rather than turned into a
/// separator, so "Mickey's Friends" becomes `mickeys-friends-coloring-pages`.
pub fn slug_from_title(title: &str) -> String {
    let ascii = fold_to_ascii_lowercase(title);
    let kept: String = ascii
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || c.is_whitespace())
        .collect();
    let base = kept.split_whitespace().collect::<Vec<_>>().join("-");

    if base.is_empty() {
        normalize("untitled")
    } else {
        normalize(&base)
    }
}

/// Directory name for a slug: the normalized slug without its suffix.
pub fn slug_to_dir(slug: &str) -> String {
    let normalized = normalize(slug);
    match normalized.strip_suffix(SLUG_SUFFIX) {
        Some(dir) if !dir.is_empty() => dir.to_string(),
        _ => normalized,
    }
}

/// Turn a directory name into a display title ("big-cats" -> "Big Cats").
pub fn dir_to_title(dir: &str) -> String {
    dir.split(['-', '_', ' '])
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decompose (NFKD), drop combining marks and lowercase.
fn fold_to_ascii_lowercase(input: &str) -> String {
    input
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Fold the input, replace every run of disallowed characters with a single
/// `separator`, and trim separators from both ends.
fn sanitize(input: &str, allowed: impl Fn(char) -> bool, separator: char) -> String {
    let folded = fold_to_ascii_lowercase(input);
    let mut out = String::with_capacity(folded.len());
    let mut last_was_separator = true;

    for c in folded.chars() {
        let c = if allowed(c) { c } else { separator };
        if c == separator {
            if !last_was_separator {
                out.push(separator);
            }
            last_was_separator = true;
        } else {
            out.push(c);
            last_was_separator = false;
        }
    }

    while out.ends_with(separator) {
        out.pop();
    }
    out
}

/// Collapse a trailing repeated suffix to one occurrence, or append it.
fn with_single_suffix(mut slug: String) -> String {
    let doubled = format!("{SLUG_SUFFIX}{SLUG_SUFFIX}");
    while slug.ends_with(&doubled) {
        slug.truncate(slug.len() - SLUG_SUFFIX.len());
    }

    if slug.ends_with(SLUG_SUFFIX) {
        slug
    } else {
        slug.push_str(SLUG_SUFFIX);
        slug
    }
}
