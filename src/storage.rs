//! Small filesystem helpers shared by the catalog store and the ingest pipeline.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Extension given to in-flight temporary files. Never an allowed image
/// extension, so scans ignore partially written data.
pub const TEMP_EXTENSION: &str = "tmp";

/// Sibling temporary path for `path`, hidden and uniquely named.
fn temp_path_for(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("file");
    parent.join(format!(
        ".{file_name}.{:016x}.{TEMP_EXTENSION}",
        rand::random::<u64>()
    ))
}

/// Write `bytes` to `path` by writing a sibling temp file and renaming it
/// into place. Readers see either the old content or the new, never a prefix.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = temp_path_for(path);

    if let Err(err) = tokio::fs::write(&tmp, bytes).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(err);
    }

    if let Err(err) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(err);
    }

    Ok(())
}

/// Remove a file, treating "already gone" as success.
///
/// Returns whether a file was actually removed.
pub async fn remove_if_exists(path: &Path) -> std::io::Result<bool> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

/// Whether a path exists, treating errors as absence.
pub async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}
