//! Lookup of generated artifacts for download.

use std::path::PathBuf;

use crate::error::NotFoundError;
use crate::storage::StorageLayout;

/// A generated file located on disk, ready to stream.
#[derive(Debug, Clone)]
pub struct DeliveredFile {
    pub filename: String,
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Find `filename` among generated artifacts.
///
/// Results are searched first, then reports. Names that are empty or could
/// escape the storage directories are treated as not found.
pub fn fetch(layout: &StorageLayout, filename: &str) -> Result<DeliveredFile, NotFoundError> {
    let not_found = || NotFoundError {
        filename: filename.to_string(),
    };
    if !is_plain_name(filename) {
        tracing::warn!(filename, "Rejected download name");
        return Err(not_found());
    }

    for dir in [layout.results_dir(), layout.reports_dir()] {
        let path = dir.join(filename);
        match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() => {
                return Ok(DeliveredFile {
                    filename: filename.to_string(),
                    path,
                    size_bytes: meta.len(),
                });
            }
            _ => continue,
        }
    }
    Err(not_found())
}

/// A single path component: no separators, not `.` or `..`. Dots inside a
/// name (`my..photo.jpg`) are ordinary characters.
fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\', '\0'])
}

/// MIME type for a delivered file, by extension.
pub fn content_type(filename: &str) -> &'static str {
    match crate::naming::extension(filename).as_str() {
        ".png" => "image/png",
        ".jpg" | ".jpeg" => "image/jpeg",
        ".mp4" => "video/mp4",
        ".pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}
