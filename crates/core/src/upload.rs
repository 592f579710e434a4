//! Upload validation: sanitize, check the extension allow-list, persist.

use std::path::PathBuf;

use crate::error::UploadError;
use crate::naming::{extension, sanitize_filename};
use crate::storage::StorageLayout;

/// Accepted extensions (lowercase, with dot).
pub const ALLOWED_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".mp4"];

/// Single-frame or multi-frame media.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classify a lowercase extension; `None` for anything off the allow-list.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            ".jpg" | ".jpeg" | ".png" => Some(Self::Image),
            ".mp4" => Some(Self::Video),
            _ => None,
        }
    }
}

/// A file part as received from the client.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// An upload that passed validation and has been written to storage.
#[derive(Debug, Clone)]
pub struct SanitizedAsset {
    pub original_filename: String,
    pub sanitized_filename: String,
    pub extension: String,
    pub kind: MediaKind,
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Validate an uploaded file and persist it under its sanitized name.
///
/// Nothing is written unless every check passes. An existing upload with the
/// same sanitized name is overwritten.
pub fn validate(
    layout: &StorageLayout,
    file: Option<IncomingFile>,
) -> Result<SanitizedAsset, UploadError> {
    let file = match file {
        Some(f) if !f.filename.is_empty() => f,
        _ => return Err(UploadError::Missing),
    };

    let sanitized = sanitize_filename(&file.filename);
    let ext = extension(&sanitized);
    let kind = MediaKind::from_extension(&ext)
        .ok_or_else(|| UploadError::UnsupportedType { extension: ext.clone() })?;

    let path = layout.upload_path(&sanitized);
    std::fs::write(&path, &file.bytes)?;

    tracing::debug!(
        original = %file.filename,
        sanitized = %sanitized,
        bytes = file.bytes.len(),
        "Stored upload"
    );

    Ok(SanitizedAsset {
        original_filename: file.filename,
        sanitized_filename: sanitized,
        extension: ext,
        kind,
        path,
        size_bytes: file.bytes.len() as u64,
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn layout() -> (tempfile::TempDir, StorageLayout) {
        let tmp = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(tmp.path());
        layout.ensure_dirs().unwrap();
        (tmp, layout)
    }

    fn incoming(name: &str) -> Option<IncomingFile> {
        Some(IncomingFile {
            filename: name.to_string(),
            bytes: b"payload".to_vec(),
        })
    }

    fn upload_count(layout: &StorageLayout) -> usize {
        std::fs::read_dir(layout.uploads_dir()).unwrap().count()
    }

    #[test]
    fn missing_file_is_rejected() {
        let (_tmp, layout) = layout();
        assert_matches!(validate(&layout, None), Err(UploadError::Missing));
        assert_matches!(validate(&layout, incoming("")), Err(UploadError::Missing));
    }

    #[test]
    fn allowed_extensions_case_insensitive() {
        let (_tmp, layout) = layout();
        let asset = validate(&layout, incoming("Photo.JPG")).unwrap();
        assert_eq!(asset.extension, ".jpg");
        assert_eq!(asset.kind, MediaKind::Image);
        assert_eq!(asset.sanitized_filename, "Photo.JPG");

        let asset = validate(&layout, incoming("clip.Mp4")).unwrap();
        assert_eq!(asset.kind, MediaKind::Video);
    }

    #[test]
    fn unsupported_types_write_nothing() {
        let (_tmp, layout) = layout();
        for name in ["notes.txt", "movie.mov", "image.gif", "noext", "photo.jpg.exe"] {
            assert_matches!(
                validate(&layout, incoming(name)),
                Err(UploadError::UnsupportedType { .. }),
                "{name} should be rejected"
            );
        }
        assert_eq!(upload_count(&layout), 0);
    }

    #[test]
    fn traversal_names_land_inside_uploads() {
        let (_tmp, layout) = layout();
        let asset = validate(&layout, incoming("../../evil.png")).unwrap();
        assert_eq!(asset.sanitized_filename, "evil.png");
        assert_eq!(asset.path, layout.uploads_dir().join("evil.png"));
        assert!(asset.path.exists());
    }

    #[test]
    fn same_name_overwrites() {
        let (_tmp, layout) = layout();
        validate(&layout, incoming("a.png")).unwrap();
        let second = IncomingFile {
            filename: "a.png".into(),
            bytes: b"second".to_vec(),
        };
        let asset = validate(&layout, Some(second)).unwrap();
        assert_eq!(std::fs::read(&asset.path).unwrap(), b"second");
        assert_eq!(upload_count(&layout), 1);
    }
}
