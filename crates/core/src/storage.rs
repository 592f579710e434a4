//! On-disk layout of uploads and derived artifacts.

use std::path::{Path, PathBuf};

use crate::naming;

/// Sub-directory holding raw uploads.
pub const UPLOADS_DIR: &str = "uploads";

/// Sub-directory holding annotated images and videos.
pub const RESULTS_DIR: &str = "results";

/// Sub-directory holding PDF reports.
pub const REPORTS_DIR: &str = "reports";

/// The three storage locations, all under one static asset root.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    root: PathBuf,
    uploads: PathBuf,
    results: PathBuf,
    reports: PathBuf,
}

impl StorageLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            uploads: root.join(UPLOADS_DIR),
            results: root.join(RESULTS_DIR),
            reports: root.join(REPORTS_DIR),
            root,
        }
    }

    /// Create every storage directory that does not exist yet.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in [&self.uploads, &self.results, &self.reports] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads
    }

    pub fn results_dir(&self) -> &Path {
        &self.results
    }

    pub fn reports_dir(&self) -> &Path {
        &self.reports
    }

    pub fn upload_path(&self, sanitized: &str) -> PathBuf {
        self.uploads.join(sanitized)
    }

    pub fn result_path(&self, sanitized: &str) -> PathBuf {
        self.results.join(naming::result_filename(sanitized))
    }

    pub fn intermediate_path(&self, sanitized: &str) -> PathBuf {
        self.results.join(naming::intermediate_filename(sanitized))
    }

    pub fn report_path(&self, sanitized: &str) -> PathBuf {
        self.reports.join(naming::report_filename(sanitized))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_follow_naming_rules() {
        let layout = StorageLayout::new("/srv/static");
        assert_eq!(
            layout.upload_path("photo.jpg"),
            PathBuf::from("/srv/static/uploads/photo.jpg")
        );
        assert_eq!(
            layout.result_path("photo.jpg"),
            PathBuf::from("/srv/static/results/pose_photo.jpg")
        );
        assert_eq!(
            layout.intermediate_path("clip.mp4"),
            PathBuf::from("/srv/static/results/temp_clip.mp4")
        );
        assert_eq!(
            layout.report_path("photo.jpg"),
            PathBuf::from("/srv/static/reports/photo_pose.pdf")
        );
    }

    #[test]
    fn ensure_dirs_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = StorageLayout::new(tmp.path().join("static"));
        layout.ensure_dirs().unwrap();
        layout.ensure_dirs().unwrap();
        assert!(layout.uploads_dir().is_dir());
        assert!(layout.results_dir().is_dir());
        assert!(layout.reports_dir().is_dir());
    }
}
