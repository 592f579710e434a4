//! Domain error taxonomy shared by every pipeline stage.

use crate::pose::detector::DetectorError;
use crate::report::ReportError;

/// Credential check failures.
///
/// Unknown usernames and wrong passwords collapse into the same
/// variant so the caller cannot tell them apart.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,
}

/// Rejections raised while accepting an uploaded file.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("no file part in the request")]
    Missing,

    #[error("unsupported file type '{extension}'")]
    UnsupportedType { extension: String },

    #[error("failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of the annotation pipeline (image, video, report).
#[derive(Debug, thiserror::Error)]
pub enum ProcessingError {
    #[error("failed to decode image: {0}")]
    DecodeFailed(String),

    #[error("failed to open video: {0}")]
    OpenFailed(String),

    #[error("transcoder exited with status {exit_code:?}: {stderr}")]
    TranscodeFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("pose detection failed: {0}")]
    Detection(#[from] DetectorError),

    #[error("failed to encode output: {0}")]
    Encode(String),

    #[error("failed to build report: {0}")]
    Report(#[from] ReportError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A download request matched no stored artifact.
#[derive(Debug, thiserror::Error)]
#[error("File not found: {filename}")]
pub struct NotFoundError {
    pub filename: String,
}
