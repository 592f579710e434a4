use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use posekit_core::error::{AuthError, NotFoundError, ProcessingError, UploadError};

use crate::views;

/// Application-level error type for HTTP handlers.
///
/// Wraps the domain errors of `posekit_core` and adds HTTP-specific variants.
/// Implements [`IntoResponse`] so every failure renders the page the user
/// came from with a fixed message; raw error text never reaches the client.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Processing(#[from] ProcessingError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The multipart body could not be read (malformed or over the size limit).
    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

pub const MSG_MISSING_FILE: &str = "⚠️ Please upload a file.";
pub const MSG_UPLOAD_TOO_LARGE: &str = "⚠️ Upload too large.";
pub const MSG_UNSUPPORTED_TYPE: &str = "⚠️ Unsupported file type.";
pub const MSG_IMAGE_UNREADABLE: &str = "⚠️ Failed to read image file.";
pub const MSG_VIDEO_UNREADABLE: &str = "⚠️ Cannot open video file.";
pub const MSG_TRANSCODE_FAILED: &str = "⚠️ Video transcoding failed.";
pub const MSG_PROCESSING_FAILED: &str = "⚠️ Processing failed.";
pub const MSG_INVALID_CREDENTIALS: &str = "Invalid username or password";
pub const MSG_FILE_NOT_FOUND: &str = "File not found";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Auth(AuthError::InvalidCredentials) => (
                StatusCode::UNAUTHORIZED,
                Html(views::login_page(Some(MSG_INVALID_CREDENTIALS))),
            )
                .into_response(),

            AppError::Upload(err) => {
                let message = match err {
                    UploadError::Missing => MSG_MISSING_FILE,
                    UploadError::UnsupportedType { extension } => {
                        tracing::info!(extension = %extension, "Upload rejected");
                        MSG_UNSUPPORTED_TYPE
                    }
                    UploadError::Io(e) => {
                        tracing::error!(error = %e, "Failed to store upload");
                        return pose_error(StatusCode::INTERNAL_SERVER_ERROR, MSG_PROCESSING_FAILED);
                    }
                };
                pose_error(StatusCode::BAD_REQUEST, message)
            }

            AppError::Processing(err) => {
                let (status, message) = classify_processing_error(err);
                pose_error(status, message)
            }

            AppError::NotFound(err) => {
                tracing::debug!(filename = %err.filename, "Download not found");
                (StatusCode::NOT_FOUND, MSG_FILE_NOT_FOUND).into_response()
            }

            AppError::Multipart(err) => {
                let status = err.status();
                tracing::info!(error = %err, %status, "Unreadable upload body");
                let message = if status == StatusCode::PAYLOAD_TOO_LARGE {
                    MSG_UPLOAD_TOO_LARGE
                } else {
                    MSG_MISSING_FILE
                };
                pose_error(status, message)
            }

            AppError::Database(err) => {
                tracing::error!(error = %err, "Database error");
                internal_error()
            }

            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal_error()
            }
        }
    }
}

/// Map a pipeline failure to a status and a user-facing message.
///
/// Input problems are 422; anything else is logged and reported as 500.
fn classify_processing_error(err: &ProcessingError) -> (StatusCode, &'static str) {
    match err {
        ProcessingError::DecodeFailed(cause) => {
            tracing::info!(cause = %cause, "Image could not be decoded");
            (StatusCode::UNPROCESSABLE_ENTITY, MSG_IMAGE_UNREADABLE)
        }
        ProcessingError::OpenFailed(cause) => {
            tracing::info!(cause = %cause, "Video could not be opened");
            (StatusCode::UNPROCESSABLE_ENTITY, MSG_VIDEO_UNREADABLE)
        }
        ProcessingError::TranscodeFailed { exit_code, stderr } => {
            tracing::error!(?exit_code, stderr = %stderr, "Video transcoding failed");
            (StatusCode::UNPROCESSABLE_ENTITY, MSG_TRANSCODE_FAILED)
        }
        other => {
            tracing::error!(error = %other, "Processing failed");
            (StatusCode::INTERNAL_SERVER_ERROR, MSG_PROCESSING_FAILED)
        }
    }
}

fn pose_error(status: StatusCode, message: &str) -> Response {
    (status, Html(views::pose_page(None, Some(message), None))).into_response()
}

fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
}
