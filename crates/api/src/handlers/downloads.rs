//! Artifact downloads.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::http::StatusCode;
use axum::response::Response;
use posekit_core::delivery;
use tokio_util::io::ReaderStream;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /download/{filename}
///
/// Streams a result or report as an attachment. Unknown names are a plain
/// 404 `File not found`.
pub async fn download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> AppResult<Response> {
    let file = delivery::fetch(state.pipeline.layout(), &filename)?;

    let handle = tokio::fs::File::open(&file.path)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;
    let stream = ReaderStream::new(handle);

    tracing::info!(filename = %file.filename, bytes = file.size_bytes, "Serving download");

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, delivery::content_type(&file.filename))
        .header(header::CONTENT_LENGTH, file.size_bytes.to_string())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file.filename),
        )
        .body(Body::from_stream(stream))
        .map_err(|e| AppError::InternalError(e.to_string()))
}
