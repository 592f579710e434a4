//! Upload and processing.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::response::Html;
use posekit_core::upload::{self, IncomingFile};

use crate::error::{AppError, AppResult};
use crate::middleware::session::SessionUser;
use crate::state::AppState;
use crate::views;

/// POST /pose_backend
///
/// Accepts a multipart form with a `file` field. The upload is validated,
/// annotated and reported on a blocking thread; the response shows the
/// original, the annotated result and download links.
pub async fn process_upload(
    user: SessionUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Html<String>> {
    let mut incoming: Option<IncomingFile> = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue; // ignore unknown fields
        }
        let filename = field.file_name().unwrap_or("").to_string();
        let bytes = field.bytes().await?;
        incoming = Some(IncomingFile {
            filename,
            bytes: bytes.to_vec(),
        });
    }

    tracing::info!(
        username = %user.username,
        filename = incoming.as_ref().map(|f| f.filename.as_str()).unwrap_or(""),
        bytes = incoming.as_ref().map(|f| f.bytes.len()).unwrap_or(0),
        "Upload received"
    );

    let pipeline = Arc::clone(&state.pipeline);
    let outcome = tokio::task::spawn_blocking(move || -> AppResult<_> {
        let asset = upload::validate(pipeline.layout(), incoming)?;
        Ok(pipeline.process(&asset)?)
    })
    .await
    .map_err(|e| AppError::InternalError(format!("Processing task failed: {e}")))??;

    Ok(Html(views::pose_page(
        Some(&user.username),
        Some(&outcome.message()),
        Some(&outcome),
    )))
}
