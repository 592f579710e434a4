use std::sync::Arc;

use posekit_core::pipeline::MediaPipeline;

use crate::auth::session::SessionStore;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind `Arc` or already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Credential store pool.
    pub pool: posekit_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Login sessions, created in `main` and dropped at shutdown.
    pub sessions: Arc<SessionStore>,
    /// Annotators with their injected detector and video backend.
    pub pipeline: Arc<MediaPipeline>,
}
