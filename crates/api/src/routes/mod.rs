//! Route table.

pub mod health;

use std::path::Path;

use axum::routing::get;
use axum::Router;
use tower_http::services::ServeDir;

use crate::handlers::{auth, downloads, pages, pose};
use crate::state::AppState;

/// All application routes.
///
/// ```text
/// GET       /                       -> title
/// GET       /index                  -> index
/// GET|POST  /login                  -> login_form | login
/// GET|POST  /logout                 -> logout
/// GET       /pose                   -> upload_form       (session)
/// GET|POST  /pose_backend           -> upload_form | process_upload (session)
/// GET       /download/{filename}    -> download
/// GET       /static/*               -> files under the static root
/// GET       /health                 -> health_check
/// ```
pub fn app_routes(static_root: &Path) -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .route("/", get(pages::title))
        .route("/index", get(pages::index))
        .route("/login", get(auth::login_form).post(auth::login))
        .route("/logout", get(auth::logout).post(auth::logout))
        .route("/pose", get(pages::upload_form))
        .route(
            "/pose_backend",
            get(pages::upload_form).post(pose::process_upload),
        )
        .route("/download/{filename}", get(downloads::download))
        .nest_service("/static", ServeDir::new(static_root))
}
