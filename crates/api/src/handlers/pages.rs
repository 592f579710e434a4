//! Static pages.

use axum::response::Html;

use crate::middleware::session::SessionUser;
use crate::views;

/// GET /
pub async fn title() -> Html<String> {
    Html(views::title_page())
}

/// GET /index
pub async fn index() -> Html<String> {
    Html(views::index_page())
}

/// GET /pose and GET /pose_backend -- the empty upload form.
pub async fn upload_form(user: SessionUser) -> Html<String> {
    Html(views::pose_page(Some(&user.username), None, None))
}
