//! Session extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::Redirect;

use crate::auth::session::token_from_headers;
use crate::state::AppState;

/// The user behind a valid session cookie.
///
/// Taking this as a handler argument makes the route require a login:
/// requests without a live session are redirected to `/login` before the
/// handler body runs.
///
/// ```ignore
/// async fn upload_page(user: SessionUser) -> Html<String> {
///     tracing::debug!(username = %user.username, "rendering upload page");
///     Html(views::pose_page(Some(&user.username), None, None))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub user_id: i64,
    pub username: String,
}

impl FromRequestParts<AppState> for SessionUser {
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = token_from_headers(&parts.headers) else {
            tracing::debug!(path = %parts.uri.path(), "No session cookie, redirecting to login");
            return Err(Redirect::to("/login"));
        };

        match state.sessions.get(token).await {
            Some(session) => Ok(SessionUser {
                user_id: session.user_id,
                username: session.username,
            }),
            None => {
                tracing::debug!(path = %parts.uri.path(), "Unknown or expired session");
                Err(Redirect::to("/login"))
            }
        }
    }
}
