//! Login and logout.

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse, Redirect};
use axum::Form;
use serde::Deserialize;

use crate::auth::gate::authenticate;
use crate::auth::session::{expired_cookie, session_cookie, token_from_headers};
use crate::error::AppResult;
use crate::state::AppState;
use crate::views;

/// Form body for `POST /login`.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// GET /login
pub async fn login_form() -> Html<String> {
    Html(views::login_page(None))
}

/// POST /login
///
/// On success opens a session, sets its cookie and redirects to `/pose`.
/// Failures re-render the form with a 401.
pub async fn login(
    State(state): State<AppState>,
    Form(input): Form<LoginForm>,
) -> AppResult<impl IntoResponse> {
    let user = authenticate(&state.pool, &input.username, &input.password).await?;

    let (token, session) = state.sessions.create(user.id, &user.username).await;
    tracing::info!(
        user_id = user.id,
        username = %user.username,
        expires_at = %session.expires_at,
        "User logged in"
    );

    let cookie = session_cookie(&token, state.sessions.ttl(), state.config.cookie_secure);
    Ok(([(SET_COOKIE, cookie)], Redirect::to("/pose")))
}

/// GET|POST /logout
///
/// Always succeeds, whether or not a session existed.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(token) = token_from_headers(&headers) {
        if state.sessions.remove(token).await {
            tracing::info!("User logged out");
        }
    }
    (
        [(SET_COOKIE, expired_cookie(state.config.cookie_secure))],
        Redirect::to("/login"),
    )
}
