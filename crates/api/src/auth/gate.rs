//! Credential verification against the user table.

use posekit_core::error::AuthError;
use posekit_db::models::user::User;
use posekit_db::repositories::UserRepo;
use posekit_db::DbPool;

use crate::auth::password::verify_password;
use crate::error::AppResult;

/// Check a username/password pair.
///
/// Performs exactly one lookup by username. An unknown user, a wrong
/// password and an unparseable stored hash all yield
/// [`AuthError::InvalidCredentials`].
pub async fn authenticate(pool: &DbPool, username: &str, password: &str) -> AppResult<User> {
    let Some(user) = UserRepo::find_by_username(pool, username).await? else {
        tracing::info!(username, "Login rejected: unknown user");
        return Err(AuthError::InvalidCredentials.into());
    };

    match verify_password(password, &user.password_hash) {
        Ok(true) => Ok(user),
        Ok(false) => {
            tracing::info!(username, "Login rejected: wrong password");
            Err(AuthError::InvalidCredentials.into())
        }
        Err(e) => {
            tracing::warn!(username, error = %e, "Stored password hash is malformed");
            Err(AuthError::InvalidCredentials.into())
        }
    }
}
