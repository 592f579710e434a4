//! User entity model and DTOs.

use serde::Deserialize;
use sqlx::FromRow;

/// Full row from the `users` table.
///
/// Carries the password hash, so it is never serialized.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub created_at: String,
}

/// DTO for creating a new user. `password_hash` is an Argon2 PHC string.
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub password_hash: String,
}
