//! Administrative tool: add a credential record.
//!
//! ```text
//! create-user <username> <password>
//! ```
//!
//! Reads `DATABASE_URL` (default `sqlite://users.db?mode=rwc`), applies
//! migrations and inserts the user with an Argon2id password hash.

use anyhow::{bail, Context};
use posekit_api::auth::password::{hash_password, validate_password_strength, MIN_PASSWORD_LENGTH};
use posekit_db::models::user::CreateUser;
use posekit_db::repositories::UserRepo;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "posekit_db=info,create_user=info".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(username), Some(password), None) = (args.next(), args.next(), args.next()) else {
        bail!("usage: create-user <username> <password>");
    };
    let username = username.trim().to_string();
    if username.is_empty() {
        bail!("username must not be empty");
    }
    if let Err(msg) = validate_password_strength(&password, MIN_PASSWORD_LENGTH) {
        bail!(msg);
    }

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://users.db?mode=rwc".into());
    let pool = posekit_db::create_pool(&database_url)
        .await
        .with_context(|| format!("failed to open {database_url}"))?;
    posekit_db::run_migrations(&pool)
        .await
        .context("failed to run migrations")?;

    if UserRepo::find_by_username(&pool, &username).await?.is_some() {
        bail!("user '{username}' already exists");
    }

    let password_hash =
        hash_password(&password).map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?;
    let user = UserRepo::create(
        &pool,
        &CreateUser {
            username,
            password_hash,
        },
    )
    .await
    .context("failed to insert user")?;

    tracing::info!(user_id = user.id, username = %user.username, "User created");
    pool.close().await;
    Ok(())
}
