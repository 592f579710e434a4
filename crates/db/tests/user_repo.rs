use posekit_db::models::user::CreateUser;
use posekit_db::repositories::UserRepo;
use sqlx::SqlitePool;

fn new_user(username: &str) -> CreateUser {
    CreateUser {
        username: username.to_string(),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn health_check_passes(pool: SqlitePool) {
    posekit_db::health_check(&pool).await.unwrap();
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_then_find(pool: SqlitePool) {
    let created = UserRepo::create(&pool, &new_user("alice")).await.unwrap();
    assert_eq!(created.username, "alice");
    assert!(!created.created_at.is_empty());

    let found = UserRepo::find_by_username(&pool, "alice")
        .await
        .unwrap()
        .expect("user should exist");
    assert_eq!(found.id, created.id);
    assert_eq!(found.password_hash, created.password_hash);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn lookup_is_case_sensitive(pool: SqlitePool) {
    UserRepo::create(&pool, &new_user("alice")).await.unwrap();
    assert!(UserRepo::find_by_username(&pool, "Alice")
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_username_is_rejected(pool: SqlitePool) {
    UserRepo::create(&pool, &new_user("alice")).await.unwrap();
    let err = UserRepo::create(&pool, &new_user("alice")).await.unwrap_err();
    let db_err = err.as_database_error().expect("database error");
    assert!(db_err.is_unique_violation());
}
