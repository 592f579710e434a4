//! Artifact downloads and static previews.

mod common;

use axum::http::StatusCode;
use common::{body_bytes, body_string, create_user, get, login, post_upload};
use image::ImageFormat;
use sqlx::SqlitePool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_file_is_plain_404(pool: SqlitePool) {
    let app = common::build_test_app(pool);

    let response = get(&app.router, "/download/nonexistent.pdf", None).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_string(response).await, "File not found");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn traversal_is_404(pool: SqlitePool) {
    let app = common::build_test_app(pool);
    std::fs::write(app.layout.root().join("secret.txt"), b"x").unwrap();

    let response = get(&app.router, "/download/..%2Fsecret.txt", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn processed_artifacts_are_downloadable(pool: SqlitePool) {
    create_user(&pool, "alice").await;
    let app = common::build_test_app(pool);
    let cookie = login(&app.router, "alice").await;
    let jpeg = common::image_bytes(ImageFormat::Jpeg);
    let processed = post_upload(
        &app.router,
        Some(&cookie),
        Some(("photo.jpg", jpeg.as_slice())),
    )
    .await;
    assert_eq!(processed.status(), StatusCode::OK);

    let result = get(&app.router, "/download/pose_photo.jpg", None).await;
    assert_eq!(result.status(), StatusCode::OK);
    assert_eq!(result.headers()["content-type"], "image/jpeg");
    assert_eq!(
        result.headers()["content-disposition"],
        "attachment; filename=\"pose_photo.jpg\""
    );
    let bytes = body_bytes(result).await;
    assert!(image::load_from_memory(&bytes).is_ok());

    let report = get(&app.router, "/download/photo_pose.pdf", None).await;
    assert_eq!(report.status(), StatusCode::OK);
    assert_eq!(report.headers()["content-type"], "application/pdf");
    assert!(body_bytes(report).await.starts_with(b"%PDF"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn static_preview_serves_results(pool: SqlitePool) {
    let app = common::build_test_app(pool);
    std::fs::write(app.layout.results_dir().join("pose_x.png"), b"png-ish").unwrap();

    let response = get(&app.router, "/static/results/pose_x.png", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"png-ish");
}
