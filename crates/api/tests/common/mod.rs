#![allow(dead_code)]

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use image::{ImageFormat, Rgb, RgbImage};
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::ServiceExt;

use posekit_api::auth::password::hash_password;
use posekit_api::auth::session::SessionStore;
use posekit_api::config::{LogFormat, ServerConfig};
use posekit_api::router::build_app_router;
use posekit_api::state::AppState;
use posekit_core::error::ProcessingError;
use posekit_core::pipeline::MediaPipeline;
use posekit_core::pose::detector::{DetectionMode, DetectorError, LandmarkEstimator, PoseDetector};
use posekit_core::pose::landmarks::{Joint, Landmark, LandmarkSet};
use posekit_core::storage::StorageLayout;
use posekit_core::video::{FrameReader, FrameWriter, VideoBackend, VideoMetadata};
use posekit_db::models::user::CreateUser;
use posekit_db::repositories::UserRepo;

pub const TEST_PASSWORD: &str = "correct-horse";

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

/// Finds the same full-body pose in every frame.
pub struct FakeDetector;

struct FakeEstimator;

impl LandmarkEstimator for FakeEstimator {
    fn estimate(&mut self, _frame: &RgbImage) -> Result<Option<LandmarkSet>, DetectorError> {
        let landmarks = Joint::ALL
            .iter()
            .enumerate()
            .map(|(i, &joint)| Landmark {
                joint,
                x: 0.3 + 0.02 * i as f32,
                y: 0.1 + 0.05 * i as f32,
                confidence: 0.9,
            })
            .collect();
        Ok(Some(LandmarkSet::from_landmarks(landmarks)))
    }
}

impl PoseDetector for FakeDetector {
    fn estimator(&self, _mode: DetectionMode) -> Result<Box<dyn LandmarkEstimator>, DetectorError> {
        Ok(Box::new(FakeEstimator))
    }
}

/// Decodes every non-empty upload as `frames` grey frames at `frame_rate`.
pub struct FakeVideo {
    pub frames: u64,
    pub frame_rate: f64,
    pub fail_transcode: bool,
}

impl Default for FakeVideo {
    fn default() -> Self {
        Self {
            frames: 5,
            frame_rate: 25.0,
            fail_transcode: false,
        }
    }
}

struct FakeReader {
    metadata: VideoMetadata,
    remaining: u64,
}

impl FrameReader for FakeReader {
    fn metadata(&self) -> VideoMetadata {
        self.metadata
    }

    fn read_frame(&mut self) -> Option<RgbImage> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(RgbImage::from_pixel(
            self.metadata.width,
            self.metadata.height,
            Rgb([60, 60, 60]),
        ))
    }
}

struct FakeWriter {
    path: std::path::PathBuf,
    frames: u64,
}

impl FrameWriter for FakeWriter {
    fn write_frame(&mut self, _frame: &RgbImage) -> Result<(), ProcessingError> {
        self.frames += 1;
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<(), ProcessingError> {
        std::fs::write(&self.path, format!("{} frames", self.frames))?;
        Ok(())
    }
}

impl VideoBackend for FakeVideo {
    fn open(&self, path: &Path) -> Result<Box<dyn FrameReader>, ProcessingError> {
        let len = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        if len == 0 {
            return Err(ProcessingError::OpenFailed(path.display().to_string()));
        }
        Ok(Box::new(FakeReader {
            metadata: VideoMetadata {
                frame_rate: self.frame_rate,
                width: 32,
                height: 24,
            },
            remaining: self.frames,
        }))
    }

    fn create_writer(
        &self,
        path: &Path,
        _frame_rate: f64,
        _width: u32,
        _height: u32,
    ) -> Result<Box<dyn FrameWriter>, ProcessingError> {
        Ok(Box::new(FakeWriter {
            path: path.to_path_buf(),
            frames: 0,
        }))
    }

    fn transcode(&self, input: &Path, output: &Path) -> Result<(), ProcessingError> {
        std::fs::copy(input, output)?;
        if self.fail_transcode {
            return Err(ProcessingError::TranscodeFailed {
                exit_code: Some(1),
                stderr: "simulated".into(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// The router plus the temporary storage root backing it.
pub struct TestApp {
    pub router: Router,
    pub layout: StorageLayout,
    _static_root: TempDir,
}

pub fn test_config(static_root: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: "sqlite::memory:".to_string(),
        static_root: static_root.to_path_buf(),
        max_upload_bytes: 10 * 1024 * 1024,
        session_ttl_hours: 1,
        session_purge_interval_secs: 300,
        cookie_secure: false,
        ffmpeg_bin: "ffmpeg".to_string(),
        ffprobe_bin: "ffprobe".to_string(),
        pose_detector_cmd: "pose-detector".to_string(),
        log_format: LogFormat::Text,
    }
}

pub fn build_test_app(pool: SqlitePool) -> TestApp {
    build_test_app_with_video(pool, FakeVideo::default())
}

/// Build the production router around `pool`, a fake detector, `video` and
/// a fresh temporary storage root.
pub fn build_test_app_with_video(pool: SqlitePool, video: FakeVideo) -> TestApp {
    let static_root = tempfile::tempdir().expect("tempdir");
    let config = test_config(static_root.path());
    let layout = StorageLayout::new(static_root.path());
    layout.ensure_dirs().expect("storage dirs");

    let pipeline = MediaPipeline::new(layout.clone(), Arc::new(FakeDetector), Arc::new(video));
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        sessions: Arc::new(SessionStore::new(chrono::Duration::hours(
            config.session_ttl_hours,
        ))),
        pipeline: Arc::new(pipeline),
    };

    TestApp {
        router: build_app_router(state, &config),
        layout,
        _static_root: static_root,
    }
}

// ---------------------------------------------------------------------------
// Data helpers
// ---------------------------------------------------------------------------

pub async fn create_user(pool: &SqlitePool, username: &str) {
    let input = CreateUser {
        username: username.to_string(),
        password_hash: hash_password(TEST_PASSWORD).expect("hashing should succeed"),
    };
    UserRepo::create(pool, &input)
        .await
        .expect("user creation should succeed");
}

pub fn image_bytes(format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    RgbImage::from_pixel(48, 64, Rgb([120, 110, 100]))
        .write_to(&mut Cursor::new(&mut bytes), format)
        .expect("encode test image");
    bytes
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.expect("request failed")
}

pub async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    send(app, builder.body(Body::empty()).unwrap()).await
}

pub async fn post_form(app: &Router, uri: &str, body: &str, cookie: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    send(app, builder.body(Body::from(body.to_string())).unwrap()).await
}

const BOUNDARY: &str = "posekit-test-boundary";

/// POST a multipart form with one `file` part (or none when `file` is `None`).
pub async fn post_upload(
    app: &Router,
    cookie: Option<&str>,
    file: Option<(&str, &[u8])>,
) -> Response<Body> {
    let mut body = Vec::new();
    if let Some((filename, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; \
                 filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    } else {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::builder()
        .method("POST")
        .uri("/pose_backend")
        .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"));
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    send(app, builder.body(Body::from(body)).unwrap()).await
}

/// Log in through the form and return the `Cookie` header value to send back.
pub async fn login(app: &Router, username: &str) -> String {
    let response = post_form(
        app,
        "/login",
        &format!("username={username}&password={TEST_PASSWORD}"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    session_cookie(&response).expect("login should set a session cookie")
}

/// The `name=value` part of the response's session cookie.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("posekit_session="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

pub fn location(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes()
        .to_vec()
}

pub async fn body_string(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).expect("utf-8 body")
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).expect("json body")
}
