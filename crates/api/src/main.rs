use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use posekit_core::ffmpeg::FfmpegBackend;
use posekit_core::pipeline::MediaPipeline;
use posekit_core::pose::command::CommandPoseDetector;
use posekit_core::storage::StorageLayout;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use posekit_api::auth::session::SessionStore;
use posekit_api::background;
use posekit_api::config::{LogFormat, ServerConfig};
use posekit_api::router::build_app_router;
use posekit_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = ServerConfig::from_env();

    // --- Tracing ---
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "posekit_api=debug,posekit_core=debug,posekit_db=debug,tower_http=debug".into()
    });
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let pool = posekit_db::create_pool(&config.database_url)
        .await
        .expect("Failed to open database");
    tracing::info!("Database connection pool created");

    posekit_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    posekit_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    // --- Storage ---
    let layout = StorageLayout::new(&config.static_root);
    layout
        .ensure_dirs()
        .expect("Failed to create storage directories");
    tracing::info!(root = %layout.root().display(), "Storage directories ready");

    // --- Pipeline ---
    let detector = CommandPoseDetector::from_command_line(&config.pose_detector_cmd)
        .expect("POSE_DETECTOR_CMD must name a program");
    tracing::info!(program = %detector.program(), "Pose detector configured");
    let video = FfmpegBackend::new(&config.ffmpeg_bin, &config.ffprobe_bin);
    let pipeline = Arc::new(MediaPipeline::new(
        layout,
        Arc::new(detector),
        Arc::new(video),
    ));

    // --- Sessions ---
    let sessions = Arc::new(SessionStore::new(chrono::Duration::hours(
        config.session_ttl_hours,
    )));
    let purge_cancel = CancellationToken::new();
    let purge_handle = tokio::spawn(background::session_purge::run(
        Arc::clone(&sessions),
        Duration::from_secs(config.session_purge_interval_secs.max(1)),
        purge_cancel.clone(),
    ));

    // --- App state ---
    let state = AppState {
        pool: pool.clone(),
        config: Arc::new(config.clone()),
        sessions: Arc::clone(&sessions),
        pipeline,
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    purge_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), purge_handle).await;
    let dropped = sessions.len().await;
    sessions.clear().await;
    tracing::info!(dropped, "Session store torn down");

    pool.close().await;
    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or (on Unix) SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
