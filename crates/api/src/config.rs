use std::path::PathBuf;

/// Log output format selected with `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Server configuration loaded from environment variables.
///
/// Every field has a default suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `5000`).
    pub port: u16,
    /// SQLite URL of the credential store.
    pub database_url: String,
    /// Root holding `uploads/`, `results/` and `reports/`.
    pub static_root: PathBuf,
    /// Largest accepted request body, in bytes.
    pub max_upload_bytes: usize,
    /// Lifetime of a login session, in hours.
    pub session_ttl_hours: i64,
    /// How often expired sessions are purged, in seconds.
    pub session_purge_interval_secs: u64,
    /// Add the `Secure` attribute to the session cookie.
    pub cookie_secure: bool,
    pub ffmpeg_bin: String,
    pub ffprobe_bin: String,
    /// Pose detector command line, split on whitespace.
    pub pose_detector_cmd: String,
    pub log_format: LogFormat,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                      |
    /// |-------------------------------|------------------------------|
    /// | `HOST`                        | `0.0.0.0`                    |
    /// | `PORT`                        | `5000`                       |
    /// | `DATABASE_URL`                | `sqlite://users.db?mode=rwc` |
    /// | `STATIC_ROOT`                 | `static`                     |
    /// | `MAX_UPLOAD_BYTES`            | `524288000`                  |
    /// | `SESSION_TTL_HOURS`           | `12`                         |
    /// | `SESSION_PURGE_INTERVAL_SECS` | `300`                        |
    /// | `COOKIE_SECURE`               | `false`                      |
    /// | `FFMPEG_BIN`                  | `ffmpeg`                     |
    /// | `FFPROBE_BIN`                 | `ffprobe`                    |
    /// | `POSE_DETECTOR_CMD`           | `pose-detector`              |
    /// | `LOG_FORMAT`                  | `text`                       |
    ///
    /// Panics on malformed numeric values so misconfiguration fails at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "5000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://users.db?mode=rwc".into());

        let static_root =
            PathBuf::from(std::env::var("STATIC_ROOT").unwrap_or_else(|_| "static".into()));

        let max_upload_bytes: usize = std::env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| "524288000".into())
            .parse()
            .expect("MAX_UPLOAD_BYTES must be a valid usize");

        let session_ttl_hours: i64 = std::env::var("SESSION_TTL_HOURS")
            .unwrap_or_else(|_| "12".into())
            .parse()
            .expect("SESSION_TTL_HOURS must be a valid i64");

        let session_purge_interval_secs: u64 = std::env::var("SESSION_PURGE_INTERVAL_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("SESSION_PURGE_INTERVAL_SECS must be a valid u64");

        let cookie_secure = std::env::var("COOKIE_SECURE")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let log_format = match std::env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Self {
            host,
            port,
            database_url,
            static_root,
            max_upload_bytes,
            session_ttl_hours,
            session_purge_interval_secs,
            cookie_secure,
            ffmpeg_bin: std::env::var("FFMPEG_BIN").unwrap_or_else(|_| "ffmpeg".into()),
            ffprobe_bin: std::env::var("FFPROBE_BIN").unwrap_or_else(|_| "ffprobe".into()),
            pose_detector_cmd: std::env::var("POSE_DETECTOR_CMD")
                .unwrap_or_else(|_| "pose-detector".into()),
            log_format,
        }
    }
}
