//! FFmpeg/FFprobe backed [`VideoBackend`].
//!
//! Frames travel as raw `rgb24` over pipes: `ffmpeg` decodes the source to
//! stdout for the reader, and encodes stdin into the intermediate container
//! for the writer. Every spawned process has its exit status checked.

use std::io::{Read, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use image::imageops::FilterType;
use image::RgbImage;
use serde::Deserialize;

use crate::error::ProcessingError;
use crate::video::{FrameReader, FrameWriter, VideoBackend, VideoMetadata};

/// Error type for FFmpeg/FFprobe invocations.
#[derive(Debug, thiserror::Error)]
pub enum FfmpegError {
    #[error("ffprobe/ffmpeg binary not found: {0}")]
    NotFound(std::io::Error),

    #[error("ffprobe/ffmpeg execution failed (exit code {exit_code:?}): {stderr}")]
    ExecutionFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("failed to parse ffprobe output: {0}")]
    ParseError(String),

    #[error("video file not found: {0}")]
    VideoNotFound(String),
}

// ---------------------------------------------------------------------------
// ffprobe JSON output structures
// ---------------------------------------------------------------------------

/// Top-level ffprobe JSON output (`-print_format json -show_streams`).
#[derive(Debug, Deserialize)]
pub struct FfprobeOutput {
    #[serde(default)]
    pub streams: Vec<FfprobeStream>,
}

/// A single stream from ffprobe output.
#[derive(Debug, Default, Deserialize)]
pub struct FfprobeStream {
    pub codec_type: Option<String>,
    /// Coded width, before any display rotation.
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Average rate, e.g. "30/1"; "0/0" when unknown.
    pub avg_frame_rate: Option<String>,
    /// Base rate, e.g. "24000/1001".
    pub r_frame_rate: Option<String>,
    #[serde(default)]
    pub side_data_list: Vec<FfprobeSideData>,
    #[serde(default)]
    pub tags: FfprobeTags,
}

/// Stream side data; only the display matrix rotation is of interest.
#[derive(Debug, Default, Deserialize)]
pub struct FfprobeSideData {
    pub rotation: Option<f64>,
}

/// Stream tags. Older ffprobe builds report rotation as a `rotate` tag.
#[derive(Debug, Default, Deserialize)]
pub struct FfprobeTags {
    pub rotate: Option<String>,
}

impl FfprobeStream {
    /// Display rotation in degrees, normalised to `0..360`.
    pub fn rotation(&self) -> i64 {
        let degrees = self
            .side_data_list
            .iter()
            .find_map(|d| d.rotation)
            .or_else(|| self.tags.rotate.as_deref().and_then(|r| r.trim().parse().ok()))
            .unwrap_or(0.0);
        (degrees.round() as i64).rem_euclid(360)
    }
}

// ---------------------------------------------------------------------------
// Probing
// ---------------------------------------------------------------------------

/// Run `ffprobe` on a video file and return the parsed JSON output.
pub fn probe_video(ffprobe: &str, path: &Path) -> Result<FfprobeOutput, FfmpegError> {
    if !path.exists() {
        return Err(FfmpegError::VideoNotFound(
            path.to_string_lossy().to_string(),
        ));
    }

    let output = Command::new(ffprobe)
        .args(["-v", "quiet", "-print_format", "json", "-show_streams"])
        .arg(path)
        .output()
        .map_err(FfmpegError::NotFound)?;

    if !output.status.success() {
        return Err(FfmpegError::ExecutionFailed {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str::<FfprobeOutput>(&stdout)
        .map_err(|e| FfmpegError::ParseError(format!("{e}: {stdout}")))
}

/// Find the first video stream in the ffprobe output.
fn first_video_stream(probe: &FfprobeOutput) -> Option<&FfprobeStream> {
    probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
}

/// Parse the video framerate from ffprobe output.
///
/// Prefers `avg_frame_rate` and falls back to `r_frame_rate`; `0.0` when
/// neither is usable. Plausibility checks are the caller's job.
pub fn parse_framerate(probe: &FfprobeOutput) -> f64 {
    let Some(stream) = first_video_stream(probe) else {
        return 0.0;
    };
    [&stream.avg_frame_rate, &stream.r_frame_rate]
        .into_iter()
        .filter_map(|r| r.as_deref().map(parse_fraction))
        .find(|fps| *fps > 0.0)
        .unwrap_or(0.0)
}

/// Parse a fraction string like `"30/1"` into a float.
fn parse_fraction(s: &str) -> f64 {
    let parts: Vec<&str> = s.split('/').collect();
    if parts.len() == 2 {
        let num = parts[0].parse::<f64>().unwrap_or(0.0);
        let den = parts[1].parse::<f64>().unwrap_or(1.0);
        if den > 0.0 {
            return num / den;
        }
        return 0.0;
    }
    s.parse::<f64>().unwrap_or(0.0)
}

/// Find the first video stream's coded resolution.
pub fn parse_resolution(probe: &FfprobeOutput) -> (u32, u32) {
    first_video_stream(probe)
        .map(|s| (s.width.unwrap_or(0), s.height.unwrap_or(0)))
        .unwrap_or((0, 0))
}

/// Resolution of the frames the decoder emits. ffmpeg applies the display
/// rotation while decoding, so a quarter turn swaps width and height.
pub fn parse_display_resolution(probe: &FfprobeOutput) -> (u32, u32) {
    let (width, height) = parse_resolution(probe);
    match first_video_stream(probe).map(FfprobeStream::rotation) {
        Some(90 | 270) => (height, width),
        _ => (width, height),
    }
}

/// Extract the metadata the annotator needs, rejecting streams without a
/// video track or with zero dimensions. Dimensions are those of the decoded,
/// upright frames.
pub fn parse_metadata(probe: &FfprobeOutput) -> Option<VideoMetadata> {
    first_video_stream(probe)?;
    let (width, height) = parse_display_resolution(probe);
    if width == 0 || height == 0 {
        return None;
    }
    Some(VideoMetadata {
        frame_rate: parse_framerate(probe),
        width,
        height,
    })
}

// ---------------------------------------------------------------------------
// Backend
// ---------------------------------------------------------------------------

/// Production [`VideoBackend`] shelling out to `ffmpeg` and `ffprobe`.
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    ffmpeg: String,
    ffprobe: String,
}

impl Default for FfmpegBackend {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

impl FfmpegBackend {
    pub fn new(ffmpeg: impl Into<String>, ffprobe: impl Into<String>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }
}

impl VideoBackend for FfmpegBackend {
    fn open(&self, path: &Path) -> Result<Box<dyn FrameReader>, ProcessingError> {
        let probe = probe_video(&self.ffprobe, path)
            .map_err(|e| ProcessingError::OpenFailed(e.to_string()))?;
        let metadata = parse_metadata(&probe)
            .ok_or_else(|| ProcessingError::OpenFailed("no decodable video stream".into()))?;

        let mut child = Command::new(&self.ffmpeg)
            .args(["-v", "error", "-nostdin", "-i"])
            .arg(path)
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ProcessingError::OpenFailed(format!("{}: {e}", self.ffmpeg)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ProcessingError::OpenFailed("decoder stdout unavailable".into()))?;

        Ok(Box::new(FfmpegFrameReader {
            metadata,
            child,
            stdout,
            exhausted: false,
        }))
    }

    fn create_writer(
        &self,
        path: &Path,
        frame_rate: f64,
        width: u32,
        height: u32,
    ) -> Result<Box<dyn FrameWriter>, ProcessingError> {
        let mut child = Command::new(&self.ffmpeg)
            .args(["-y", "-v", "error", "-f", "rawvideo", "-pix_fmt", "rgb24"])
            .args(["-s", &format!("{width}x{height}")])
            .args(["-r", &format!("{frame_rate}")])
            .args(["-i", "-", "-an", "-c:v", "mpeg4", "-tag:v", "mp4v", "-q:v", "2"])
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ProcessingError::Encode(format!("{}: {e}", self.ffmpeg)))?;

        let stdin = child.stdin.take();
        Ok(Box::new(FfmpegFrameWriter {
            width,
            height,
            child: Some(child),
            stdin,
        }))
    }

    fn transcode(&self, input: &Path, output: &Path) -> Result<(), ProcessingError> {
        let result = Command::new(&self.ffmpeg)
            .args(["-y", "-v", "error", "-i"])
            .arg(input)
            .args(["-vcodec", "libx264", "-pix_fmt", "yuv420p"])
            // yuv420p needs even dimensions.
            .args(["-vf", "scale=trunc(iw/2)*2:trunc(ih/2)*2"])
            .arg(output)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| ProcessingError::TranscodeFailed {
                exit_code: None,
                stderr: format!("{}: {e}", self.ffmpeg),
            })?;

        if !result.status.success() {
            return Err(ProcessingError::TranscodeFailed {
                exit_code: result.status.code(),
                stderr: String::from_utf8_lossy(&result.stderr).to_string(),
            });
        }
        Ok(())
    }
}

struct FfmpegFrameReader {
    metadata: VideoMetadata,
    child: Child,
    stdout: ChildStdout,
    exhausted: bool,
}

impl FrameReader for FfmpegFrameReader {
    fn metadata(&self) -> VideoMetadata {
        self.metadata
    }

    fn read_frame(&mut self) -> Option<RgbImage> {
        if self.exhausted {
            return None;
        }
        let VideoMetadata { width, height, .. } = self.metadata;
        let mut buf = vec![0u8; width as usize * height as usize * 3];
        if let Err(e) = self.stdout.read_exact(&mut buf) {
            tracing::debug!(error = %e, "Decoder stream ended");
            self.exhausted = true;
            return None;
        }
        RgbImage::from_raw(width, height, buf)
    }
}

impl Drop for FfmpegFrameReader {
    fn drop(&mut self) {
        // The decoder may still be running if the stream was abandoned early.
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

struct FfmpegFrameWriter {
    width: u32,
    height: u32,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
}

impl FrameWriter for FfmpegFrameWriter {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<(), ProcessingError> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| ProcessingError::Encode("writer already closed".into()))?;

        let result = if frame.dimensions() == (self.width, self.height) {
            stdin.write_all(frame.as_raw())
        } else {
            let resized =
                image::imageops::resize(frame, self.width, self.height, FilterType::Triangle);
            stdin.write_all(resized.as_raw())
        };
        result.map_err(|e| ProcessingError::Encode(format!("encoder pipe closed: {e}")))
    }

    fn finish(mut self: Box<Self>) -> Result<(), ProcessingError> {
        // Closing stdin signals end of input to the encoder.
        drop(self.stdin.take());
        let Some(child) = self.child.take() else {
            return Ok(());
        };
        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(ProcessingError::Encode(format!(
                "encoder exited with status {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr)
            )));
        }
        Ok(())
    }
}

impl Drop for FfmpegFrameWriter {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}
