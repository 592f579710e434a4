//! Frame-by-frame video annotation.

use std::path::{Path, PathBuf};

use crate::error::ProcessingError;
use crate::overlay::{draw_landmarks, VIDEO_CONNECTION_SPEC, VIDEO_JOINT_SPEC};
use crate::pose::detector::{DetectorOptions, PoseDetector, PoseSession};
use crate::video::{effective_frame_rate, FrameReader, VideoBackend};

#[derive(Debug, Clone)]
pub struct AnnotatedVideo {
    pub result_path: PathBuf,
    pub frame_count: u64,
    pub frames_with_landmarks: u64,
    pub frame_rate: f64,
    pub width: u32,
    pub height: u32,
}

/// Where the video annotator reads from and writes to.
#[derive(Debug, Clone, Copy)]
pub struct VideoPaths<'a> {
    pub source: &'a Path,
    pub intermediate: &'a Path,
    pub result: &'a Path,
}

/// Annotate every frame of `paths.source` and produce a browser-playable
/// result at `paths.result`.
///
/// Frames are streamed one at a time into the intermediate file, which is
/// then transcoded and removed. The frame reader and writer are released
/// before transcoding starts. A failed transcode leaves no result file.
pub fn annotate_video(
    paths: VideoPaths<'_>,
    backend: &dyn VideoBackend,
    detector: &dyn PoseDetector,
) -> Result<AnnotatedVideo, ProcessingError> {
    let reader = backend.open(paths.source)?;
    let metadata = reader.metadata();
    let frame_rate = effective_frame_rate(metadata.frame_rate);
    if frame_rate != metadata.frame_rate {
        tracing::warn!(
            reported = metadata.frame_rate,
            used = frame_rate,
            "Unusable source frame rate, substituting default"
        );
    }

    let streamed = stream_frames(reader, paths.intermediate, frame_rate, backend, detector);
    let (frame_count, frames_with_landmarks) = match streamed {
        Ok(counts) => counts,
        Err(e) => {
            remove_if_exists(paths.intermediate);
            return Err(e);
        }
    };

    let transcoded = backend.transcode(paths.intermediate, paths.result);
    remove_if_exists(paths.intermediate);
    if let Err(e) = transcoded {
        remove_if_exists(paths.result);
        return Err(e);
    }

    tracing::info!(
        result = %paths.result.display(),
        frames = frame_count,
        frames_with_landmarks,
        fps = frame_rate,
        "Video processed"
    );

    Ok(AnnotatedVideo {
        result_path: paths.result.to_path_buf(),
        frame_count,
        frames_with_landmarks,
        frame_rate,
        width: metadata.width,
        height: metadata.height,
    })
}

/// Decode, annotate and encode until the source runs dry.
///
/// Takes ownership of the reader so both handles are released when this
/// returns, on success and on early exit alike.
fn stream_frames(
    mut reader: Box<dyn FrameReader>,
    intermediate: &Path,
    frame_rate: f64,
    backend: &dyn VideoBackend,
    detector: &dyn PoseDetector,
) -> Result<(u64, u64), ProcessingError> {
    let metadata = reader.metadata();
    let mut writer =
        backend.create_writer(intermediate, frame_rate, metadata.width, metadata.height)?;
    let mut session = PoseSession::open(detector, DetectorOptions::stream())?;

    let mut frame_count = 0u64;
    let mut with_landmarks = 0u64;
    while let Some(mut frame) = reader.read_frame() {
        if let Some(set) = session.process(&frame)? {
            draw_landmarks(&mut frame, &set, &VIDEO_JOINT_SPEC, &VIDEO_CONNECTION_SPEC);
            with_landmarks += 1;
        }
        writer.write_frame(&frame)?;
        frame_count += 1;
    }

    drop(reader);
    writer.finish()?;
    Ok((frame_count, with_landmarks))
}

fn remove_if_exists(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove file"),
    }
}
