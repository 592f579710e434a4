//! Single-frame annotation.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::ImageFormat;

use crate::error::ProcessingError;
use crate::overlay::{draw_landmarks, IMAGE_CONNECTION_SPEC, IMAGE_JOINT_SPEC};
use crate::pose::detector::{DetectorOptions, PoseDetector, PoseSession};

#[derive(Debug, Clone)]
pub struct AnnotatedImage {
    pub result_path: PathBuf,
    pub landmarks_found: bool,
    pub width: u32,
    pub height: u32,
}

/// Detect the pose in the image at `source` and write the annotated copy to
/// `result_path`.
///
/// An image without a detectable person is still written, undecorated. The
/// output format follows the extension of `result_path`.
pub fn annotate_image(
    source: &Path,
    result_path: &Path,
    detector: &dyn PoseDetector,
) -> Result<AnnotatedImage, ProcessingError> {
    let decoded = image::open(source)
        .map_err(|e| ProcessingError::DecodeFailed(e.to_string()))?;
    let mut frame = decoded.to_rgb8();
    let (width, height) = frame.dimensions();
    if width == 0 || height == 0 {
        return Err(ProcessingError::DecodeFailed("image has no pixels".into()));
    }

    let mut session = PoseSession::open(detector, DetectorOptions::single_image())?;
    let landmarks = session.process(&frame)?;

    if let Some(set) = &landmarks {
        draw_landmarks(&mut frame, set, &IMAGE_JOINT_SPEC, &IMAGE_CONNECTION_SPEC);
    }

    let format = ImageFormat::from_path(result_path)
        .map_err(|e| ProcessingError::Encode(e.to_string()))?;
    let mut encoded = Vec::new();
    frame
        .write_to(&mut Cursor::new(&mut encoded), format)
        .map_err(|e| ProcessingError::Encode(e.to_string()))?;
    // Encode fully before touching the destination so a failed run never
    // leaves a truncated result behind.
    std::fs::write(result_path, &encoded)?;

    tracing::debug!(
        result = %result_path.display(),
        width,
        height,
        landmarks_found = landmarks.is_some(),
        "Annotated image written"
    );

    Ok(AnnotatedImage {
        result_path: result_path.to_path_buf(),
        landmarks_found: landmarks.is_some(),
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use image::{Rgb, RgbImage};

    use super::*;
    use crate::pose::detector::testing::{full_pose, ScriptedDetector};

    fn write_sample(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        RgbImage::from_pixel(64, 48, Rgb([10, 20, 30]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn writes_annotated_result() {
        let tmp = tempfile::tempdir().unwrap();
        let source = write_sample(tmp.path(), "photo.png");
        let result = tmp.path().join("pose_photo.png");
        let detector = ScriptedDetector::always(Some(full_pose(0.9)));

        let out = annotate_image(&source, &result, &detector).unwrap();

        assert!(out.landmarks_found);
        assert_eq!((out.width, out.height), (64, 48));
        let written = image::open(&result).unwrap().to_rgb8();
        assert!(written.pixels().any(|p| *p == IMAGE_JOINT_SPEC.color));
    }

    #[test]
    fn no_landmarks_still_writes_plain_image() {
        let tmp = tempfile::tempdir().unwrap();
        let source = write_sample(tmp.path(), "empty.png");
        let result = tmp.path().join("pose_empty.png");
        let detector = ScriptedDetector::always(None);

        let out = annotate_image(&source, &result, &detector).unwrap();

        assert!(!out.landmarks_found);
        let written = image::open(&result).unwrap().to_rgb8();
        assert!(written.pixels().all(|p| *p == Rgb([10, 20, 30])));
    }

    #[test]
    fn rerun_overwrites_result() {
        let tmp = tempfile::tempdir().unwrap();
        let source = write_sample(tmp.path(), "photo.jpg");
        let result = tmp.path().join("pose_photo.jpg");
        let detector = ScriptedDetector::always(Some(full_pose(0.9)));

        annotate_image(&source, &result, &detector).unwrap();
        assert!(result.exists());
        annotate_image(&source, &result, &detector).unwrap();
        assert!(result.exists());
        assert!(image::open(&result).is_ok());
    }

    #[test]
    fn undecodable_input_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("broken.jpg");
        std::fs::write(&source, b"definitely not a jpeg").unwrap();
        let result = tmp.path().join("pose_broken.jpg");
        let detector = ScriptedDetector::always(None);

        assert_matches!(
            annotate_image(&source, &result, &detector),
            Err(ProcessingError::DecodeFailed(_))
        );
        assert!(!result.exists());
    }
}
