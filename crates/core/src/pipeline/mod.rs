//! Annotation pipeline: dispatch a validated upload to the image or video
//! annotator, then render its report.
//!
//! Everything here is synchronous. Callers on an async runtime are expected
//! to run [`MediaPipeline::process`] on a blocking thread.

pub mod image;
pub mod video;

use std::sync::Arc;

use crate::error::ProcessingError;
use crate::naming;
use crate::pose::detector::PoseDetector;
use crate::report::{build_report, ArtifactRef, ReportKind, ReportRequest, ReportStats};
use crate::storage::StorageLayout;
use crate::upload::{MediaKind, SanitizedAsset};
use crate::video::VideoBackend;

use self::image::annotate_image;
use self::video::{annotate_video, VideoPaths};

/// Names and figures of one finished run, for the result page.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingOutcome {
    pub kind: MediaKind,
    pub input_filename: String,
    pub result_filename: String,
    pub report_filename: String,
    /// Set for videos only.
    pub frame_count: Option<u64>,
    pub landmarks_found: bool,
}

impl ProcessingOutcome {
    /// User-facing success line.
    pub fn message(&self) -> String {
        match (self.kind, self.frame_count) {
            (MediaKind::Video, Some(frames)) => {
                format!("✅ Video processed successfully! ({frames} frames)")
            }
            (MediaKind::Video, None) => "✅ Video processed successfully!".to_string(),
            (MediaKind::Image, _) => "✅ Image processed successfully!".to_string(),
        }
    }
}

/// The annotators wired to their injected capabilities and storage.
#[derive(Clone)]
pub struct MediaPipeline {
    layout: StorageLayout,
    detector: Arc<dyn PoseDetector>,
    video: Arc<dyn VideoBackend>,
}

impl MediaPipeline {
    pub fn new(
        layout: StorageLayout,
        detector: Arc<dyn PoseDetector>,
        video: Arc<dyn VideoBackend>,
    ) -> Self {
        Self {
            layout,
            detector,
            video,
        }
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    /// Annotate `asset` and write its report.
    ///
    /// Produces `results/pose_<name>` and `reports/<stem>_pose.pdf`,
    /// overwriting earlier artifacts of the same name.
    pub fn process(&self, asset: &SanitizedAsset) -> Result<ProcessingOutcome, ProcessingError> {
        let name = asset.sanitized_filename.as_str();
        let result_path = self.layout.result_path(name);
        let result_filename = naming::result_filename(name);

        let (frame_count, landmarks_found, report) = match asset.kind {
            MediaKind::Image => {
                let annotated = annotate_image(&asset.path, &result_path, self.detector.as_ref())?;
                let report = build_report(&ReportRequest {
                    kind: ReportKind::Image,
                    source_filename: name,
                    artifact: ArtifactRef::Embedded(&annotated.result_path),
                    stats: ReportStats::default(),
                })?;
                (None, annotated.landmarks_found, report)
            }
            MediaKind::Video => {
                let intermediate = self.layout.intermediate_path(name);
                let annotated = annotate_video(
                    VideoPaths {
                        source: &asset.path,
                        intermediate: &intermediate,
                        result: &result_path,
                    },
                    self.video.as_ref(),
                    self.detector.as_ref(),
                )?;
                let report = build_report(&ReportRequest {
                    kind: ReportKind::Video,
                    source_filename: name,
                    artifact: ArtifactRef::Named(&result_filename),
                    stats: ReportStats {
                        frame_count: Some(annotated.frame_count),
                        frames_with_landmarks: Some(annotated.frames_with_landmarks),
                    },
                })?;
                (
                    Some(annotated.frame_count),
                    annotated.frames_with_landmarks > 0,
                    report,
                )
            }
        };

        report.write_to(self.layout.reports_dir())?;

        tracing::info!(
            input = %name,
            result = %result_filename,
            report = %report.filename,
            landmarks_found,
            "Processing finished"
        );

        Ok(ProcessingOutcome {
            kind: asset.kind,
            input_filename: name.to_string(),
            result_filename,
            report_filename: report.filename,
            frame_count,
            landmarks_found,
        })
    }
}
