//! The pose detector seam.
//!
//! A [`PoseDetector`] hands out [`LandmarkEstimator`]s, the raw black box
//! (`frame -> landmarks`). [`PoseSession`] wraps one estimator for the lifetime
//! of one image or one video and applies the confidence thresholds and, in
//! streaming mode, temporal smoothing.

use image::RgbImage;

use super::landmarks::LandmarkSet;
use super::smoothing::LandmarkSmoother;

/// Minimum detection confidence used for both images and videos.
pub const MIN_DETECTION_CONFIDENCE: f32 = 0.5;

/// Minimum confidence to keep tracking an already detected pose.
pub const MIN_TRACKING_CONFIDENCE: f32 = 0.5;

/// Failures of the detection engine itself.
#[derive(Debug, thiserror::Error)]
pub enum DetectorError {
    #[error("detector could not be started: {0}")]
    Unavailable(String),

    #[error("detector failed (exit code {exit_code:?}): {stderr}")]
    ExecutionFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("invalid detector output: {0}")]
    InvalidOutput(String),

    #[error("I/O error talking to detector: {0}")]
    Io(#[from] std::io::Error),
}

/// Whether frames are independent images or a temporally coherent stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionMode {
    SingleImage,
    Stream,
}

#[derive(Debug, Clone, Copy)]
pub struct DetectorOptions {
    pub mode: DetectionMode,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
    pub smooth_landmarks: bool,
}

impl DetectorOptions {
    pub fn single_image() -> Self {
        Self {
            mode: DetectionMode::SingleImage,
            min_detection_confidence: MIN_DETECTION_CONFIDENCE,
            min_tracking_confidence: MIN_TRACKING_CONFIDENCE,
            smooth_landmarks: false,
        }
    }

    pub fn stream() -> Self {
        Self {
            mode: DetectionMode::Stream,
            min_detection_confidence: MIN_DETECTION_CONFIDENCE,
            min_tracking_confidence: MIN_TRACKING_CONFIDENCE,
            smooth_landmarks: true,
        }
    }
}

/// Raw landmark inference on one RGB frame.
///
/// Returns `Ok(None)` when no person is found. Thresholding is done by
/// [`PoseSession`], implementations report whatever the engine produced.
pub trait LandmarkEstimator: Send {
    fn estimate(&mut self, frame: &RgbImage) -> Result<Option<LandmarkSet>, DetectorError>;
}

/// Factory for estimators, shared across requests.
pub trait PoseDetector: Send + Sync {
    fn estimator(&self, mode: DetectionMode) -> Result<Box<dyn LandmarkEstimator>, DetectorError>;
}

/// One detection run (a single image, or every frame of one video).
pub struct PoseSession {
    estimator: Box<dyn LandmarkEstimator>,
    options: DetectorOptions,
    smoother: Option<LandmarkSmoother>,
    tracking: bool,
}

impl PoseSession {
    pub fn open(detector: &dyn PoseDetector, options: DetectorOptions) -> Result<Self, DetectorError> {
        let estimator = detector.estimator(options.mode)?;
        let smoother = (options.mode == DetectionMode::Stream && options.smooth_landmarks)
            .then(LandmarkSmoother::default);
        Ok(Self {
            estimator,
            options,
            smoother,
            tracking: false,
        })
    }

    /// Detect the pose in `frame`, or `None` if nothing passes the thresholds.
    ///
    /// In streaming mode a pose that is already being tracked only has to
    /// clear the tracking threshold; a lost pose resets the smoother.
    pub fn process(&mut self, frame: &RgbImage) -> Result<Option<LandmarkSet>, DetectorError> {
        let raw = self.estimator.estimate(frame)?.filter(|set| !set.is_empty());

        let threshold = if self.tracking && self.options.mode == DetectionMode::Stream {
            self.options.min_tracking_confidence
        } else {
            self.options.min_detection_confidence
        };

        let Some(set) = raw.filter(|set| set.score >= threshold) else {
            self.tracking = false;
            if let Some(smoother) = self.smoother.as_mut() {
                smoother.reset();
            }
            return Ok(None);
        };

        self.tracking = self.options.mode == DetectionMode::Stream;
        match self.smoother.as_mut() {
            Some(smoother) => Ok(Some(smoother.apply(set))),
            None => Ok(Some(set)),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted detector used by pipeline tests.

    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::pose::landmarks::{Joint, Landmark};

    /// A full-body pose with every joint at `confidence`.
    pub fn full_pose(confidence: f32) -> LandmarkSet {
        let landmarks = Joint::ALL
            .iter()
            .enumerate()
            .map(|(i, &joint)| Landmark {
                joint,
                x: 0.2 + 0.03 * i as f32,
                y: 0.1 + 0.05 * i as f32,
                confidence,
            })
            .collect();
        LandmarkSet::from_landmarks(landmarks)
    }

    /// Replays a fixed script of answers, then keeps answering `fallback`.
    pub struct ScriptedDetector {
        script: Arc<Mutex<VecDeque<Option<LandmarkSet>>>>,
        fallback: Option<LandmarkSet>,
        pub calls: Arc<Mutex<usize>>,
    }

    impl ScriptedDetector {
        pub fn always(answer: Option<LandmarkSet>) -> Self {
            Self::scripted(Vec::new(), answer)
        }

        pub fn scripted(script: Vec<Option<LandmarkSet>>, fallback: Option<LandmarkSet>) -> Self {
            Self {
                script: Arc::new(Mutex::new(script.into())),
                fallback,
                calls: Arc::new(Mutex::new(0)),
            }
        }
    }

    struct ScriptedEstimator {
        script: Arc<Mutex<VecDeque<Option<LandmarkSet>>>>,
        fallback: Option<LandmarkSet>,
        calls: Arc<Mutex<usize>>,
    }

    impl LandmarkEstimator for ScriptedEstimator {
        fn estimate(&mut self, _frame: &RgbImage) -> Result<Option<LandmarkSet>, DetectorError> {
            *self.calls.lock().unwrap() += 1;
            let next = self.script.lock().unwrap().pop_front();
            Ok(next.unwrap_or_else(|| self.fallback.clone()))
        }
    }

    impl PoseDetector for ScriptedDetector {
        fn estimator(&self, _mode: DetectionMode) -> Result<Box<dyn LandmarkEstimator>, DetectorError> {
            Ok(Box::new(ScriptedEstimator {
                script: Arc::clone(&self.script),
                fallback: self.fallback.clone(),
                calls: Arc::clone(&self.calls),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{full_pose, ScriptedDetector};
    use super::*;

    fn frame() -> RgbImage {
        RgbImage::new(8, 8)
    }

    #[test]
    fn single_image_applies_detection_threshold() {
        let detector = ScriptedDetector::scripted(
            vec![Some(full_pose(0.49)), Some(full_pose(0.5))],
            None,
        );
        let mut session = PoseSession::open(&detector, DetectorOptions::single_image()).unwrap();
        assert!(session.process(&frame()).unwrap().is_none());
        assert!(session.process(&frame()).unwrap().is_some());
        assert!(session.process(&frame()).unwrap().is_none());
    }

    #[test]
    fn stream_uses_tracking_threshold_once_tracking() {
        let options = DetectorOptions {
            min_detection_confidence: 0.8,
            min_tracking_confidence: 0.3,
            ..DetectorOptions::stream()
        };
        let detector = ScriptedDetector::scripted(
            vec![
                Some(full_pose(0.4)), // below detection: not tracking yet
                Some(full_pose(0.9)), // detected
                Some(full_pose(0.4)), // kept by tracking threshold
                Some(full_pose(0.2)), // lost
                Some(full_pose(0.4)), // below detection again
            ],
            None,
        );
        let mut session = PoseSession::open(&detector, options).unwrap();
        let found: Vec<bool> = (0..5)
            .map(|_| session.process(&frame()).unwrap().is_some())
            .collect();
        assert_eq!(found, vec![false, true, true, false, false]);
    }

    #[test]
    fn empty_sets_count_as_no_detection() {
        let detector = ScriptedDetector::always(Some(LandmarkSet {
            landmarks: vec![],
            score: 1.0,
        }));
        let mut session = PoseSession::open(&detector, DetectorOptions::single_image()).unwrap();
        assert!(session.process(&frame()).unwrap().is_none());
    }
}
