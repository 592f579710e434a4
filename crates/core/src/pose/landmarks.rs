//! Joints, landmark sets and the skeleton drawn between them.

use serde::{Deserialize, Serialize};

/// A tracked anatomical keypoint (COCO 17-keypoint topology).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Joint {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
}

impl Joint {
    pub const ALL: [Joint; 17] = [
        Joint::Nose,
        Joint::LeftEye,
        Joint::RightEye,
        Joint::LeftEar,
        Joint::RightEar,
        Joint::LeftShoulder,
        Joint::RightShoulder,
        Joint::LeftElbow,
        Joint::RightElbow,
        Joint::LeftWrist,
        Joint::RightWrist,
        Joint::LeftHip,
        Joint::RightHip,
        Joint::LeftKnee,
        Joint::RightKnee,
        Joint::LeftAnkle,
        Joint::RightAnkle,
    ];

    pub fn region(self) -> BodyRegion {
        use Joint::*;
        match self {
            Nose | LeftEye | RightEye | LeftEar | RightEar => BodyRegion::Head,
            LeftShoulder | RightShoulder => BodyRegion::Shoulders,
            LeftElbow | RightElbow => BodyRegion::Elbows,
            LeftWrist | RightWrist => BodyRegion::Wrists,
            LeftHip | RightHip => BodyRegion::Hips,
            LeftKnee | RightKnee => BodyRegion::Knees,
            LeftAnkle | RightAnkle => BodyRegion::Ankles,
        }
    }
}

/// Body regions used to group joints in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyRegion {
    Head,
    Shoulders,
    Elbows,
    Wrists,
    Hips,
    Knees,
    Ankles,
}

impl BodyRegion {
    pub const ALL: [BodyRegion; 7] = [
        BodyRegion::Head,
        BodyRegion::Shoulders,
        BodyRegion::Elbows,
        BodyRegion::Wrists,
        BodyRegion::Hips,
        BodyRegion::Knees,
        BodyRegion::Ankles,
    ];

    /// Human readable label, e.g. `"Knees (Left & Right)"`.
    pub fn label(self) -> &'static str {
        match self {
            BodyRegion::Head => "Nose, Eyes, Ears",
            BodyRegion::Shoulders => "Shoulders (Left & Right)",
            BodyRegion::Elbows => "Elbows (Left & Right)",
            BodyRegion::Wrists => "Wrists (Left & Right)",
            BodyRegion::Hips => "Hips (Left & Right)",
            BodyRegion::Knees => "Knees (Left & Right)",
            BodyRegion::Ankles => "Ankles (Left & Right)",
        }
    }

    pub fn joints(self) -> impl Iterator<Item = Joint> {
        Joint::ALL.into_iter().filter(move |j| j.region() == self)
    }
}

/// Bones drawn between joints.
pub const SKELETON: [(Joint, Joint); 19] = [
    (Joint::Nose, Joint::LeftEye),
    (Joint::Nose, Joint::RightEye),
    (Joint::LeftEye, Joint::LeftEar),
    (Joint::RightEye, Joint::RightEar),
    (Joint::LeftEye, Joint::RightEye),
    (Joint::LeftEar, Joint::LeftShoulder),
    (Joint::RightEar, Joint::RightShoulder),
    (Joint::LeftShoulder, Joint::RightShoulder),
    (Joint::LeftShoulder, Joint::LeftElbow),
    (Joint::LeftElbow, Joint::LeftWrist),
    (Joint::RightShoulder, Joint::RightElbow),
    (Joint::RightElbow, Joint::RightWrist),
    (Joint::LeftShoulder, Joint::LeftHip),
    (Joint::RightShoulder, Joint::RightHip),
    (Joint::LeftHip, Joint::RightHip),
    (Joint::LeftHip, Joint::LeftKnee),
    (Joint::LeftKnee, Joint::LeftAnkle),
    (Joint::RightHip, Joint::RightKnee),
    (Joint::RightKnee, Joint::RightAnkle),
];

/// One detected keypoint. `x` and `y` are normalized to `[0, 1]` of the
/// frame width and height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub joint: Joint,
    pub x: f32,
    pub y: f32,
    pub confidence: f32,
}

impl Landmark {
    /// Pixel position in a `width` x `height` frame, clamped to the frame.
    pub fn to_pixel(&self, width: u32, height: u32) -> (i32, i32) {
        let max_x = width.saturating_sub(1) as f32;
        let max_y = height.saturating_sub(1) as f32;
        let px = (self.x * width as f32).round().clamp(0.0, max_x);
        let py = (self.y * height as f32).round().clamp(0.0, max_y);
        (px as i32, py as i32)
    }
}

/// All landmarks of a single person in one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSet {
    pub landmarks: Vec<Landmark>,
    /// Overall detection score in `[0, 1]`.
    pub score: f32,
}

impl LandmarkSet {
    /// Build a set whose score is the mean landmark confidence.
    pub fn from_landmarks(landmarks: Vec<Landmark>) -> Self {
        let score = mean_confidence(&landmarks);
        Self { landmarks, score }
    }

    pub fn get(&self, joint: Joint) -> Option<&Landmark> {
        self.landmarks.iter().find(|l| l.joint == joint)
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }
}

fn mean_confidence(landmarks: &[Landmark]) -> f32 {
    if landmarks.is_empty() {
        return 0.0;
    }
    landmarks.iter().map(|l| l.confidence).sum::<f32>() / landmarks.len() as f32
}
