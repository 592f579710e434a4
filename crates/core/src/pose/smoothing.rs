//! Temporal landmark smoothing for video streams.

use std::collections::HashMap;

use super::landmarks::{Joint, Landmark, LandmarkSet};

/// Weight of the newest observation in the moving average.
pub const DEFAULT_ALPHA: f32 = 0.6;

/// Exponential moving average over landmark positions, per joint.
///
/// Confidence is not smoothed; only positions jitter between frames.
#[derive(Debug, Clone)]
pub struct LandmarkSmoother {
    alpha: f32,
    previous: HashMap<Joint, (f32, f32)>,
}

impl Default for LandmarkSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_ALPHA)
    }
}

impl LandmarkSmoother {
    /// `alpha` is clamped to `(0, 1]`; `1.0` disables smoothing.
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha: alpha.clamp(f32::EPSILON, 1.0),
            previous: HashMap::new(),
        }
    }

    pub fn reset(&mut self) {
        self.previous.clear();
    }

    pub fn apply(&mut self, set: LandmarkSet) -> LandmarkSet {
        let landmarks = set
            .landmarks
            .into_iter()
            .map(|lm| {
                let (x, y) = match self.previous.get(&lm.joint) {
                    Some(&(px, py)) => (
                        px + self.alpha * (lm.x - px),
                        py + self.alpha * (lm.y - py),
                    ),
                    None => (lm.x, lm.y),
                };
                self.previous.insert(lm.joint, (x, y));
                Landmark { x, y, ..lm }
            })
            .collect();

        LandmarkSet {
            landmarks,
            score: set.score,
        }
    }
}
