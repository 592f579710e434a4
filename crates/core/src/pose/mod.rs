//! Pose landmark types and the detector capability.
//!
//! - [`landmarks`] -- joints, landmark sets, skeleton topology.
//! - [`detector`] -- the [`detector::PoseDetector`] seam and per-run sessions.
//! - [`smoothing`] -- temporal smoothing for streaming detection.
//! - [`command`] -- detector backed by an external command.

pub mod command;
pub mod detector;
pub mod landmarks;
pub mod smoothing;
