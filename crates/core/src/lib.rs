//! Pose annotation domain logic.
//!
//! Everything here is synchronous and free of HTTP or database concerns so the
//! API crate can drive it from a blocking task and tests can drive it with
//! in-memory fakes for the detector and the video backend.

pub mod delivery;
pub mod error;
pub mod ffmpeg;
pub mod naming;
pub mod overlay;
pub mod pipeline;
pub mod pose;
pub mod report;
pub mod storage;
pub mod upload;
pub mod video;
