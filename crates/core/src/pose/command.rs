//! Pose detector backed by an external command.
//!
//! The detection mode is passed in the `POSEKIT_DETECTION_MODE` environment
//! variable (`image` or `stream`), and every answer is a JSON document:
//!
//! ```json
//! {"landmarks": [{"joint": "nose", "x": 0.51, "y": 0.18, "confidence": 0.97}], "score": 0.93}
//! ```
//!
//! `landmarks` may be `null` or absent when no person is found. `score`
//! defaults to the mean landmark confidence.
//!
//! In `image` mode the command is spawned once per image, reads the PNG from
//! stdin until EOF and prints one document. In `stream` mode a single process
//! serves a whole video: each frame arrives as a line holding the PNG length
//! in bytes followed by the PNG itself, and the command answers with one
//! document per line, in order. The process sees EOF on stdin once the video
//! is done.

use std::io::{BufRead, BufReader, Cursor, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use image::{ImageFormat, RgbImage};
use serde::Deserialize;

use super::detector::{DetectionMode, DetectorError, LandmarkEstimator, PoseDetector};
use super::landmarks::{Landmark, LandmarkSet};

/// Environment variable carrying the detection mode to the command.
pub const MODE_ENV: &str = "POSEKIT_DETECTION_MODE";

#[derive(Debug, Clone)]
pub struct CommandPoseDetector {
    program: String,
    args: Vec<String>,
}

impl CommandPoseDetector {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build from a whitespace separated command line, e.g. `"python3 detect.py"`.
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl PoseDetector for CommandPoseDetector {
    fn estimator(&self, mode: DetectionMode) -> Result<Box<dyn LandmarkEstimator>, DetectorError> {
        Ok(match mode {
            DetectionMode::SingleImage => Box::new(OneShotEstimator {
                detector: self.clone(),
            }),
            DetectionMode::Stream => Box::new(StreamingEstimator {
                detector: self.clone(),
                process: None,
            }),
        })
    }
}

fn encode_png(frame: &RgbImage) -> Result<Vec<u8>, DetectorError> {
    let mut png = Vec::new();
    frame
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| DetectorError::InvalidOutput(format!("frame encode failed: {e}")))?;
    Ok(png)
}

/// One process per image.
struct OneShotEstimator {
    detector: CommandPoseDetector,
}

impl LandmarkEstimator for OneShotEstimator {
    fn estimate(&mut self, frame: &RgbImage) -> Result<Option<LandmarkSet>, DetectorError> {
        let png = encode_png(frame)?;

        let mut child = Command::new(&self.detector.program)
            .args(&self.detector.args)
            .env(MODE_ENV, "image")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                DetectorError::Unavailable(format!("{}: {e}", self.detector.program))
            })?;

        // Feed stdin from a separate thread so a chatty child cannot deadlock
        // on a full stdout pipe while we are still writing.
        let stdin = child.stdin.take();
        let writer = std::thread::spawn(move || -> std::io::Result<()> {
            if let Some(mut stdin) = stdin {
                stdin.write_all(&png)?;
            }
            Ok(())
        });

        let output = child.wait_with_output()?;
        let write_result = writer
            .join()
            .map_err(|_| DetectorError::InvalidOutput("stdin writer panicked".into()))?;

        if !output.status.success() {
            return Err(DetectorError::ExecutionFailed {
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        write_result?;

        parse_output(&String::from_utf8_lossy(&output.stdout))
    }
}

/// One long-lived process for every frame of a video, started on the first
/// frame.
struct StreamingEstimator {
    detector: CommandPoseDetector,
    process: Option<StreamProcess>,
}

struct StreamProcess {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl StreamingEstimator {
    fn spawn(&self) -> Result<StreamProcess, DetectorError> {
        let mut child = Command::new(&self.detector.program)
            .args(&self.detector.args)
            .env(MODE_ENV, "stream")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            // Inherited: an unread stderr pipe could fill up and stall the child.
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| {
                DetectorError::Unavailable(format!("{}: {e}", self.detector.program))
            })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(DetectorError::Unavailable("detector pipes unavailable".into()));
        };
        tracing::debug!(program = %self.detector.program, "Streaming detector started");
        Ok(StreamProcess {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        })
    }
}

impl StreamProcess {
    fn exchange(&mut self, png: &[u8]) -> Result<String, DetectorError> {
        let sent = writeln!(self.stdin, "{}", png.len())
            .and_then(|()| self.stdin.write_all(png))
            .and_then(|()| self.stdin.flush());
        if let Err(e) = sent {
            return Err(self.exited(format!("frame write failed: {e}")));
        }

        let mut line = String::new();
        if self.stdout.read_line(&mut line)? == 0 {
            return Err(self.exited("detector closed its output mid-stream".into()));
        }
        Ok(line)
    }

    fn exited(&mut self, reason: String) -> DetectorError {
        let _ = self.child.kill();
        let exit_code = self.child.wait().ok().and_then(|status| status.code());
        DetectorError::ExecutionFailed {
            exit_code,
            stderr: reason,
        }
    }
}

impl Drop for StreamProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl LandmarkEstimator for StreamingEstimator {
    fn estimate(&mut self, frame: &RgbImage) -> Result<Option<LandmarkSet>, DetectorError> {
        let png = encode_png(frame)?;
        let process = match self.process.take() {
            Some(process) => process,
            None => self.spawn()?,
        };
        let process = self.process.insert(process);

        match process.exchange(&png) {
            Ok(line) => parse_output(&line),
            Err(e) => {
                self.process = None;
                Err(e)
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct DetectorOutput {
    #[serde(default)]
    landmarks: Option<Vec<Landmark>>,
    #[serde(default)]
    score: Option<f32>,
}

/// Parse the JSON document printed by the detector command.
pub fn parse_output(stdout: &str) -> Result<Option<LandmarkSet>, DetectorError> {
    let parsed: DetectorOutput = serde_json::from_str(stdout.trim())
        .map_err(|e| DetectorError::InvalidOutput(format!("{e}: {stdout}")))?;

    let Some(landmarks) = parsed.landmarks.filter(|l| !l.is_empty()) else {
        return Ok(None);
    };

    let mut set = LandmarkSet::from_landmarks(landmarks);
    if let Some(score) = parsed.score {
        set.score = score;
    }
    Ok(Some(set))
}
