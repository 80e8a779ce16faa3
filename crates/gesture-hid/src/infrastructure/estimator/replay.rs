//! Plays back keypoints recorded to a JSON-lines file.
//!
//! One line per frame.  A line is either one person (17 `[x, y, score]`
//! triples in canonical joint order), a list of people, or `[]` for an empty
//! scene.  Blank lines are skipped.  Playback wraps around at the end of the
//! file.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::application::sources::{Estimation, EstimatorError, Frame, PoseEstimator, RawPose};

#[derive(Deserialize)]
#[serde(untagged)]
enum RecordedFrame {
    Many(Vec<Vec<[f64; 3]>>),
    One(Vec<[f64; 3]>),
}

impl From<RecordedFrame> for Vec<RawPose> {
    fn from(frame: RecordedFrame) -> Self {
        match frame {
            RecordedFrame::Many(people) => people
                .into_iter()
                .map(|joints| RawPose { joints })
                .collect(),
            RecordedFrame::One(joints) => vec![RawPose { joints }],
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReplayEstimator {
    path: PathBuf,
    frames: Vec<Vec<RawPose>>,
    cursor: usize,
}

impl ReplayEstimator {
    /// Reads the whole recording.
    ///
    /// # Errors
    ///
    /// [`EstimatorError::Io`], [`EstimatorError::Parse`] with the 1-based
    /// line number, or [`EstimatorError::EmptyRecording`].
    pub fn load(path: &Path) -> Result<Self, EstimatorError> {
        let text = std::fs::read_to_string(path).map_err(|source| EstimatorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// Parses recording text; `path` is used in errors only.
    ///
    /// # Errors
    ///
    /// See [`ReplayEstimator::load`].
    pub fn parse(text: &str, path: &Path) -> Result<Self, EstimatorError> {
        let mut frames = Vec::new();
        for (i, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let frame: RecordedFrame =
                serde_json::from_str(line).map_err(|source| EstimatorError::Parse {
                    path: path.to_path_buf(),
                    line: i + 1,
                    source,
                })?;
            frames.push(frame.into());
        }
        if frames.is_empty() {
            return Err(EstimatorError::EmptyRecording(path.to_path_buf()));
        }
        Ok(Self {
            path: path.to_path_buf(),
            frames,
            cursor: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of recorded frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl PoseEstimator for ReplayEstimator {
    fn infer(&mut self, _frame: &Frame) -> Result<Estimation, EstimatorError> {
        let poses = self.frames[self.cursor].clone();
        self.cursor = (self.cursor + 1) % self.frames.len();
        Ok(Estimation {
            poses,
            annotated: None,
        })
    }
}
