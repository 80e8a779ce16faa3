//! The collaborators the pipeline pulls data from.
//!
//! - [`FrameSource`] – a capture device.
//! - [`PoseEstimator`] – the pose model.
//! - [`ConfigSource`] – the current gesture templates and rules.
//!
//! Each is a trait so that infrastructure backends (and test doubles) can be
//! chosen once at startup and handed to the pipeline as trait objects.

use std::sync::Arc;

use gesture_core::domain::template::validate_templates;
use gesture_core::{GestureMapper, GestureTemplate, Joint, Keypoint, KeypointSet, MappingRule, TemplateError};
use thiserror::Error;

// ── Frames ────────────────────────────────────────────────────────────────────

/// One captured image, 8-bit BGR, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Increases by one per successful capture.
    pub sequence: u64,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Frame {
    /// An all-black frame.
    pub fn blank(sequence: u64, width: u32, height: u32) -> Self {
        Self {
            sequence,
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 3],
        }
    }
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture device is not open")]
    NotOpen,

    #[error("failed to open capture device: {0}")]
    Open(String),

    #[error("failed to read frame: {0}")]
    Read(String),

    #[error("failed to spawn capture thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// A camera or other frame producer.
pub trait FrameSource: Send {
    /// # Errors
    ///
    /// [`CaptureError::Open`] when the device cannot be opened.
    fn open(&mut self) -> Result<(), CaptureError>;

    /// Blocks until the next frame is available.
    ///
    /// # Errors
    ///
    /// [`CaptureError::NotOpen`] before [`FrameSource::open`], or
    /// [`CaptureError::Read`] on a transient device failure.
    fn capture(&mut self) -> Result<Frame, CaptureError>;

    fn close(&mut self);

    fn is_open(&self) -> bool;
}

/// Opens `source` on first use, then captures one frame.
///
/// # Errors
///
/// Whatever [`FrameSource::open`] or [`FrameSource::capture`] returned.
pub fn next_frame(source: &mut dyn FrameSource) -> Result<Frame, CaptureError> {
    if !source.is_open() {
        source.open()?;
    }
    source.capture()
}

// ── Poses ─────────────────────────────────────────────────────────────────────

/// One person as reported by the model: `[x, y, score]` per joint, in
/// canonical joint order.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPose {
    pub joints: Vec<[f64; 3]>,
}

impl RawPose {
    /// Keeps joints scored at or above `min_confidence`.  Extra entries past
    /// the 17th are ignored.
    pub fn to_keypoints(&self, min_confidence: f32) -> KeypointSet {
        let mut set = KeypointSet::new();
        for (i, [x, y, score]) in self.joints.iter().enumerate() {
            let Some(joint) = Joint::from_index(i) else {
                break;
            };
            let score = *score as f32;
            if score >= min_confidence {
                set.insert(joint, Keypoint::with_confidence(*x, *y, score));
            }
        }
        set
    }
}

/// Output of one inference call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Estimation {
    /// Every person found, most prominent first.
    pub poses: Vec<RawPose>,
    /// The input frame with the skeleton drawn on it, when the backend renders one.
    pub annotated: Option<Frame>,
}

#[derive(Debug, Error)]
pub enum EstimatorError {
    #[error("estimator backend '{0}' needs a path")]
    MissingPath(&'static str),

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: {source}")]
    Parse {
        path: std::path::PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("recording {0} contains no frames")]
    EmptyRecording(std::path::PathBuf),

    #[error("inference failed: {0}")]
    Inference(String),
}

/// A pose model.
#[cfg_attr(test, mockall::automock)]
pub trait PoseEstimator: Send {
    /// Runs the model on one frame.
    ///
    /// # Errors
    ///
    /// [`EstimatorError::Inference`] when the backend fails on this frame.
    fn infer(&mut self, frame: &Frame) -> Result<Estimation, EstimatorError>;

    /// Converts one detected person to keypoints, dropping low-confidence joints.
    fn pose_to_keypoints(&self, pose: &RawPose, min_confidence: f32) -> KeypointSet {
        pose.to_keypoints(min_confidence)
    }
}

// ── Gesture configuration ─────────────────────────────────────────────────────

/// An immutable set of templates plus the rule table derived from them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GestureConfig {
    pub templates: Vec<GestureTemplate>,
    pub mapper: GestureMapper,
}

impl GestureConfig {
    /// Validates `templates` and builds the mapper.
    ///
    /// # Errors
    ///
    /// Returns the first [`TemplateError`] found.
    pub fn new(
        templates: Vec<GestureTemplate>,
        rules: Vec<MappingRule>,
    ) -> Result<Self, TemplateError> {
        validate_templates(&templates)?;
        let mapper = GestureMapper::from_templates(&templates, rules);
        Ok(Self { templates, mapper })
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

/// Supplies the gesture snapshot for a processing cycle.
pub trait ConfigSource: Send + Sync {
    /// The latest consistent snapshot.
    fn current(&self) -> Arc<GestureConfig>;
}

/// A snapshot that never changes.
pub struct StaticConfigSource {
    snapshot: Arc<GestureConfig>,
}

impl StaticConfigSource {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            snapshot: Arc::new(config),
        }
    }
}

impl ConfigSource for StaticConfigSource {
    fn current(&self) -> Arc<GestureConfig> {
        Arc::clone(&self.snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_keypoints_drops_low_confidence_joints() {
        // Arrange
        let mut joints = vec![[10.0, 20.0, 0.9]; Joint::COUNT];
        joints[Joint::LeftWrist.index()] = [5.0, 5.0, 0.29];
        joints[Joint::RightWrist.index()] = [6.0, 6.0, 0.3];
        let pose = RawPose { joints };

        // Act
        let set = pose.to_keypoints(0.3);

        // Assert
        assert_eq!(set.len(), Joint::COUNT - 1);
        assert!(!set.contains(Joint::LeftWrist));
        assert_eq!(set.get(Joint::RightWrist).map(|k| (k.x, k.y)), Some((6.0, 6.0)));
    }

    #[test]
    fn test_to_keypoints_ignores_extra_joints() {
        let pose = RawPose {
            joints: vec![[1.0, 1.0, 1.0]; Joint::COUNT + 3],
        };
        assert_eq!(pose.to_keypoints(0.0).len(), Joint::COUNT);
    }

    #[test]
    fn test_short_pose_only_fills_leading_joints() {
        let pose = RawPose {
            joints: vec![[1.0, 1.0, 1.0]; 3],
        };
        let set = pose.to_keypoints(0.5);
        assert!(set.contains(Joint::Nose));
        assert!(set.contains(Joint::RightEye));
        assert!(!set.contains(Joint::LeftEar));
    }

    #[test]
    fn test_gesture_config_rejects_duplicate_indices() {
        let text = r#"[
            {"name": "A", "index": 1, "base_joint": "nose", "core_joints": ["left_eye"],
             "reference_vector": {"left_eye": [1, 0]}},
            {"name": "B", "index": 1, "base_joint": "nose", "core_joints": ["left_eye"],
             "reference_vector": {"left_eye": [1, 0]}}
        ]"#;
        let templates: Vec<GestureTemplate> = serde_json::from_str(text).unwrap();
        assert!(matches!(
            GestureConfig::new(templates, Vec::new()),
            Err(TemplateError::DuplicateIndex { index: 1, .. })
        ));
    }

    #[test]
    fn test_static_source_returns_same_snapshot() {
        let source = StaticConfigSource::new(GestureConfig::empty());
        assert!(Arc::ptr_eq(&source.current(), &source.current()));
    }
}
