//! Body keypoints as produced by a 17-joint pose estimator.
//!
//! Coordinates are in the pixel space of the output resolution, with the
//! origin in the top-left corner and `y` growing downwards.  A joint that the
//! estimator did not report (or reported below the confidence threshold) is
//! simply absent from the [`KeypointSet`].

use serde::{Deserialize, Serialize};

/// The 17 canonical body joints, in the order pose models emit them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(usize)]
pub enum Joint {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

impl Joint {
    pub const COUNT: usize = 17;

    /// All joints in model output order.
    pub const ALL: [Joint; Joint::COUNT] = [
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

    /// Returns the joint at position `index` of the model output.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Position of this joint in the model output.
    pub fn index(self) -> usize {
        self as usize
    }

    /// The snake_case name used in template files (`"left_wrist"`).
    pub fn name(self) -> &'static str {
        match self {
            Joint::Nose => "nose",
            Joint::LeftEye => "left_eye",
            Joint::RightEye => "right_eye",
            Joint::LeftEar => "left_ear",
            Joint::RightEar => "right_ear",
            Joint::LeftShoulder => "left_shoulder",
            Joint::RightShoulder => "right_shoulder",
            Joint::LeftElbow => "left_elbow",
            Joint::RightElbow => "right_elbow",
            Joint::LeftWrist => "left_wrist",
            Joint::RightWrist => "right_wrist",
            Joint::LeftHip => "left_hip",
            Joint::RightHip => "right_hip",
            Joint::LeftKnee => "left_knee",
            Joint::RightKnee => "right_knee",
            Joint::LeftAnkle => "left_ankle",
            Joint::RightAnkle => "right_ankle",
        }
    }

    /// Parses a snake_case joint name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|j| j.name() == name)
    }

    /// The same joint on the opposite side of the body.  `Nose` maps to itself.
    pub fn mirror(self) -> Self {
        match self {
            Joint::Nose => Joint::Nose,
            Joint::LeftEye => Joint::RightEye,
            Joint::RightEye => Joint::LeftEye,
            Joint::LeftEar => Joint::RightEar,
            Joint::RightEar => Joint::LeftEar,
            Joint::LeftShoulder => Joint::RightShoulder,
            Joint::RightShoulder => Joint::LeftShoulder,
            Joint::LeftElbow => Joint::RightElbow,
            Joint::RightElbow => Joint::LeftElbow,
            Joint::LeftWrist => Joint::RightWrist,
            Joint::RightWrist => Joint::LeftWrist,
            Joint::LeftHip => Joint::RightHip,
            Joint::RightHip => Joint::LeftHip,
            Joint::LeftKnee => Joint::RightKnee,
            Joint::RightKnee => Joint::LeftKnee,
            Joint::LeftAnkle => Joint::RightAnkle,
            Joint::RightAnkle => Joint::LeftAnkle,
        }
    }
}

impl std::fmt::Display for Joint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A single joint position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
    /// Detection score, when the estimator provides one.
    pub confidence: Option<f32>,
}

impl Keypoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            confidence: None,
        }
    }

    pub fn with_confidence(x: f64, y: f64, confidence: f32) -> Self {
        Self {
            x,
            y,
            confidence: Some(confidence),
        }
    }

    /// Vector from `origin` to this point.
    pub fn offset_from(&self, origin: &Keypoint) -> (f64, f64) {
        (self.x - origin.x, self.y - origin.y)
    }
}

/// The joints detected for one person in one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeypointSet {
    points: [Option<Keypoint>; Joint::COUNT],
}

impl KeypointSet {
    /// Creates an empty set (no joints detected).
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from `(joint, keypoint)` pairs.  Later duplicates win.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (Joint, Keypoint)>,
    {
        let mut set = Self::new();
        for (joint, kp) in pairs {
            set.insert(joint, kp);
        }
        set
    }

    pub fn insert(&mut self, joint: Joint, keypoint: Keypoint) {
        self.points[joint.index()] = Some(keypoint);
    }

    pub fn remove(&mut self, joint: Joint) -> Option<Keypoint> {
        self.points[joint.index()].take()
    }

    pub fn get(&self, joint: Joint) -> Option<&Keypoint> {
        self.points[joint.index()].as_ref()
    }

    pub fn contains(&self, joint: Joint) -> bool {
        self.points[joint.index()].is_some()
    }

    /// Number of joints present.
    pub fn len(&self) -> usize {
        self.points.iter().filter(|p| p.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.points.iter().all(Option::is_none)
    }

    /// Iterates over present joints in model order.
    pub fn iter(&self) -> impl Iterator<Item = (Joint, &Keypoint)> {
        Joint::ALL
            .iter()
            .zip(self.points.iter())
            .filter_map(|(j, p)| p.as_ref().map(|kp| (*j, kp)))
    }

    /// Midpoint of two joints, or `None` if either is missing.
    pub fn midpoint(&self, a: Joint, b: Joint) -> Option<(f64, f64)> {
        let pa = self.get(a)?;
        let pb = self.get(b)?;
        Some(((pa.x + pb.x) / 2.0, (pa.y + pb.y) / 2.0))
    }

    /// Returns a copy with every left/right pair swapped.
    ///
    /// The preview shown to the user is horizontally flipped while the model
    /// sees the raw frame, so the model's "left" is the user's right.  After
    /// this swap `LeftWrist` always denotes the user's physical left hand.
    /// Coordinates are not changed.
    pub fn mirrored(&self) -> Self {
        let mut out = Self::new();
        for (joint, kp) in self.iter() {
            out.insert(joint.mirror(), *kp);
        }
        out
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
