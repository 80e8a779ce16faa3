//! Geometric pose classification.
//!
//! # How a template is matched (for beginners)
//!
//! For every enabled, non-internal template the classifier builds two flat
//! vectors of equal length:
//!
//! - `v_template`: the authored `(dx, dy)` of each core joint relative to the
//!   base joint, concatenated in core-joint order.
//! - `v_observed`: the same offsets measured on the live pose.
//!
//! Their cosine similarity is `1.0` when the two poses have exactly the same
//! shape, regardless of how far the person stands from the camera (distance
//! only scales the vector, and cosine similarity ignores length).  A template
//! matches when the similarity reaches its `similarity_threshold`.
//!
//! When the template was authored with a different lens than the one in use,
//! observed x-components are first scaled by
//! [`FovTag::x_correction`] to undo the horizontal foreshortening.
//!
//! # Derived detectors
//!
//! Leaning and turning are hard to express as a fixed set of joint offsets,
//! so they are measured from body-axis angles instead.  They run only when
//! the corresponding `internal` templates exist and are enabled; the emitted
//! match carries that template's index and name.
//!
//! # Missing joints
//!
//! A template or detector whose joints are not all present is skipped.  The
//! rest of the pass carries on.

use tracing::debug;

use crate::domain::keypoint::{Joint, KeypointSet};
use crate::domain::template::{FovTag, GestureMatch, GestureTemplate};

/// Tilt of the torso away from vertical, in degrees, above which a lean is reported.
pub const DEFAULT_LEAN_THRESHOLD_DEG: f64 = 10.0;

/// Bend between head axis and torso axis, in degrees, above which a turn is reported.
pub const DEFAULT_TURN_THRESHOLD_DEG: f64 = 15.0;

/// Derived gestures recognised by template name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DerivedGesture {
    LeftLean,
    RightLean,
    LeftTurn,
    RightTurn,
}

impl DerivedGesture {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "LeftLean" => Some(Self::LeftLean),
            "RightLean" => Some(Self::RightLean),
            "LeftTurn" => Some(Self::LeftTurn),
            "RightTurn" => Some(Self::RightTurn),
            _ => None,
        }
    }
}

/// The enabled internal templates that gate the derived detectors.
#[derive(Default)]
struct DerivedGates<'a> {
    left_lean: Option<&'a GestureTemplate>,
    right_lean: Option<&'a GestureTemplate>,
    left_turn: Option<&'a GestureTemplate>,
    right_turn: Option<&'a GestureTemplate>,
}

impl<'a> DerivedGates<'a> {
    fn collect(templates: &'a [GestureTemplate]) -> Self {
        let mut gates = Self::default();
        for t in templates.iter().filter(|t| t.internal && t.enabled) {
            let slot = match DerivedGesture::from_name(&t.name) {
                Some(DerivedGesture::LeftLean) => &mut gates.left_lean,
                Some(DerivedGesture::RightLean) => &mut gates.right_lean,
                Some(DerivedGesture::LeftTurn) => &mut gates.left_turn,
                Some(DerivedGesture::RightTurn) => &mut gates.right_turn,
                None => continue,
            };
            slot.get_or_insert(t);
        }
        gates
    }
}

/// Stateless classifier turning a keypoint set into gesture matches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseClassifier {
    pub lean_threshold_deg: f64,
    pub turn_threshold_deg: f64,
}

impl Default for PoseClassifier {
    fn default() -> Self {
        Self {
            lean_threshold_deg: DEFAULT_LEAN_THRESHOLD_DEG,
            turn_threshold_deg: DEFAULT_TURN_THRESHOLD_DEG,
        }
    }
}

impl PoseClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs one classification pass.
    ///
    /// `keypoints` must already be mirror-corrected.  Matches are returned in
    /// template order, followed by lean and then turn detections.
    pub fn classify(
        &self,
        templates: &[GestureTemplate],
        keypoints: &KeypointSet,
        camera_fov: FovTag,
    ) -> Vec<GestureMatch> {
        let mut matches = Vec::new();

        for t in templates.iter().filter(|t| t.enabled && !t.internal) {
            match template_similarity(t, keypoints, camera_fov) {
                Some(similarity) if similarity >= t.similarity_threshold => {
                    matches.push(GestureMatch::new(t.index, t.name.clone()));
                }
                Some(_) => {}
                None => debug!("template '{}' skipped: required joint missing", t.name),
            }
        }

        let gates = DerivedGates::collect(templates);

        if let (Some(left), Some(right)) = (gates.left_lean, gates.right_lean) {
            match torso_lean(keypoints) {
                Some((tilt, dx)) if tilt > self.lean_threshold_deg => {
                    if dx < 0.0 {
                        matches.push(GestureMatch::new(left.index, left.name.clone()));
                    } else if dx > 0.0 {
                        matches.push(GestureMatch::new(right.index, right.name.clone()));
                    }
                }
                Some(_) => {}
                None => debug!("lean detector skipped: shoulder or hip missing"),
            }
        }

        if gates.left_turn.is_some() || gates.right_turn.is_some() {
            match body_turn(keypoints) {
                Some(diff) if diff > self.turn_threshold_deg => {
                    if let Some(t) = gates.right_turn {
                        matches.push(GestureMatch::new(t.index, t.name.clone()));
                    }
                }
                Some(diff) if diff < -self.turn_threshold_deg => {
                    if let Some(t) = gates.left_turn {
                        matches.push(GestureMatch::new(t.index, t.name.clone()));
                    }
                }
                Some(_) => {}
                None => debug!("turn detector skipped: eye, shoulder or hip missing"),
            }
        }

        matches
    }
}

/// Cosine similarity between `template` and the observed pose.
///
/// Returns `None` when the base joint, a core joint, or a reference vector is
/// missing.
pub fn template_similarity(
    template: &GestureTemplate,
    keypoints: &KeypointSet,
    camera_fov: FovTag,
) -> Option<f64> {
    let base = keypoints.get(template.base_joint)?;
    let x_scale = FovTag::x_correction(template.fov, camera_fov);

    let n = template.core_joints.len() * 2;
    let mut v_template = Vec::with_capacity(n);
    let mut v_observed = Vec::with_capacity(n);

    for joint in &template.core_joints {
        let [rx, ry] = *template.reference_vector.get(joint)?;
        let (dx, dy) = keypoints.get(*joint)?.offset_from(base);
        v_template.extend_from_slice(&[rx, ry]);
        v_observed.extend_from_slice(&[dx * x_scale, dy]);
    }

    Some(cosine_similarity(&v_template, &v_observed))
}

/// `dot(a, b) / (|a| * |b|)`, or `0.0` when either vector has zero length.
///
/// Identical vectors yield exactly `1.0`.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    // A single sqrt of the product keeps `a == b` at exactly 1.0.
    (dot / (norm_a * norm_b).sqrt()).clamp(-1.0, 1.0)
}

/// Torso tilt from vertical in degrees, plus the horizontal component of the
/// hip-midpoint → shoulder-midpoint vector.
pub fn torso_lean(keypoints: &KeypointSet) -> Option<(f64, f64)> {
    let (sx, sy) = keypoints.midpoint(Joint::LeftShoulder, Joint::RightShoulder)?;
    let (hx, hy) = keypoints.midpoint(Joint::LeftHip, Joint::RightHip)?;
    let (dx, dy) = (sx - hx, sy - hy);
    // Image y grows downwards, so an upright torso points at -90°.
    let angle = dy.atan2(dx).to_degrees();
    Some(((angle + 90.0).abs(), dx))
}

/// Signed angle in degrees between the head axis (eye midpoint → shoulder
/// midpoint) and the torso axis (shoulder midpoint → hip midpoint),
/// normalised to `(-180, 180]`.  Positive values are a turn to the right.
pub fn body_turn(keypoints: &KeypointSet) -> Option<f64> {
    let (ex, ey) = keypoints.midpoint(Joint::LeftEye, Joint::RightEye)?;
    let (sx, sy) = keypoints.midpoint(Joint::LeftShoulder, Joint::RightShoulder)?;
    let (hx, hy) = keypoints.midpoint(Joint::LeftHip, Joint::RightHip)?;

    let head = (sy - ey).atan2(sx - ex);
    let torso = (hy - sy).atan2(hx - sx);
    Some(normalize_degrees((torso - head).to_degrees()))
}

fn normalize_degrees(deg: f64) -> f64 {
    let d = deg % 360.0;
    if d > 180.0 {
        d - 360.0
    } else if d <= -180.0 {
        d + 360.0
    } else {
        d
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
