//! Authored gesture templates and classification results.
//!
//! A template stores, for a handful of "core" joints, the vector from a base
//! joint to that core joint as it looked when the gesture was recorded.  The
//! classifier compares a live pose against that reference with cosine
//! similarity (see [`crate::domain::classifier`]).
//!
//! Templates are authored and persisted elsewhere.  This module only defines
//! the fields the classifier reads, plus validation so that a malformed file
//! is rejected at load time instead of silently never matching.
//!
//! # Example template (JSON)
//!
//! ```json
//! {
//!   "name": "RightHandUp",
//!   "index": 5,
//!   "base_joint": "right_shoulder",
//!   "core_joints": ["right_elbow", "right_wrist"],
//!   "reference_vector": { "right_elbow": [10.0, -60.0], "right_wrist": [15.0, -150.0] },
//!   "similarity_threshold": 0.95,
//!   "fov": "standard",
//!   "keys": ["i"]
//! }
//! ```
//!
//! The field names written by the pose-recording tool (`basekeypoints`,
//! `list_corekeypoints`, `value_dict`, `inner_flag`) are accepted as aliases.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::keypoint::Joint;

/// Stable identity of a gesture.  Mapping rules refer to gestures by index.
pub type GestureIndex = u32;

/// Errors found while validating templates.
#[derive(Debug, Error, PartialEq)]
pub enum TemplateError {
    /// The similarity threshold is outside `(0, 1]`.
    #[error("template '{name}': similarity threshold {value} is outside (0, 1]")]
    InvalidThreshold { name: String, value: f64 },

    /// A core joint has no reference vector.
    #[error("template '{name}': no reference vector for core joint '{joint}'")]
    MissingReference { name: String, joint: Joint },

    /// A non-internal template lists no core joints.
    #[error("template '{name}': core joint list is empty")]
    EmptyCoreJoints { name: String },

    /// Two templates share the same index.
    #[error("gesture index {index} is used by both '{first}' and '{second}'")]
    DuplicateIndex {
        index: GestureIndex,
        first: String,
        second: String,
    },
}

/// Horizontal field-of-view class of the camera a template was authored with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FovTag {
    /// ~45° lenses (telephoto webcams).
    Narrow,
    /// ~62° lenses (typical USB webcams, IMX219 standard module).
    #[default]
    Standard,
    /// ~90° lenses.
    Wide,
    /// ~120° lenses (fisheye-style IMX219 variants).
    UltraWide,
}

impl FovTag {
    /// Nominal horizontal field of view in degrees.
    pub fn horizontal_degrees(self) -> f64 {
        match self {
            FovTag::Narrow => 45.0,
            FovTag::Standard => 62.2,
            FovTag::Wide => 90.0,
            FovTag::UltraWide => 120.0,
        }
    }

    /// Factor applied to observed x-components when a template authored with
    /// `authoring` is evaluated on a camera tagged `current`.
    ///
    /// Equal to `tan(current / 2) / tan(authoring / 2)`, and exactly `1.0`
    /// when both tags are the same.
    pub fn x_correction(authoring: FovTag, current: FovTag) -> f64 {
        if authoring == current {
            return 1.0;
        }
        let half = |tag: FovTag| (tag.horizontal_degrees() / 2.0).to_radians().tan();
        half(current) / half(authoring)
    }
}

/// An authored reference gesture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureTemplate {
    pub name: String,
    pub index: GestureIndex,
    #[serde(alias = "basekeypoints")]
    pub base_joint: Joint,
    /// Joints compared against the reference, in concatenation order.
    #[serde(alias = "list_corekeypoints")]
    pub core_joints: Vec<Joint>,
    /// `(dx, dy)` of each core joint relative to `base_joint`.
    #[serde(alias = "value_dict")]
    pub reference_vector: BTreeMap<Joint, [f64; 2]>,
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    #[serde(default, alias = "camera_fov")]
    pub fov: FovTag,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Exists only to switch on a derived detector (lean/turn).
    #[serde(default, alias = "inner_flag")]
    pub internal: bool,
    /// Symbols emitted while this gesture alone is active.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<String>,
}

fn default_similarity_threshold() -> f64 {
    0.95
}

fn default_true() -> bool {
    true
}

impl GestureTemplate {
    /// Checks the invariants the classifier relies on.
    ///
    /// # Errors
    ///
    /// Returns the first [`TemplateError`] found.
    pub fn validate(&self) -> Result<(), TemplateError> {
        if !(self.similarity_threshold > 0.0 && self.similarity_threshold <= 1.0) {
            return Err(TemplateError::InvalidThreshold {
                name: self.name.clone(),
                value: self.similarity_threshold,
            });
        }
        if self.internal {
            return Ok(());
        }
        if self.core_joints.is_empty() {
            return Err(TemplateError::EmptyCoreJoints {
                name: self.name.clone(),
            });
        }
        if let Some(joint) = self
            .core_joints
            .iter()
            .find(|j| !self.reference_vector.contains_key(j))
        {
            return Err(TemplateError::MissingReference {
                name: self.name.clone(),
                joint: *joint,
            });
        }
        Ok(())
    }
}

/// Validates every template and checks that indices are unique.
///
/// # Errors
///
/// Returns the first [`TemplateError`] found, in template order.
pub fn validate_templates(templates: &[GestureTemplate]) -> Result<(), TemplateError> {
    let mut seen: HashMap<GestureIndex, &str> = HashMap::with_capacity(templates.len());
    for t in templates {
        t.validate()?;
        if let Some(first) = seen.insert(t.index, &t.name) {
            return Err(TemplateError::DuplicateIndex {
                index: t.index,
                first: first.to_string(),
                second: t.name.clone(),
            });
        }
    }
    Ok(())
}

/// One gesture recognised in one frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GestureMatch {
    pub index: GestureIndex,
    pub name: String,
}

impl GestureMatch {
    pub fn new(index: GestureIndex, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
