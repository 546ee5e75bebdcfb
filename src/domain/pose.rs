//! Robot pose as a mapping from named joints to scalar positions.
//!
//! Poses are immutable value types: every operation that changes joint
//! positions constructs a new `Pose`, so no aliasing occurs across control
//! loop iterations. The joint key set is fixed and identical across all
//! poses that are compared or combined (home pose, observed pose,
//! commanded pose).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A named-joint-to-position mapping describing one arm configuration.
///
/// Positions are in robot units (degrees or normalized, depending on the
/// driver). `BTreeMap` keeps joint iteration order deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pose {
    joints: BTreeMap<String, f64>,
}

impl Pose {
    /// Create an empty pose.
    pub fn new() -> Self {
        Self {
            joints: BTreeMap::new(),
        }
    }

    /// Get the position of a joint, if present.
    pub fn get(&self, joint: &str) -> Option<f64> {
        self.joints.get(joint).copied()
    }

    /// Iterate over (joint, position) pairs in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.joints.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Joint names in deterministic order.
    pub fn joint_names(&self) -> impl Iterator<Item = &str> {
        self.joints.keys().map(String::as_str)
    }

    /// Number of joints.
    pub fn len(&self) -> usize {
        self.joints.len()
    }

    /// Whether the pose has no joints.
    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    /// Whether every joint of `target` is within `tolerance` of this pose.
    ///
    /// Returns `false` if any target joint is missing from this pose.
    pub fn is_within(&self, target: &Pose, tolerance: f64) -> bool {
        target.iter().all(|(joint, target_value)| {
            self.get(joint)
                .is_some_and(|current| (current - target_value).abs() <= tolerance)
        })
    }

    /// Largest per-joint distance between this pose and `target`.
    ///
    /// Returns `None` if any target joint is missing from this pose.
    pub fn max_joint_distance(&self, target: &Pose) -> Option<f64> {
        let mut max = 0.0_f64;
        for (joint, target_value) in target.iter() {
            let current = self.get(joint)?;
            max = max.max((current - target_value).abs());
        }
        Some(max)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::new()
    }
}

impl From<BTreeMap<String, f64>> for Pose {
    fn from(joints: BTreeMap<String, f64>) -> Self {
        Self { joints }
    }
}

impl FromIterator<(String, f64)> for Pose {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            joints: iter.into_iter().collect(),
        }
    }
}

impl<'a> FromIterator<(&'a str, f64)> for Pose {
    fn from_iter<I: IntoIterator<Item = (&'a str, f64)>>(iter: I) -> Self {
        Self {
            joints: iter.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        }
    }
}
