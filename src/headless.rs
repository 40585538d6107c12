//! A self-contained `PoseRig` backend with a fixed humanoid bone map.
//!
//! `HeadlessRig` lets the binary and the test suite run without a host
//! animation engine. It composes root and body transforms faithfully but
//! does not articulate joints from muscle values; joint solving belongs to
//! the embedding application's rig.

use glam::{Quat, Vec3};

use crate::rig::{Bone, Pose, PoseRig, Transform};

/// Number of muscle parameters in the standard humanoid description.
pub const HUMANOID_MUSCLE_COUNT: usize = 95;

/// Height of the body anchor (hips) above the ground at rest, in meters.
const REST_BODY_HEIGHT: f32 = 1.0;

/// Reference rig: fixed bone offsets, world/local pose bookkeeping.
pub struct HeadlessRig {
    muscle_count: usize,
    root: Transform,
    // Body placement stored root-local, matching the set_pose convention.
    body_position: Vec3,
    body_rotation: Quat,
    muscles: Vec<f32>,
}

impl HeadlessRig {
    pub fn new(muscle_count: usize) -> Self {
        Self {
            muscle_count,
            root: Transform::IDENTITY,
            body_position: Vec3::new(0.0, REST_BODY_HEIGHT, 0.0),
            body_rotation: Quat::IDENTITY,
            muscles: vec![0.0; muscle_count],
        }
    }

    /// Bone offset from the body anchor, in the body's local frame.
    fn bone_offset(bone: Bone) -> Vec3 {
        match bone {
            Bone::Head => Vec3::new(0.0, 0.65, 0.0),
            Bone::LeftHand => Vec3::new(-0.62, 0.35, 0.0),
            Bone::RightHand => Vec3::new(0.62, 0.35, 0.0),
            Bone::LeftThumbDistal => Vec3::new(-0.60, 0.33, 0.10),
            Bone::RightThumbDistal => Vec3::new(0.60, 0.33, 0.10),
            Bone::LeftIndexDistal => Vec3::new(-0.70, 0.35, 0.09),
            Bone::RightIndexDistal => Vec3::new(0.70, 0.35, 0.09),
            Bone::LeftMiddleDistal => Vec3::new(-0.71, 0.35, 0.04),
            Bone::RightMiddleDistal => Vec3::new(0.71, 0.35, 0.04),
            Bone::LeftRingDistal => Vec3::new(-0.70, 0.35, -0.01),
            Bone::RightRingDistal => Vec3::new(0.70, 0.35, -0.01),
            Bone::LeftLittleDistal => Vec3::new(-0.68, 0.35, -0.05),
            Bone::RightLittleDistal => Vec3::new(0.68, 0.35, -0.05),
        }
    }

    /// The body anchor's transform in world space.
    fn body_world(&self) -> Transform {
        self.root.mul_transform(&Transform::new(self.body_position, self.body_rotation))
    }
}

impl Default for HeadlessRig {
    fn default() -> Self {
        Self::new(HUMANOID_MUSCLE_COUNT)
    }
}

impl PoseRig for HeadlessRig {
    fn muscle_count(&self) -> usize {
        self.muscle_count
    }

    fn pose(&self) -> Pose {
        Pose {
            body_position: self.body_world().position,
            body_rotation: self.body_rotation,
            muscles: self.muscles.clone(),
        }
    }

    fn set_pose(&mut self, pose: &Pose) {
        self.body_position = pose.body_position;
        self.body_rotation = pose.body_rotation;
        self.muscles.clear();
        self.muscles.extend_from_slice(&pose.muscles);
        self.muscles.resize(self.muscle_count, 0.0);
    }

    fn root_transform(&self) -> Transform {
        self.root
    }

    fn set_root_transform(&mut self, transform: Transform) {
        self.root = transform;
    }

    fn bone_transform(&self, bone: Bone) -> Option<Transform> {
        let body = self.body_world();
        Some(Transform::new(
            body.transform_point(Self::bone_offset(bone)),
            body.rotation,
        ))
    }
}
