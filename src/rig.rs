//! Pose and transform model, plus the `PoseRig` capability trait.
//!
//! The replay engine never talks to a concrete animation backend. Anything
//! that can report a parameter count, get/set a humanoid pose, expose its
//! root transform, and resolve a bone's world transform satisfies
//! [`PoseRig`] and can host a replay.

use glam::{Quat, Vec3};

/// A rigid transform: position plus orientation, unit scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Transform a point from local space into world space.
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.position + self.rotation * point
    }

    /// Transform a world-space point into this transform's local space.
    pub fn inverse_transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation.inverse() * (point - self.position)
    }

    /// The transform's forward (+Z) axis in world space.
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    /// The transform's right (+X) axis in world space.
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Compose with a child transform (`self` applied after `child`).
    pub fn mul_transform(&self, child: &Transform) -> Transform {
        Transform {
            position: self.transform_point(child.position),
            rotation: self.rotation * child.rotation,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// A humanoid pose: body placement plus the muscle-parameter vector.
///
/// `muscles` always has length equal to the rig's parameter count, in the
/// rig's canonical parameter order.
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    pub body_position: Vec3,
    pub body_rotation: Quat,
    pub muscles: Vec<f32>,
}

impl Pose {
    /// A rest pose with all muscle values at zero.
    pub fn rest(muscle_count: usize) -> Self {
        Self {
            body_position: Vec3::ZERO,
            body_rotation: Quat::IDENTITY,
            muscles: vec![0.0; muscle_count],
        }
    }
}

/// The skeletal bones consulted by the target probe.
///
/// Head rays are cast along the bone's forward axis; every other bone casts
/// along its lateral (right) axis, matching how an outstretched finger
/// points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bone {
    Head,
    LeftHand,
    RightHand,
    LeftThumbDistal,
    RightThumbDistal,
    LeftIndexDistal,
    RightIndexDistal,
    LeftMiddleDistal,
    RightMiddleDistal,
    LeftRingDistal,
    RightRingDistal,
    LeftLittleDistal,
    RightLittleDistal,
}

impl Bone {
    /// String representation for logs and diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Head => "head",
            Self::LeftHand => "left-hand",
            Self::RightHand => "right-hand",
            Self::LeftThumbDistal => "left-thumb-distal",
            Self::RightThumbDistal => "right-thumb-distal",
            Self::LeftIndexDistal => "left-index-distal",
            Self::RightIndexDistal => "right-index-distal",
            Self::LeftMiddleDistal => "left-middle-distal",
            Self::RightMiddleDistal => "right-middle-distal",
            Self::LeftRingDistal => "left-ring-distal",
            Self::RightRingDistal => "right-ring-distal",
            Self::LeftLittleDistal => "left-little-distal",
            Self::RightLittleDistal => "right-little-distal",
        }
    }
}

/// A full snapshot of rig state, used to restore the avatar after a trial.
#[derive(Debug, Clone)]
pub struct RigSnapshot {
    pub root: Transform,
    pub pose: Pose,
}

/// Capability interface over the host animation backend.
///
/// Position convention: body positions *returned* by [`PoseRig::pose`] are
/// expressed in world space, while body positions *passed* to
/// [`PoseRig::set_pose`] are interpreted in the avatar's root-local frame.
/// The replay engine's trial setup depends on this: it repositions the
/// avatar first, re-reads the pose, and only then re-expresses the captured
/// position locally. Implementations must keep both directions consistent
/// with their own root transform.
pub trait PoseRig {
    /// Number of muscle parameters in this rig's pose vector.
    fn muscle_count(&self) -> usize;

    /// The current pose. Body position is world-space.
    fn pose(&self) -> Pose;

    /// Apply a pose. Body position is root-local.
    fn set_pose(&mut self, pose: &Pose);

    /// The avatar's root transform in world space.
    fn root_transform(&self) -> Transform;

    /// Move the avatar's root transform.
    fn set_root_transform(&mut self, transform: Transform);

    /// World transform of a named bone, or `None` if the rig lacks it.
    fn bone_transform(&self, bone: Bone) -> Option<Transform>;

    /// Capture the rig's current state for later restoration.
    fn snapshot(&self) -> RigSnapshot {
        RigSnapshot {
            root: self.root_transform(),
            pose: self.pose(),
        }
    }

    /// Restore a previously captured state.
    fn restore(&mut self, snapshot: &RigSnapshot) {
        self.set_root_transform(snapshot.root);
        self.set_pose(&snapshot.pose);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_transform_point_round_trip() {
        let t = Transform::new(Vec3::new(1.0, 2.0, 3.0), Quat::from_rotation_y(0.7));
        let p = Vec3::new(-0.5, 1.5, 4.0);

        let world = t.transform_point(p);
        let back = t.inverse_transform_point(world);
        assert!((back - p).length() < 1e-5);
    }

    #[test]
    fn test_identity_transform_is_noop() {
        let p = Vec3::new(3.0, -1.0, 0.25);
        assert_eq!(Transform::IDENTITY.transform_point(p), p);
        assert_eq!(Transform::IDENTITY.inverse_transform_point(p), p);
    }

    #[test]
    fn test_forward_and_right_axes() {
        let t = Transform::new(Vec3::ZERO, Quat::from_rotation_y(FRAC_PI_2));
        // Yaw of +90 degrees turns +Z into +X and +X into -Z.
        assert!((t.forward() - Vec3::X).length() < 1e-5);
        assert!((t.right() - (-Vec3::Z)).length() < 1e-5);
    }

    #[test]
    fn test_mul_transform_composes_translation() {
        let parent = Transform::new(Vec3::new(0.0, 1.0, 0.0), Quat::from_rotation_y(FRAC_PI_2));
        let child = Transform::new(Vec3::new(0.0, 0.0, 1.0), Quat::IDENTITY);

        let composed = parent.mul_transform(&child);
        // Child's +Z offset rotates into +X under the parent's yaw.
        assert!((composed.position - Vec3::new(1.0, 1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_rest_pose_length_matches_count() {
        let pose = Pose::rest(95);
        assert_eq!(pose.muscles.len(), 95);
        assert!(pose.muscles.iter().all(|m| *m == 0.0));
    }
}
