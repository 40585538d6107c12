//! Target probe: decides whether a pose "refers to" the target object.
//!
//! A frame counts as target-referring when a ray cast from any bone in a
//! fixed checklist intersects the target's collider. The head casts along
//! its forward axis; hands and fingertips cast along their lateral axis.
//! The predicate is pure and has no memory of past frames.

use glam::Vec3;

use crate::rig::{Bone, PoseRig};

/// A ray defined by an origin point and a direction vector.
///
/// The direction does not need to be normalized, but must be non-zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub const fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Returns the point along the ray at parameter `t`.
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// The aiming target: a movable object with an axis-aligned box collider.
#[derive(Debug, Clone, Copy)]
pub struct TargetObject {
    pub position: Vec3,
    half_extents: Vec3,
}

impl TargetObject {
    /// A target with a uniform-scale box collider centered on `position`.
    pub fn new(position: Vec3, scale: f32) -> Self {
        Self {
            position,
            half_extents: Vec3::splat(scale * 0.5),
        }
    }

    pub fn half_extents(&self) -> Vec3 {
        self.half_extents
    }

    /// Slab test: does the (infinite, forward-only) ray hit the collider?
    pub fn intersects(&self, ray: &Ray) -> bool {
        let min = self.position - self.half_extents;
        let max = self.position + self.half_extents;

        let mut t_min = 0.0f32;
        let mut t_max = f32::INFINITY;

        for axis in 0..3 {
            let origin = ray.origin[axis];
            let dir = ray.direction[axis];

            if dir.abs() < f32::EPSILON {
                // Parallel to this slab; must already lie inside it.
                if origin < min[axis] || origin > max[axis] {
                    return false;
                }
            } else {
                let inv = 1.0 / dir;
                let mut t0 = (min[axis] - origin) * inv;
                let mut t1 = (max[axis] - origin) * inv;
                if t0 > t1 {
                    std::mem::swap(&mut t0, &mut t1);
                }
                t_min = t_min.max(t0);
                t_max = t_max.min(t1);
                if t_min > t_max {
                    return false;
                }
            }
        }
        true
    }
}

/// The ordered bone checklist probed each frame.
pub const BONE_CHECKLIST: [Bone; 13] = [
    Bone::Head,
    Bone::LeftHand,
    Bone::RightHand,
    Bone::LeftThumbDistal,
    Bone::RightThumbDistal,
    Bone::LeftIndexDistal,
    Bone::RightIndexDistal,
    Bone::LeftMiddleDistal,
    Bone::RightMiddleDistal,
    Bone::LeftRingDistal,
    Bone::RightRingDistal,
    Bone::LeftLittleDistal,
    Bone::RightLittleDistal,
];

/// The probe ray for one bone in the rig's current pose.
pub fn bone_ray<R: PoseRig + ?Sized>(rig: &R, bone: Bone) -> Option<Ray> {
    let transform = rig.bone_transform(bone)?;
    let direction = if bone == Bone::Head {
        transform.forward()
    } else {
        transform.right()
    };
    Some(Ray::new(transform.position, direction))
}

/// True when at least one checklist bone's ray intersects the target.
///
/// Short-circuits on the first hit; bone order never changes the boolean
/// result. Bones the rig cannot resolve are skipped.
pub fn refers_to_target<R: PoseRig + ?Sized>(rig: &R, target: &TargetObject) -> bool {
    for bone in BONE_CHECKLIST {
        let Some(ray) = bone_ray(rig, bone) else {
            continue;
        };
        if target.intersects(&ray) {
            log::trace!("probe hit from {}", bone.as_str());
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessRig;
    use crate::rig::Transform;
    use glam::Quat;

    #[test]
    fn test_ray_point_at() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0));
        assert!((ray.point_at(3.0) - Vec3::new(6.0, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_ray_hits_box_ahead() {
        let target = TargetObject::new(Vec3::new(0.0, 0.0, 5.0), 1.0);
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        assert!(target.intersects(&ray));
    }

    #[test]
    fn test_ray_misses_box_behind_origin() {
        let target = TargetObject::new(Vec3::new(0.0, 0.0, -5.0), 1.0);
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        assert!(!target.intersects(&ray));
    }

    #[test]
    fn test_axis_parallel_ray_outside_slab_misses() {
        let target = TargetObject::new(Vec3::new(0.0, 3.0, 5.0), 1.0);
        // Travels along +Z at y=0, forever below the box.
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        assert!(!target.intersects(&ray));
    }

    #[test]
    fn test_origin_inside_box_hits() {
        let target = TargetObject::new(Vec3::ZERO, 2.0);
        let ray = Ray::new(Vec3::new(0.1, 0.1, 0.1), Vec3::X);
        assert!(target.intersects(&ray));
    }

    #[test]
    fn test_unnormalized_direction_is_equivalent() {
        let target = TargetObject::new(Vec3::new(0.0, 0.0, 7.0), 1.0);
        let unit = Ray::new(Vec3::ZERO, Vec3::Z);
        let scaled = Ray::new(Vec3::ZERO, Vec3::Z * 40.0);
        assert_eq!(target.intersects(&unit), target.intersects(&scaled));
    }

    #[test]
    fn test_head_ray_uses_forward_axis() {
        let rig = HeadlessRig::default();
        // Head forward is +Z for an unrotated rig: a target straight ahead
        // of the head should be hit, one behind should not.
        let head = rig.bone_transform(Bone::Head).unwrap().position;

        let ahead = TargetObject::new(head + Vec3::Z * 4.0, 1.0);
        let behind = TargetObject::new(head - Vec3::Z * 4.0, 1.0);

        assert!(refers_to_target(&rig, &ahead));
        assert!(!refers_to_target(&rig, &behind));
    }

    #[test]
    fn test_hand_ray_uses_lateral_axis() {
        let rig = HeadlessRig::default();
        let hand = rig.bone_transform(Bone::RightHand).unwrap().position;

        // Directly to the avatar's right of the hand, well above the head
        // forward ray and away from the left-side bones.
        let lateral = TargetObject::new(hand + Vec3::X * 3.0, 0.4);
        assert!(refers_to_target(&rig, &lateral));
    }

    #[test]
    fn test_no_bone_hits_returns_false() {
        let rig = HeadlessRig::default();
        // Far underground: no forward or lateral ray can reach it.
        let target = TargetObject::new(Vec3::new(0.0, -50.0, 0.0), 1.0);
        assert!(!refers_to_target(&rig, &target));
    }

    #[test]
    fn test_yawed_avatar_tracks_target() {
        let mut rig = HeadlessRig::default();
        let head_height = rig.bone_transform(Bone::Head).unwrap().position.y;

        // Target on the +X side; an unrotated head (facing +Z) misses it
        // with its forward ray, but the right hand's lateral ray hits.
        // After a quarter turn the head faces +X instead.
        let target = TargetObject::new(Vec3::new(6.0, head_height, 0.0), 0.5);
        rig.set_root_transform(Transform::new(
            Vec3::ZERO,
            Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
        ));
        assert!(refers_to_target(&rig, &target));
    }
}
