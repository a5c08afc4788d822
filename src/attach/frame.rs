//! Coordinate frame conversion
//!
//! Pure math for moving a pose between world space and the local space of a
//! parent whose world matrix is known. No state, no failure modes: the
//! parent matrix must be invertible and up to date; refreshing it is the
//! caller's job.
//!
//! ```rust,ignore
//! let local = frame::to_local(world_pose, &bone_world);
//! assert!(frame::to_world(local, &bone_world).abs_diff_eq(world_pose, 1e-5));
//! ```

use glam::{Affine3A, EulerRot, Quat, Vec3};

/// Decomposed translation / rotation / scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Pose {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    #[must_use]
    pub const fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    #[must_use]
    pub fn from_affine(matrix: &Affine3A) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self {
            translation,
            rotation,
            scale,
        }
    }

    #[must_use]
    pub fn to_affine(&self) -> Affine3A {
        Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    /// Component-wise comparison. Rotations are compared up to sign since
    /// `q` and `-q` describe the same orientation.
    #[must_use]
    pub fn abs_diff_eq(&self, other: Self, max_abs_diff: f32) -> bool {
        self.translation.abs_diff_eq(other.translation, max_abs_diff)
            && self.scale.abs_diff_eq(other.scale, max_abs_diff)
            && (self.rotation.abs_diff_eq(other.rotation, max_abs_diff)
                || self.rotation.abs_diff_eq(-other.rotation, max_abs_diff))
    }
}

/// Local pose under a parent → world pose.
#[must_use]
pub fn to_world(local: Pose, parent_world: &Affine3A) -> Pose {
    Pose::from_affine(&(*parent_world * local.to_affine()))
}

/// World pose → local pose under a parent.
#[must_use]
pub fn to_local(world: Pose, parent_world: &Affine3A) -> Pose {
    to_local_with_inverse(world, &parent_world.inverse())
}

/// [`to_local`] with a precomputed parent inverse.
#[must_use]
pub fn to_local_with_inverse(world: Pose, parent_inverse: &Affine3A) -> Pose {
    Pose::from_affine(&(*parent_inverse * world.to_affine()))
}

/// Euler angles (XYZ order, radians) → quaternion.
#[inline]
#[must_use]
pub fn quat_from_euler(euler: Vec3) -> Quat {
    Quat::from_euler(EulerRot::XYZ, euler.x, euler.y, euler.z)
}

/// Quaternion → Euler angles (XYZ order, radians).
#[inline]
#[must_use]
pub fn euler_from_quat(rotation: Quat) -> Vec3 {
    let (x, y, z) = rotation.to_euler(EulerRot::XYZ);
    Vec3::new(x, y, z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn identity_parent_is_noop() {
        let pose = Pose::new(Vec3::new(1.0, 2.0, 3.0), Quat::from_rotation_z(0.4), Vec3::splat(2.0));
        assert!(to_local(pose, &Affine3A::IDENTITY).abs_diff_eq(pose, 1e-6));
        assert!(to_world(pose, &Affine3A::IDENTITY).abs_diff_eq(pose, 1e-6));
    }

    #[test]
    fn translated_parent_offsets_position() {
        let parent = Affine3A::from_translation(Vec3::new(10.0, 0.0, 0.0));
        let world = Pose::new(Vec3::new(12.0, 1.0, 0.0), Quat::IDENTITY, Vec3::ONE);
        let local = to_local(world, &parent);
        assert!(local.translation.abs_diff_eq(Vec3::new(2.0, 1.0, 0.0), 1e-6));
    }

    #[test]
    fn rotated_parent_rotates_position() {
        let parent = Affine3A::from_rotation_y(FRAC_PI_2);
        let local = Pose::new(Vec3::X, Quat::IDENTITY, Vec3::ONE);
        let world = to_world(local, &parent);
        assert!(world.translation.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), 1e-6));
    }

    #[test]
    fn euler_roundtrip() {
        let euler = Vec3::new(0.3, -0.7, 1.2);
        assert!(euler_from_quat(quat_from_euler(euler)).abs_diff_eq(euler, 1e-5));
    }
}
