//! Ray picking
//!
//! Rays are tested against world-space bounding spheres of mesh nodes. This
//! is coarse on purpose: the editor only needs to know *which object* was
//! clicked, not the exact triangle.

use glam::Vec3;

use crate::resources::geometry::BoundingSphere;
use crate::scene::NodeHandle;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Normalized direction
    pub direction: Vec3,
}

impl Ray {
    #[must_use]
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Distance along the ray to the first point inside `sphere`.
    ///
    /// Returns `0.0` if the origin is already inside, `None` on a miss or if
    /// the sphere is entirely behind the origin.
    #[must_use]
    pub fn intersect_sphere(&self, sphere: &BoundingSphere) -> Option<f32> {
        let to_center = sphere.center - self.origin;
        let r2 = sphere.radius * sphere.radius;
        let dist_sq = to_center.length_squared();
        if dist_sq <= r2 {
            return Some(0.0);
        }

        let tca = to_center.dot(self.direction);
        if tca < 0.0 {
            return None;
        }
        let d2 = dist_sq - tca * tca;
        if d2 > r2 {
            return None;
        }
        Some(tca - (r2 - d2).sqrt())
    }

    #[inline]
    #[must_use]
    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

/// A picked object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    /// The mesh node that was hit, or its group ancestor
    pub node: NodeHandle,
    pub distance: f32,
    /// World-space hit point
    pub point: Vec3,
}
