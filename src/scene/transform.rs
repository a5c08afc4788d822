use glam::{Affine3A, EulerRot, Quat, Vec3};

use crate::attach::frame::Pose;

/// Transform component
///
/// Wraps a node's position, rotation and scale (TRS) together with the
/// cached local/world matrices and the shadow state used for dirty checks.
#[derive(Debug, Clone)]
pub struct Transform {
    // === Public TRS ===
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,

    // === Matrix cache ===
    pub(crate) local_matrix: Affine3A,
    pub(crate) world_matrix: Affine3A,

    // === Dirty-check shadow state ===
    last_position: Vec3,
    last_rotation: Quat,
    last_scale: Vec3,
    force_update: bool,
}

impl Transform {
    #[must_use]
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,

            local_matrix: Affine3A::IDENTITY,
            world_matrix: Affine3A::IDENTITY,

            last_position: Vec3::ZERO,
            last_rotation: Quat::IDENTITY,
            last_scale: Vec3::ONE,
            force_update: true,
        }
    }

    // ========================================================================
    // Dirty-checked update
    // ========================================================================

    /// Recomputes the local matrix if TRS changed since the last call.
    ///
    /// Returns whether the matrix was rebuilt.
    pub fn update_local_matrix(&mut self) -> bool {
        let changed = self.position != self.last_position
            || self.rotation != self.last_rotation
            || self.scale != self.last_scale
            || self.force_update;

        if changed {
            self.local_matrix = self.compute_local_matrix();

            self.last_position = self.position;
            self.last_rotation = self.rotation;
            self.last_scale = self.scale;
            self.force_update = false;
        }

        changed
    }

    /// Builds the local matrix from the current TRS without touching the cache.
    #[inline]
    #[must_use]
    pub fn compute_local_matrix(&self) -> Affine3A {
        Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    // ========================================================================
    // Getters & Helpers
    // ========================================================================

    /// Sets rotation from Euler angles (XYZ order, radians).
    pub fn set_rotation_euler(&mut self, x: f32, y: f32, z: f32) {
        self.rotation = Quat::from_euler(EulerRot::XYZ, x, y, z);
    }

    /// Current rotation as Euler angles (XYZ order, radians).
    #[must_use]
    pub fn rotation_euler(&self) -> Vec3 {
        let (x, y, z) = self.rotation.to_euler(EulerRot::XYZ);
        Vec3::new(x, y, z)
    }

    /// Sets the same scale factor on all three axes.
    #[inline]
    pub fn set_uniform_scale(&mut self, s: f32) {
        self.scale = Vec3::splat(s);
    }

    /// Local TRS as a [`Pose`].
    #[inline]
    #[must_use]
    pub fn pose(&self) -> Pose {
        Pose::new(self.position, self.rotation, self.scale)
    }

    /// Overwrites TRS from a [`Pose`].
    #[inline]
    pub fn set_pose(&mut self, pose: Pose) {
        self.position = pose.translation;
        self.rotation = pose.rotation;
        self.scale = pose.scale;
    }

    /// Cached local matrix (as of the last [`update_local_matrix`](Self::update_local_matrix)).
    #[inline]
    #[must_use]
    pub fn local_matrix(&self) -> &Affine3A {
        &self.local_matrix
    }

    /// Cached world matrix.
    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.world_matrix
    }

    /// Written by the transform system after propagation.
    pub fn set_world_matrix(&mut self, mat: Affine3A) {
        self.world_matrix = mat;
    }

    /// Sets the local matrix directly and decomposes it back into TRS.
    ///
    /// Shear is lost in the decomposition.
    pub fn apply_local_matrix(&mut self, mat: Affine3A) {
        self.local_matrix = mat;

        let (scale, rotation, translation) = mat.to_scale_rotation_translation();
        self.scale = scale;
        self.rotation = rotation;
        self.position = translation;

        self.last_scale = scale;
        self.last_rotation = rotation;
        self.last_position = translation;

        self.mark_dirty();
    }

    /// Forces the next update to rebuild the matrices.
    pub fn mark_dirty(&mut self) {
        self.force_update = true;
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}
