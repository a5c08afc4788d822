use glam::{Affine3A, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    /// Transforms the sphere into another space.
    ///
    /// The radius is scaled by the largest axis scale so the result still
    /// encloses the geometry under non-uniform scale.
    #[must_use]
    pub fn transform(&self, matrix: &Affine3A) -> Self {
        let max_scale = matrix
            .matrix3
            .x_axis
            .length()
            .max(matrix.matrix3.y_axis.length())
            .max(matrix.matrix3.z_axis.length());
        Self {
            center: matrix.transform_point3(self.center),
            radius: self.radius * max_scale,
        }
    }
}

/// Vertex data of a mesh.
///
/// `Clone` is a deep copy: cloned meshes never share vertex storage with the
/// source asset.
#[derive(Debug, Clone, Default)]
pub struct Geometry {
    pub positions: Vec<Vec3>,
    pub bounding_box: Option<BoundingBox>,
    pub bounding_sphere: Option<BoundingSphere>,
}

impl Geometry {
    #[must_use]
    pub fn new(positions: Vec<Vec3>) -> Self {
        Self {
            positions,
            bounding_box: None,
            bounding_sphere: None,
        }
    }

    /// Computes the AABB and the bounding sphere.
    ///
    /// The sphere is centred on the AABB centre with the radius of the
    /// farthest vertex. Leaves both volumes untouched for empty geometry.
    pub fn compute_bounding_volume(&mut self) {
        if self.positions.is_empty() {
            return;
        }

        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for &p in &self.positions {
            min = min.min(p);
            max = max.max(p);
        }
        self.bounding_box = Some(BoundingBox { min, max });

        let center = (min + max) * 0.5;
        let max_dist_sq = self
            .positions
            .iter()
            .map(|p| p.distance_squared(center))
            .fold(0.0_f32, f32::max);

        self.bounding_sphere = Some(BoundingSphere {
            center,
            radius: max_dist_sq.sqrt(),
        });
    }

    /// Returns the bounding sphere, computing it on first use.
    pub fn bounding_sphere(&mut self) -> Option<BoundingSphere> {
        if self.bounding_sphere.is_none() {
            self.compute_bounding_volume();
        }
        self.bounding_sphere
    }
}
