use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::resources::geometry::Geometry;
use crate::resources::material::Material;

bitflags! {
    /// Render layers a mesh is visible on (camera layer masks).
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct RenderLayers: u32 {
        const LAYER_0 = 1 << 0;
        const LAYER_1 = 1 << 1;
        const LAYER_2 = 1 << 2;
        const LAYER_3 = 1 << 3;
    }
}

impl Default for RenderLayers {
    fn default() -> Self {
        Self::LAYER_0
    }
}

/// Tag describing what a mesh node belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MeshRole {
    #[default]
    Scene,
    /// Cloned content of an attachable.
    Attachable,
}

#[derive(Debug, Clone)]
pub struct Mesh {
    pub name: String,

    pub geometry: Geometry,
    pub material: Material,

    pub layers: RenderLayers,
    pub role: MeshRole,
    pub visible: bool,
}

impl Mesh {
    #[must_use]
    pub fn new(geometry: Geometry, material: Material) -> Self {
        Self {
            name: "Mesh".to_string(),
            geometry,
            material,
            layers: RenderLayers::default(),
            role: MeshRole::Scene,
            visible: true,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }
}
