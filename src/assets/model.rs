use std::sync::Arc;

use uuid::Uuid;

use crate::errors::{AttachError, Result};
use crate::resources::geometry::Geometry;
use crate::resources::material::Material;
use crate::scene::transform::Transform;

/// Mesh component of a model node.
#[derive(Debug, Clone)]
pub struct ModelMesh {
    pub name: String,
    /// Index into [`ModelData::geometries`]
    pub geometry: usize,
    pub material: Material,
    /// Index into [`ModelData::skins`] when this is a skinned mesh
    pub skin: Option<usize>,
}

impl ModelMesh {
    #[must_use]
    pub fn new(name: &str, geometry: usize, material: Material) -> Self {
        Self {
            name: name.to_string(),
            geometry,
            material,
            skin: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_skinned(&self) -> bool {
        self.skin.is_some()
    }
}

/// Model node: plain data, children referenced by index.
#[derive(Debug, Clone, Default)]
pub struct ModelNode {
    pub name: Option<String>,
    pub transform: Transform,
    /// Indices of child nodes in [`ModelData::nodes`]
    pub children_indices: Vec<usize>,
    pub mesh: Option<ModelMesh>,
}

impl ModelNode {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_mesh(mesh: ModelMesh) -> Self {
        Self {
            name: Some(mesh.name.clone()),
            mesh: Some(mesh),
            ..Self::default()
        }
    }
}

/// Loaded model: a flattened node tree plus shared geometry.
///
/// `ModelData` is shared between every attachable using the same asset
/// (`Arc<ModelData>`) and must never be mutated by consumers. Geometry is
/// cloned before any per-instance change.
#[derive(Debug, Clone)]
pub struct ModelData {
    /// Asset identity; a different id means a different model.
    pub id: Uuid,
    pub nodes: Vec<ModelNode>,
    pub root_indices: Vec<usize>,
    pub geometries: Vec<Arc<Geometry>>,
    /// Skin names (skinned meshes reference these by index)
    pub skins: Vec<String>,
}

impl Default for ModelData {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelData {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            nodes: Vec::new(),
            root_indices: Vec::new(),
            geometries: Vec::new(),
            skins: Vec::new(),
        }
    }

    /// Adds a geometry and returns its index.
    pub fn add_geometry(&mut self, geometry: Geometry) -> usize {
        self.geometries.push(Arc::new(geometry));
        self.geometries.len() - 1
    }

    /// Adds a node, under `parent` or as a root, and returns its index.
    pub fn add_node(&mut self, node: ModelNode, parent: Option<usize>) -> usize {
        let index = self.nodes.len();
        self.nodes.push(node);
        match parent.and_then(|p| self.nodes.get_mut(p)) {
            Some(p) => p.children_indices.push(index),
            None => self.root_indices.push(index),
        }
        index
    }

    /// Geometry referenced by a mesh.
    pub fn geometry(&self, mesh: &ModelMesh) -> Result<&Arc<Geometry>> {
        self.geometries.get(mesh.geometry).ok_or_else(|| {
            AttachError::MalformedModel(format!(
                "mesh '{}' references missing geometry {}",
                mesh.name, mesh.geometry
            ))
        })
    }

    /// Visits every node depth-first, pre-order, starting from the roots.
    ///
    /// Fails on a dangling child index or a cycle; the visitor may have been
    /// called for some nodes by then.
    pub fn traverse(&self, mut visitor: impl FnMut(&ModelNode) -> Result<()>) -> Result<()> {
        let mut visited = vec![false; self.nodes.len()];
        let mut stack: Vec<usize> = self.root_indices.iter().rev().copied().collect();

        while let Some(index) = stack.pop() {
            let Some(node) = self.nodes.get(index) else {
                return Err(AttachError::MalformedModel(format!("dangling node index {index}")));
            };
            if std::mem::replace(&mut visited[index], true) {
                return Err(AttachError::MalformedModel(format!("node {index} reached twice")));
            }
            visitor(node)?;
            stack.extend(node.children_indices.iter().rev().copied());
        }
        Ok(())
    }
}
