//! Visual content of an attachable
//!
//! The source model is shared between every attachable that uses it, so the
//! content is built from *copies*: geometry is deep-copied, materials are
//! replaced. Building happens off-scene; nothing touches the scene graph
//! until [`VisualContent::commit`], so a failed or cancelled build leaves no
//! trace.

use glam::Vec3;

use crate::assets::ModelData;
use crate::errors::{AttachError, Result};
use crate::resources::material::Material;
use crate::resources::mesh::{Mesh, MeshRole};
use crate::scene::{NodeHandle, Scene, Transform};
use crate::settings::AttachSettings;
use crate::store::ObjectId;

/// One cloned mesh plus the local transform it is committed with.
#[derive(Debug, Clone)]
pub struct ContentMesh {
    pub mesh: Mesh,
    pub transform: Transform,
}

/// Cloned meshes waiting to be parented under an attachment container.
#[derive(Debug, Clone, Default)]
pub struct VisualContent {
    meshes: Vec<ContentMesh>,
}

impl VisualContent {
    /// Clones every mesh of `model` into attachable content.
    ///
    /// - materials become the configured toon material, keeping only the
    ///   diffuse map (flagged for re-upload)
    /// - each clone is moved by its negated bounding-sphere centre so it
    ///   pivots around its own middle
    /// - clones render on `settings.content_layers`
    ///
    /// Fails with [`AttachError::InvalidAttachmentContent`] if any source
    /// mesh is skinned, and with [`AttachError::MalformedModel`] if the model
    /// cannot be traversed. Either way no partial content is returned.
    pub fn build(model: &ModelData, id: &ObjectId, settings: &AttachSettings) -> Result<Self> {
        let mut meshes = Vec::new();
        let mut skinned = 0usize;

        model.traverse(|node| {
            let Some(source) = &node.mesh else {
                return Ok(());
            };
            if source.is_skinned() {
                skinned += 1;
                return Ok(());
            }

            let mut geometry = model.geometry(source)?.as_ref().clone();
            let center = geometry.bounding_sphere().map_or(Vec3::ZERO, |s| s.center);

            let mut material = Material::new_toon(&settings.toon);
            if let Some(map) = source.material.map {
                material.map = Some(map);
                material.map_needs_update = true;
            }
            material.outline = settings.neutral_outline;

            let mut mesh = Mesh::new(geometry, material).with_name(&source.name);
            mesh.layers = settings.content_layers;
            mesh.role = MeshRole::Attachable;

            let mut transform = node.transform.clone();
            transform.position = -center;
            transform.mark_dirty();

            meshes.push(ContentMesh { mesh, transform });
            Ok(())
        })?;

        if skinned > 0 {
            log::warn!("Attachable {id}: model has {skinned} skinned mesh(es), rejecting");
            return Err(AttachError::InvalidAttachmentContent(id.clone()));
        }

        Ok(Self { meshes })
    }

    #[must_use]
    pub fn meshes(&self) -> &[ContentMesh] {
        &self.meshes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Parents every mesh under `container` and returns the new handles.
    pub fn commit(self, scene: &mut Scene, container: NodeHandle) -> Result<Vec<NodeHandle>> {
        if !scene.contains(container) {
            return Err(AttachError::NodeNotFound);
        }

        let handles = self
            .meshes
            .into_iter()
            .map(|ContentMesh { mesh, transform }| {
                let handle = scene.add_mesh(mesh, Some(container));
                if let Some(node) = scene.get_node_mut(handle) {
                    node.transform = transform;
                }
                handle
            })
            .collect();
        scene.update_world_matrix(container, false, true);
        Ok(handles)
    }
}
