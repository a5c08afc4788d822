use crate::attach::content::VisualContent;
use crate::errors::{AttachError, Result};
use crate::resources::material::OutlineParameters;
use crate::scene::{Node, NodeHandle, Scene};
use crate::store::ObjectId;

/// Resolved target character: its store identifier and scene node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterRef {
    pub id: ObjectId,
    pub handle: NodeHandle,
}

/// Current parentage of an [`AttachmentNode`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BindState {
    #[default]
    Unbound,
    /// Scene parent is exactly `bone`, a bone of `character`'s skeleton.
    Bound { bone: NodeHandle, character: CharacterRef },
}

/// Scene-side state of one attachable.
///
/// Owns a container node that picks as a single unit; the cloned meshes are
/// its children. The container is what gets parented under a bone, so the
/// content keeps its recentering offsets across rebinds.
#[derive(Debug)]
pub struct AttachmentNode {
    id: ObjectId,
    container: NodeHandle,
    content: Vec<NodeHandle>,

    pub(crate) bind_bone_name: String,
    pub(crate) scale: f32,
    pub(crate) is_rotation_edit_enabled: bool,
    pub(crate) bind: BindState,
}

impl AttachmentNode {
    /// Creates the container node, detached from the scene.
    pub fn new(scene: &mut Scene, id: ObjectId) -> Self {
        let container = scene.nodes.insert(Node::new_group());
        scene.set_name(container, &format!("attachable:{id}"));
        scene.set_object_id(container, id.clone());

        Self {
            id,
            container,
            content: Vec::new(),
            bind_bone_name: String::new(),
            scale: 1.0,
            is_rotation_edit_enabled: false,
            bind: BindState::Unbound,
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    /// The node that is parented under the bone.
    #[inline]
    #[must_use]
    pub fn container(&self) -> NodeHandle {
        self.container
    }

    #[must_use]
    pub fn content(&self) -> &[NodeHandle] {
        &self.content
    }

    #[must_use]
    pub fn has_content(&self) -> bool {
        !self.content.is_empty()
    }

    #[must_use]
    pub fn bind_bone_name(&self) -> &str {
        &self.bind_bone_name
    }

    #[must_use]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Set by the rotation-edit toggle, and on select when the control is
    /// still enabled from an earlier toggle.
    #[must_use]
    pub fn is_rotation_edit_enabled(&self) -> bool {
        self.is_rotation_edit_enabled
    }

    #[must_use]
    pub fn bind_state(&self) -> &BindState {
        &self.bind
    }

    #[must_use]
    pub fn is_bound(&self) -> bool {
        matches!(self.bind, BindState::Bound { .. })
    }

    #[must_use]
    pub fn character(&self) -> Option<&CharacterRef> {
        match &self.bind {
            BindState::Bound { character, .. } => Some(character),
            BindState::Unbound => None,
        }
    }

    #[must_use]
    pub fn bone(&self) -> Option<NodeHandle> {
        match self.bind {
            BindState::Bound { bone, .. } => Some(bone),
            BindState::Unbound => None,
        }
    }

    /// Replaces the visual content, discarding the previous meshes.
    pub fn set_content(&mut self, scene: &mut Scene, content: VisualContent) -> Result<()> {
        self.clear_content(scene);
        self.content = content.commit(scene, self.container)?;
        Ok(())
    }

    pub fn clear_content(&mut self, scene: &mut Scene) {
        for handle in self.content.drain(..) {
            scene.remove_node(handle);
        }
    }

    /// Sets the outline of every content mesh.
    pub fn set_outline(&self, scene: &mut Scene, outline: OutlineParameters) {
        for &handle in &self.content {
            if let Some(mesh) = scene.get_mesh_mut(handle) {
                mesh.material.outline = outline;
            }
        }
    }

    /// Outline of the first content mesh.
    #[must_use]
    pub fn outline(&self, scene: &Scene) -> Option<OutlineParameters> {
        self.content
            .iter()
            .find_map(|&h| scene.get_mesh(h))
            .map(|m| m.material.outline)
    }

    pub(crate) fn require_container(&self, scene: &Scene) -> Result<NodeHandle> {
        if scene.contains(self.container) {
            Ok(self.container)
        } else {
            log::warn!("Attachable {}: container node is gone", self.id);
            Err(AttachError::NodeNotFound)
        }
    }

    /// Removes the container (and content) from the scene. Idempotent.
    pub fn destroy(&mut self, scene: &mut Scene) {
        self.content.clear();
        scene.remove_node(self.container);
        self.bind = BindState::Unbound;
        self.is_rotation_edit_enabled = false;
    }
}
