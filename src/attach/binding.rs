//! Binding attachables to character bones
//!
//! Every operation here resolves its targets *before* touching the scene
//! graph, so a failed bind or rebind never leaves a node half-detached.

use glam::Vec3;

use crate::attach::frame::{self, Pose};
use crate::attach::node::{AttachmentNode, BindState, CharacterRef};
use crate::attach::registry::AttachmentRegistry;
use crate::errors::{AttachError, Result};
use crate::scene::{NodeHandle, Scene};
use crate::store::{ObjectId, ObjectStore, ObjectUpdate};

/// Uniform scale of an attachable of `size` riding on a character scaled by
/// `character_scale`. A degenerate character scale is treated as 1.
#[inline]
#[must_use]
pub fn normalized_scale(size: f32, character_scale: f32) -> f32 {
    if character_scale.abs() <= f32::EPSILON {
        size
    } else {
        size / character_scale
    }
}

/// Where a [`BindingManager::rebind`] moves a node to.
#[derive(Debug, Clone, Copy)]
pub struct RebindTarget<'a> {
    pub character: &'a ObjectId,
    pub bone_name: &'a str,
    /// Requested size in world units.
    pub size: f32,
    /// Uniform scale of the new character.
    pub character_scale: f32,
}

pub struct BindingManager;

impl BindingManager {
    /// Finds the character among the scene's direct children.
    pub fn resolve_character(scene: &Scene, id: &ObjectId) -> Result<CharacterRef> {
        scene
            .find_root_by_object_id(id)
            .map(|handle| CharacterRef {
                id: id.clone(),
                handle,
            })
            .ok_or_else(|| AttachError::CharacterUnresolved(id.clone()))
    }

    /// Finds `bone_name` on the skeleton of the character's first skinned
    /// mesh.
    pub fn resolve_bone(scene: &Scene, character: &CharacterRef, bone_name: &str) -> Result<NodeHandle> {
        let skeleton = scene
            .find_skinned_mesh(character.handle)
            .and_then(|mesh| scene.skin_bindings.get(mesh))
            .map(|binding| binding.skeleton)
            .ok_or_else(|| AttachError::SkeletonUnresolved(character.id.clone()))?;

        scene
            .bone_by_name(skeleton, bone_name)
            .ok_or_else(|| AttachError::BoneNotFound {
                bone: bone_name.to_owned(),
                character: character.id.clone(),
            })
    }

    /// Uniform scale of the character's root node (its x scale).
    #[must_use]
    pub fn character_scale(scene: &Scene, character: &CharacterRef) -> f32 {
        scene
            .get_node(character.handle)
            .map_or(1.0, |n| n.transform.scale.x)
    }

    /// Parents `node` under `bone_name` of `character`, keeping its world
    /// position and rotation, and sets its scale to
    /// `size / character scale`.
    pub fn bind(
        scene: &mut Scene,
        registry: &mut AttachmentRegistry,
        node: &mut AttachmentNode,
        character: &CharacterRef,
        bone_name: &str,
        size: f32,
    ) -> Result<()> {
        let container = node.require_container(scene)?;
        let bone = Self::resolve_bone(scene, character, bone_name)?;
        let scale = normalized_scale(size, Self::character_scale(scene, character));

        let world = Self::current_world_pose(scene, container);
        Self::reparent(scene, container, bone, world, scale);

        node.bind_bone_name = bone_name.to_owned();
        node.scale = scale;
        node.bind = BindState::Bound {
            bone,
            character: character.clone(),
        };
        registry.register(&character.id, node.id());

        log::debug!(
            "Attachable {} bound to bone '{bone_name}' of {}",
            node.id(),
            character.id
        );
        Ok(())
    }

    /// Moves `node` onto `target`.
    ///
    /// The node's world position survives the move; the resulting world
    /// position is written back to the store. Fails before mutating
    /// anything if the character or bone cannot be resolved.
    pub fn rebind(
        scene: &mut Scene,
        registry: &mut AttachmentRegistry,
        store: &mut dyn ObjectStore,
        node: &mut AttachmentNode,
        target: RebindTarget<'_>,
    ) -> Result<CharacterRef> {
        let RebindTarget {
            character: character_id,
            bone_name,
            size,
            character_scale,
        } = target;
        let container = node.require_container(scene)?;
        let character = Self::resolve_character(scene, character_id)?;
        let bone = Self::resolve_bone(scene, &character, bone_name)?;

        let world = Self::current_world_pose(scene, container);

        registry.unregister(node.id());
        scene.detach(container);

        let scale = normalized_scale(size, character_scale);
        Self::reparent(scene, container, bone, world, scale);

        node.bind_bone_name = bone_name.to_owned();
        node.scale = scale;
        node.bind = BindState::Bound {
            bone,
            character: character.clone(),
        };
        registry.register(&character.id, node.id());

        let position = scene
            .world_matrix(container)
            .map_or(world.translation, |m| Vec3::from(m.translation));
        store.update_object(node.id(), ObjectUpdate::position(position));

        log::debug!(
            "Attachable {} rebound to bone '{bone_name}' of {}",
            node.id(),
            character.id
        );
        Ok(character)
    }

    /// Detaches `node` from its bone and drops its registry membership.
    /// The node itself stays alive.
    pub fn unbind(scene: &mut Scene, registry: &mut AttachmentRegistry, node: &mut AttachmentNode) {
        scene.detach(node.container());
        registry.unregister(node.id());
        node.bind = BindState::Unbound;
    }

    /// World pose of `container` computed from its local transform and its
    /// parent's freshly refreshed world matrix.
    fn current_world_pose(scene: &mut Scene, container: NodeHandle) -> Pose {
        let parent_world = scene.refreshed_parent_world_matrix(container);
        let local = scene
            .get_node(container)
            .map_or(Pose::IDENTITY, |n| n.transform.pose());
        frame::to_world(local, &parent_world)
    }

    /// Parents `container` under `bone` so that it keeps `world`'s position
    /// and rotation, with a uniform local `scale`.
    fn reparent(scene: &mut Scene, container: NodeHandle, bone: NodeHandle, world: Pose, scale: f32) {
        scene.update_world_matrix(bone, true, false);
        let bone_inverse = scene.inverse_world_matrix(bone).unwrap_or_default();
        let mut local = frame::to_local_with_inverse(world, &bone_inverse);
        local.scale = Vec3::splat(scale);

        scene.attach(container, bone);
        if let Some(n) = scene.get_node_mut(container) {
            n.transform.set_pose(local);
        }
        scene.update_world_matrix(container, false, true);
    }
}
