//! Store ↔ scene pose synchronization
//!
//! Positions and rotations are authored in world space but the node lives
//! in bone-local space. Every external change is therefore applied as
//! to-world, overwrite, to-local, always against a parent world matrix that
//! was refreshed right before reading it.

use glam::{Quat, Vec3};

use crate::attach::binding::{BindingManager, normalized_scale};
use crate::attach::frame::{self, Pose};
use crate::attach::node::AttachmentNode;
use crate::errors::{AttachError, Result};
use crate::scene::{NodeHandle, Scene};
use crate::store::{ObjectStore, ObjectUpdate, Rotation};

pub struct TransformSynchronizer;

impl TransformSynchronizer {
    /// Moves the node so its world position is `position`.
    pub fn apply_position(scene: &mut Scene, node: &AttachmentNode, position: Vec3) -> Result<()> {
        Self::edit_world_pose(scene, node, |world| world.translation = position)
    }

    /// Rotates the node so its world rotation is `euler` (XYZ, radians).
    /// Position and scale are left alone.
    pub fn apply_rotation(scene: &mut Scene, node: &AttachmentNode, euler: Vec3) -> Result<()> {
        Self::apply_world_rotation(scene, node, frame::quat_from_euler(euler))
    }

    pub fn apply_world_rotation(scene: &mut Scene, node: &AttachmentNode, rotation: Quat) -> Result<()> {
        Self::edit_world_pose(scene, node, |world| world.rotation = rotation)
    }

    /// Applies a new size and returns the resulting uniform scale.
    ///
    /// A node parented into a character is normalized by the character's
    /// scale; an unparented node takes `size` as-is.
    pub fn apply_size(scene: &mut Scene, node: &mut AttachmentNode, size: f32) -> Result<f32> {
        let container = node.require_container(scene)?;
        let scale = match (scene.parent_of(container), node.character()) {
            (Some(_), Some(character)) => {
                normalized_scale(size, BindingManager::character_scale(scene, character))
            }
            _ => size,
        };

        if let Some(n) = scene.get_node_mut(container) {
            n.transform.set_uniform_scale(scale);
        }
        scene.update_world_matrix(container, false, true);
        node.scale = scale;
        Ok(scale)
    }

    /// Current world pose of the node.
    pub fn world_pose(scene: &mut Scene, node: &AttachmentNode) -> Result<Pose> {
        let container = node.require_container(scene)?;
        let parent_world = scene.refreshed_parent_world_matrix(container);
        let local = Self::local_pose(scene, container)?;
        Ok(frame::to_world(local, &parent_world))
    }

    /// Writes the node's world rotation back after a gizmo drag.
    ///
    /// The only path by which user interaction becomes persisted state.
    pub fn write_gizmo_rotation(
        scene: &mut Scene,
        store: &mut dyn ObjectStore,
        node: &AttachmentNode,
    ) -> Result<Rotation> {
        let world = Self::world_pose(scene, node)?;
        let rotation = Rotation::from(frame::euler_from_quat(world.rotation));
        store.update_object(node.id(), ObjectUpdate::rotation(rotation));
        Ok(rotation)
    }

    /// Persists the node's world position and rotation in one write.
    pub fn save_to_store(
        scene: &mut Scene,
        store: &mut dyn ObjectStore,
        node: &AttachmentNode,
    ) -> Result<Pose> {
        let world = Self::world_pose(scene, node)?;
        let rotation = Rotation::from(frame::euler_from_quat(world.rotation));
        store.update_object(node.id(), ObjectUpdate::pose(world.translation, rotation));
        Ok(world)
    }

    /// Overwrites part of the node's world pose and commits it back in
    /// parent-local space.
    fn edit_world_pose(
        scene: &mut Scene,
        node: &AttachmentNode,
        edit: impl FnOnce(&mut Pose),
    ) -> Result<()> {
        let container = node.require_container(scene)?;
        let parent_world = scene.refreshed_parent_world_matrix(container);
        let parent_inverse = parent_world.inverse();

        let local = Self::local_pose(scene, container)?;
        let mut world = frame::to_world(local, &parent_world);
        edit(&mut world);

        // Scale is authored locally; keep it exact rather than round-tripped.
        let mut next = frame::to_local_with_inverse(world, &parent_inverse);
        next.scale = local.scale;

        Self::commit_local(scene, container, next);
        Ok(())
    }

    fn local_pose(scene: &Scene, container: NodeHandle) -> Result<Pose> {
        scene
            .get_node(container)
            .map(|n| n.transform.pose())
            .ok_or(AttachError::NodeNotFound)
    }

    fn commit_local(scene: &mut Scene, container: NodeHandle, local: Pose) {
        if let Some(n) = scene.get_node_mut(container) {
            n.transform.set_pose(local);
        }
        scene.update_world_matrix(container, false, true);
    }
}
