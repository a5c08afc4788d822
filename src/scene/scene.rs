use std::sync::atomic::{AtomicU32, Ordering};

use glam::Affine3A;
use slotmap::{SlotMap, SparseSecondaryMap};

use crate::resources::mesh::Mesh;
use crate::scene::node::Node;
use crate::scene::raycast::{Intersection, Ray};
use crate::scene::skeleton::{Skeleton, SkinBinding};
use crate::scene::transform_system;
use crate::scene::{NodeHandle, SkeletonKey};
use crate::store::ObjectId;

static NEXT_SCENE_ID: AtomicU32 = AtomicU32::new(1);

/// Scene graph
///
/// Pure data: node hierarchy plus component maps keyed by [`NodeHandle`].
/// Root nodes are the scene's *direct children*; characters are looked up
/// among them by their store identifier.
pub struct Scene {
    pub id: u32,

    pub nodes: SlotMap<NodeHandle, Node>,
    pub root_nodes: Vec<NodeHandle>,

    // ==== Components ====
    pub meshes: SparseSecondaryMap<NodeHandle, Mesh>,
    pub skin_bindings: SparseSecondaryMap<NodeHandle, SkinBinding>,
    pub skins: SlotMap<SkeletonKey, Skeleton>,

    names: SparseSecondaryMap<NodeHandle, String>,
    object_ids: SparseSecondaryMap<NodeHandle, ObjectId>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed),
            nodes: SlotMap::with_key(),
            root_nodes: Vec::new(),
            meshes: SparseSecondaryMap::new(),
            skin_bindings: SparseSecondaryMap::new(),
            skins: SlotMap::with_key(),
            names: SparseSecondaryMap::new(),
            object_ids: SparseSecondaryMap::new(),
        }
    }

    // ========================================================================
    // Node creation & hierarchy
    // ========================================================================

    /// Inserts a detached node (neither root nor child).
    pub fn create_node(&mut self) -> NodeHandle {
        self.nodes.insert(Node::new())
    }

    pub fn create_node_with_name(&mut self, name: &str) -> NodeHandle {
        let handle = self.create_node();
        self.set_name(handle, name);
        handle
    }

    /// Inserts a node as a direct child of the scene.
    pub fn add_node(&mut self, node: Node) -> NodeHandle {
        let handle = self.nodes.insert(node);
        self.root_nodes.push(handle);
        handle
    }

    pub fn add_to_parent(&mut self, child: Node, parent: NodeHandle) -> NodeHandle {
        let handle = self.nodes.insert(child);
        self.attach(handle, parent);
        handle
    }

    /// Inserts a mesh node under `parent`, or at the root if `None`.
    pub fn add_mesh(&mut self, mesh: Mesh, parent: Option<NodeHandle>) -> NodeHandle {
        let name = mesh.name.clone();
        let handle = match parent {
            Some(p) => self.add_to_parent(Node::new(), p),
            None => self.add_node(Node::new()),
        };
        self.meshes.insert(handle, mesh);
        self.set_name(handle, &name);
        handle
    }

    /// Makes `child` a child of `parent`, unlinking it from wherever it was.
    ///
    /// The child's *local* transform is kept as-is; callers that want to keep
    /// the world pose must convert it themselves.
    pub fn attach(&mut self, child: NodeHandle, parent: NodeHandle) {
        if child == parent {
            log::warn!("Cannot attach node to itself!");
            return;
        }
        if !self.nodes.contains_key(parent) {
            log::error!("Parent node not found during attach!");
            return;
        }
        if self.is_ancestor_of(child, parent) {
            log::warn!("Cannot attach a node below its own descendant!");
            return;
        }

        self.unlink(child);

        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = Some(parent);
            c.transform.mark_dirty();
        }
    }

    /// Makes `child` a direct child of the scene.
    pub fn attach_to_root(&mut self, child: NodeHandle) {
        if !self.nodes.contains_key(child) {
            return;
        }
        self.unlink(child);
        self.root_nodes.push(child);
        if let Some(c) = self.nodes.get_mut(child) {
            c.transform.mark_dirty();
        }
    }

    /// Removes `child` from its parent (or the root list) without destroying it.
    pub fn detach(&mut self, child: NodeHandle) {
        self.unlink(child);
        if let Some(c) = self.nodes.get_mut(child) {
            c.transform.mark_dirty();
        }
    }

    fn unlink(&mut self, child: NodeHandle) {
        let old_parent = self.nodes.get(child).and_then(|n| n.parent);
        if let Some(p) = old_parent {
            if let Some(n) = self.nodes.get_mut(p)
                && let Some(i) = n.children.iter().position(|&x| x == child)
            {
                n.children.remove(i);
            }
        } else if let Some(i) = self.root_nodes.iter().position(|&x| x == child) {
            self.root_nodes.remove(i);
        }
        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = None;
        }
    }

    /// Removes a node and its whole subtree. Stale handles are ignored.
    pub fn remove_node(&mut self, handle: NodeHandle) {
        if !self.nodes.contains_key(handle) {
            return;
        }
        self.unlink(handle);

        let mut stack = vec![handle];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(current) {
                stack.extend(node.children);
            }
            self.meshes.remove(current);
            self.skin_bindings.remove(current);
            self.names.remove(current);
            self.object_ids.remove(current);
        }
    }

    #[must_use]
    pub fn get_node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    pub fn get_node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(handle)
    }

    #[must_use]
    pub fn contains(&self, handle: NodeHandle) -> bool {
        self.nodes.contains_key(handle)
    }

    #[must_use]
    pub fn parent_of(&self, handle: NodeHandle) -> Option<NodeHandle> {
        self.nodes.get(handle).and_then(|n| n.parent)
    }

    #[must_use]
    pub fn is_root(&self, handle: NodeHandle) -> bool {
        self.root_nodes.contains(&handle)
    }

    /// `true` if `ancestor` is `node` or lies on its parent chain.
    #[must_use]
    pub fn is_ancestor_of(&self, ancestor: NodeHandle, node: NodeHandle) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent_of(current);
        }
        false
    }

    // ========================================================================
    // Names & identifiers
    // ========================================================================

    pub fn set_name(&mut self, handle: NodeHandle, name: &str) {
        if self.nodes.contains_key(handle) {
            self.names.insert(handle, name.to_string());
        }
    }

    #[must_use]
    pub fn get_name(&self, handle: NodeHandle) -> Option<&str> {
        self.names.get(handle).map(String::as_str)
    }

    pub fn set_object_id(&mut self, handle: NodeHandle, id: ObjectId) {
        if self.nodes.contains_key(handle) {
            self.object_ids.insert(handle, id);
        }
    }

    #[must_use]
    pub fn object_id(&self, handle: NodeHandle) -> Option<&ObjectId> {
        self.object_ids.get(handle)
    }

    /// Looks up a direct child of the scene by its store identifier.
    #[must_use]
    pub fn find_root_by_object_id(&self, id: &ObjectId) -> Option<NodeHandle> {
        self.root_nodes
            .iter()
            .copied()
            .find(|&h| self.object_ids.get(h) == Some(id))
    }

    /// Depth-first search of `root`'s subtree (inclusive).
    pub fn find_in_subtree(
        &self,
        root: NodeHandle,
        mut pred: impl FnMut(NodeHandle) -> bool,
    ) -> Option<NodeHandle> {
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(current) else {
                continue;
            };
            if pred(current) {
                return Some(current);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }

    /// First skinned mesh node below `root` (inclusive).
    #[must_use]
    pub fn find_skinned_mesh(&self, root: NodeHandle) -> Option<NodeHandle> {
        self.find_in_subtree(root, |h| self.skin_bindings.contains_key(h))
    }

    // ========================================================================
    // Components
    // ========================================================================

    #[must_use]
    pub fn get_mesh(&self, handle: NodeHandle) -> Option<&Mesh> {
        self.meshes.get(handle)
    }

    pub fn get_mesh_mut(&mut self, handle: NodeHandle) -> Option<&mut Mesh> {
        self.meshes.get_mut(handle)
    }

    pub fn add_skeleton(&mut self, skeleton: Skeleton) -> SkeletonKey {
        self.skins.insert(skeleton)
    }

    /// Marks `mesh_node` as a skinned mesh driven by `skeleton`.
    pub fn bind_skin(&mut self, mesh_node: NodeHandle, skeleton: SkeletonKey) {
        if self.nodes.contains_key(mesh_node) {
            self.skin_bindings.insert(mesh_node, SkinBinding { skeleton });
        }
    }

    #[must_use]
    pub fn skeleton_of(&self, mesh_node: NodeHandle) -> Option<&Skeleton> {
        let binding = self.skin_bindings.get(mesh_node)?;
        self.skins.get(binding.skeleton)
    }

    /// `getBoneByName`: first bone of the skeleton whose node name matches.
    #[must_use]
    pub fn bone_by_name(&self, skeleton: SkeletonKey, name: &str) -> Option<NodeHandle> {
        self.skins
            .get(skeleton)?
            .find_bone(|b| self.get_name(b) == Some(name))
    }

    // ========================================================================
    // Matrix update pipeline
    // ========================================================================

    /// Updates the world matrices of the whole scene.
    pub fn update_matrix_world(&mut self) {
        transform_system::update_hierarchy_iterative(&mut self.nodes, &self.root_nodes);
    }

    /// Updates a subtree's world matrices from its parent's cached matrix.
    pub fn update_subtree(&mut self, handle: NodeHandle) {
        transform_system::update_subtree(&mut self.nodes, handle);
    }

    /// Refreshes `handle`'s world matrix, optionally its ancestors first and
    /// its descendants after.
    pub fn update_world_matrix(&mut self, handle: NodeHandle, update_parents: bool, update_children: bool) {
        transform_system::update_world_matrix(&mut self.nodes, handle, update_parents, update_children);
    }

    /// Cached world matrix.
    #[must_use]
    pub fn world_matrix(&self, handle: NodeHandle) -> Option<Affine3A> {
        self.nodes.get(handle).map(|n| n.transform.world_matrix)
    }

    /// Inverse of the cached world matrix.
    #[must_use]
    pub fn inverse_world_matrix(&self, handle: NodeHandle) -> Option<Affine3A> {
        self.world_matrix(handle).map(|m| m.inverse())
    }

    /// World matrix of `handle`'s parent; identity for root/detached nodes.
    #[must_use]
    pub fn parent_world_matrix(&self, handle: NodeHandle) -> Affine3A {
        self.parent_of(handle)
            .and_then(|p| self.world_matrix(p))
            .unwrap_or(Affine3A::IDENTITY)
    }

    /// Refreshes the ancestor chain, then returns `handle`'s world matrix.
    pub fn refreshed_world_matrix(&mut self, handle: NodeHandle) -> Option<Affine3A> {
        if !self.nodes.contains_key(handle) {
            return None;
        }
        self.update_world_matrix(handle, true, false);
        self.world_matrix(handle)
    }

    /// Refreshed world matrix of `handle`'s parent; identity when unparented.
    pub fn refreshed_parent_world_matrix(&mut self, handle: NodeHandle) -> Affine3A {
        self.parent_of(handle)
            .and_then(|p| self.refreshed_world_matrix(p))
            .unwrap_or(Affine3A::IDENTITY)
    }

    // ========================================================================
    // Picking
    // ========================================================================

    /// Intersects `ray` with every visible mesh reachable from the roots,
    /// nearest first.
    ///
    /// Group nodes ([`Node::group_pick`]) report one intersection for
    /// themselves using the nearest hit among their descendants. Uses cached
    /// world matrices; run [`update_matrix_world`](Self::update_matrix_world)
    /// first.
    #[must_use]
    pub fn raycast(&self, ray: &Ray) -> Vec<Intersection> {
        let mut hits = Vec::new();
        let mut stack: Vec<NodeHandle> = self.root_nodes.iter().rev().copied().collect();

        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(current) else {
                continue;
            };
            if !node.visible {
                continue;
            }
            if node.group_pick {
                if let Some(distance) = self.nearest_hit_in_subtree(current, ray) {
                    hits.push(Intersection {
                        node: current,
                        distance,
                        point: ray.at(distance),
                    });
                }
                continue;
            }
            if let Some(distance) = self.hit_mesh(current, ray) {
                hits.push(Intersection {
                    node: current,
                    distance,
                    point: ray.at(distance),
                });
            }
            stack.extend(node.children.iter().rev().copied());
        }

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    fn nearest_hit_in_subtree(&self, root: NodeHandle, ray: &Ray) -> Option<f32> {
        let mut nearest: Option<f32> = None;
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(current) else {
                continue;
            };
            if !node.visible {
                continue;
            }
            if let Some(d) = self.hit_mesh(current, ray) {
                nearest = Some(nearest.map_or(d, |n| n.min(d)));
            }
            stack.extend(node.children.iter().copied());
        }
        nearest
    }

    fn hit_mesh(&self, handle: NodeHandle, ray: &Ray) -> Option<f32> {
        let mesh = self.meshes.get(handle)?;
        if !mesh.visible {
            return None;
        }
        let sphere = mesh.geometry.bounding_sphere?;
        let world = self.world_matrix(handle)?;
        ray.intersect_sphere(&sphere.transform(&world))
    }
}
