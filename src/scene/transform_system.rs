//! Transform System
//!
//! World-matrix propagation for the scene graph, decoupled from [`Scene`]
//! so that it only borrows the node storage.
//!
//! World matrices are caches: they are only as fresh as the last pass that
//! reached a node. Code that reads a parent's world matrix after unrelated
//! mutations must first refresh the ancestor chain with
//! [`update_world_matrix`] (`update_parents = true`).
//!
//! [`Scene`]: crate::scene::Scene

use glam::Affine3A;
use slotmap::SlotMap;
use smallvec::SmallVec;

use crate::scene::NodeHandle;
use crate::scene::node::Node;

/// Updates the world matrices of every hierarchy reachable from `roots`.
///
/// Uses an explicit stack instead of recursion so deep skeletons cannot
/// overflow. Unchanged subtrees are skipped via the dirty flags.
pub fn update_hierarchy_iterative(nodes: &mut SlotMap<NodeHandle, Node>, roots: &[NodeHandle]) {
    let mut stack: Vec<(NodeHandle, Affine3A, bool)> = Vec::with_capacity(64);

    for &root_handle in roots.iter().rev() {
        stack.push((root_handle, Affine3A::IDENTITY, false));
    }

    while let Some((node_handle, parent_world_matrix, parent_changed)) = stack.pop() {
        propagate(nodes, node_handle, parent_world_matrix, parent_changed, &mut stack);
    }
}

/// Updates `root_handle` and its descendants, starting from the parent's
/// cached world matrix.
pub fn update_subtree(nodes: &mut SlotMap<NodeHandle, Node>, root_handle: NodeHandle) {
    let Some(node) = nodes.get(root_handle) else {
        return;
    };
    let parent_world = node
        .parent
        .and_then(|p| nodes.get(p))
        .map_or(Affine3A::IDENTITY, |p| p.transform.world_matrix);

    let mut stack: Vec<(NodeHandle, Affine3A, bool)> = Vec::with_capacity(16);
    stack.push((root_handle, parent_world, true));
    while let Some((node_handle, parent_world_matrix, parent_changed)) = stack.pop() {
        propagate(nodes, node_handle, parent_world_matrix, parent_changed, &mut stack);
    }
}

/// Recomputes the world matrices along the chain from the topmost ancestor
/// down to `handle` (inclusive), regardless of dirty state.
pub fn update_ancestors(nodes: &mut SlotMap<NodeHandle, Node>, handle: NodeHandle) {
    // Collect handle -> ... -> top, then walk it top-down.
    let mut chain: SmallVec<[NodeHandle; 16]> = SmallVec::new();
    let mut cursor = Some(handle);
    while let Some(current) = cursor {
        let Some(node) = nodes.get(current) else {
            break;
        };
        chain.push(current);
        cursor = node.parent;
    }

    let mut parent_world = Affine3A::IDENTITY;
    for &current in chain.iter().rev() {
        if let Some(node) = nodes.get_mut(current) {
            node.transform.update_local_matrix();
            let world = parent_world * *node.transform.local_matrix();
            node.transform.set_world_matrix(world);
            parent_world = world;
        }
    }
}

/// `updateWorldMatrix(updateParents, updateChildren)` semantics: optionally
/// refresh the ancestor chain first, then this node, then optionally its
/// whole subtree.
pub fn update_world_matrix(
    nodes: &mut SlotMap<NodeHandle, Node>,
    handle: NodeHandle,
    update_parents: bool,
    update_children: bool,
) {
    if update_parents {
        update_ancestors(nodes, handle);
    } else if let Some(node) = nodes.get(handle) {
        let parent_world = node
            .parent
            .and_then(|p| nodes.get(p))
            .map_or(Affine3A::IDENTITY, |p| p.transform.world_matrix);
        if let Some(node) = nodes.get_mut(handle) {
            node.transform.update_local_matrix();
            let world = parent_world * *node.transform.local_matrix();
            node.transform.set_world_matrix(world);
        }
    }

    if update_children {
        let children: SmallVec<[NodeHandle; 8]> = nodes
            .get(handle)
            .map(|n| n.children.iter().copied().collect())
            .unwrap_or_default();
        for child in children {
            update_subtree(nodes, child);
        }
    }
}

/// Processes one stack entry and pushes its children.
fn propagate(
    nodes: &mut SlotMap<NodeHandle, Node>,
    node_handle: NodeHandle,
    parent_world_matrix: Affine3A,
    parent_changed: bool,
    stack: &mut Vec<(NodeHandle, Affine3A, bool)>,
) {
    let Some(node) = nodes.get_mut(node_handle) else {
        return;
    };

    let local_changed = node.transform.update_local_matrix();
    let world_needs_update = local_changed || parent_changed;

    if world_needs_update {
        let new_world = parent_world_matrix * *node.transform.local_matrix();
        node.transform.set_world_matrix(new_world);
    }

    let current_world = node.transform.world_matrix;
    for &child_handle in node.children.iter().rev() {
        stack.push((child_handle, current_world, world_needs_update));
    }
}
