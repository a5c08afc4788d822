use crate::scene::NodeHandle;
use crate::scene::transform::Transform;
use glam::Affine3A;

/// A minimal scene node containing only hierarchy and transform data.
///
/// Names, store identifiers, meshes and skin bindings live in the
/// [`Scene`](crate::scene::Scene)'s component maps, keyed by [`NodeHandle`].
///
/// # Hierarchy
///
/// - `parent`: Optional handle to the parent node (`None` for root or
///   detached nodes)
/// - `children`: List of child node handles
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) parent: Option<NodeHandle>,
    pub(crate) children: Vec<NodeHandle>,

    /// Local transform plus cached matrices
    pub transform: Transform,

    /// Visibility flag
    pub visible: bool,

    /// When set, ray picking reports this node once for any hit on its
    /// descendants instead of one intersection per sub-mesh.
    pub group_pick: bool,
}

impl Node {
    /// Creates a new node with default transform and visibility.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            transform: Transform::new(),
            visible: true,
            group_pick: false,
        }
    }

    /// Creates a node that picks as a single unit (see [`Node::group_pick`]).
    #[must_use]
    pub fn new_group() -> Self {
        Self {
            group_pick: true,
            ..Self::new()
        }
    }

    /// Returns the parent node handle, if any.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    /// Returns a read-only slice of child node handles.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    /// Returns the cached world matrix.
    ///
    /// Only as fresh as the last transform-system pass that touched this
    /// node; use [`Scene::update_world_matrix`](crate::scene::Scene::update_world_matrix)
    /// before reading it after mutations.
    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.transform.world_matrix
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}
