use uuid::Uuid;

use crate::scene::{NodeHandle, SkeletonKey};

/// Links a skinned mesh node to the skeleton that drives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkinBinding {
    pub skeleton: SkeletonKey,
}

#[derive(Debug, Clone)]
pub struct Skeleton {
    pub id: Uuid,
    pub name: String,

    // Ordered bone list; bones[i] is joint i of the skin.
    pub bones: Vec<NodeHandle>,

    /// Root bone index (usually bones[0])
    pub(crate) root_bone_index: usize,
}

impl Skeleton {
    #[must_use]
    pub fn new(name: &str, bones: Vec<NodeHandle>, root_bone_index: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            bones,
            root_bone_index,
        }
    }

    /// Gets the root bone node handle
    #[inline]
    #[must_use]
    pub fn root_bone(&self) -> Option<NodeHandle> {
        self.bones.get(self.root_bone_index).copied()
    }

    /// Joint index of a bone, if it belongs to this skeleton.
    #[must_use]
    pub fn joint_index(&self, bone: NodeHandle) -> Option<usize> {
        self.bones.iter().position(|&b| b == bone)
    }

    /// Returns the first bone for which `pred` holds, in joint order.
    pub fn find_bone(&self, mut pred: impl FnMut(NodeHandle) -> bool) -> Option<NodeHandle> {
        self.bones.iter().copied().find(|&b| pred(b))
    }
}
