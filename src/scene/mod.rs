//! Scene graph module
//!
//! A minimal hierarchical scene graph, enough for the attachment core to
//! parent attachables under skeleton bones and to reason about world and
//! local coordinate frames:
//! - Node: scene node (parent/child links and transform)
//! - Transform: TRS component with dirty-checked local matrix
//! - Scene: node storage plus component maps (meshes, names, ids, skins)
//! - Skeleton: ordered bone list of a skinned character
//! - transform_system: world-matrix propagation, decoupled from `Scene`
//! - raycast: ray picking against mesh bounding spheres

pub mod node;
pub mod raycast;
pub mod scene;
pub mod skeleton;
pub mod transform;
pub mod transform_system;

pub use node::Node;
pub use raycast::{Intersection, Ray};
pub use scene::Scene;
pub use skeleton::{Skeleton, SkinBinding};
pub use transform::Transform;

use slotmap::new_key_type;

new_key_type! {
    pub struct NodeHandle;
    pub struct SkeletonKey;
}
