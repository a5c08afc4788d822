//! Core resource definitions
//!
//! CPU-side data an attachable's visual content is built from. Nothing here
//! talks to a GPU; the renderer is an external collaborator.
//! - Geometry: vertex positions and bounding volumes
//! - Material: shading parameters, diffuse map and outline
//! - Mesh: geometry + material + render layers

pub mod geometry;
pub mod material;
pub mod mesh;

pub use geometry::{BoundingBox, BoundingSphere, Geometry};
pub use material::{Material, MaterialKind, OutlineParameters, TextureHandle};
pub use mesh::{Mesh, RenderLayers};
