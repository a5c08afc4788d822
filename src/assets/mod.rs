//! Asset data consumed by the attachment core.
//!
//! Loading (glTF, HTTP, …) is the host's business; the core only needs the
//! loaded result as a traversable [`ModelData`] tree.

pub mod model;

pub use model::{ModelData, ModelMesh, ModelNode};
