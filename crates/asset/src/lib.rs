//! Asset loading: SBM meshes and textures.

pub mod mesh;
pub mod sbm;
pub mod texture;

pub use mesh::VertexStream;
pub use sbm::{SbmError, SbmErrorKind, SbmObject};
pub use texture::TextureData;
