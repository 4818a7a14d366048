//! Core types: vector/matrix math, orbit camera, shared errors.

pub mod camera;
pub mod error;
pub mod vecmath;

pub use camera::{OrbitCamera, Viewport};
pub use error::{CoreError, CoreResult};
pub use vecmath::{Mat4, Vec4};
