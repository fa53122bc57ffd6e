//! Procedural meshes used by the demos when no model file is involved.

pub mod box_shape;
pub mod plane;

pub use box_shape::create_box;
pub use plane::create_plane;
