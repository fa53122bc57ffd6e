//! CPU-side data the renderer consumes: mesh data, procedural primitives,
//! uniform block layouts, post-processing math and instance placement.

pub mod geometry;
pub mod instancing;
pub mod post_process;
pub mod primitives;
pub mod uniforms;

pub use geometry::{MeshData, Vertex};
pub use instancing::{InstanceField, InstanceParams, InstanceSeed};
pub use post_process::{BLUR_WEIGHTS, BlurStep, KernelPreset, blur_last_written, blur_schedule};
pub use uniforms::{
    BlurUniforms, IdUniforms, PostFlags, PostUniforms, SceneFlags, SceneUniforms, SkyUniforms,
    UniformBlock,
};
