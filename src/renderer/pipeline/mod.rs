//! Pass Pipeline
//!
//! Demos describe a frame as an ordered list of [`Pass`] descriptors; the
//! [`PassExecutor`] records them into one [`Frame`](crate::renderer::backend::Frame)
//! against the demo's [`RenderTargets`] and [`ProgramLibrary`], reading
//! every tunable from one immutable [`FrameConfig`].
//!
//! ```text
//! [CubemapCapture] ─► Scene ─► [Blur × N] ─► Composite ─► default target
//! ```

pub mod config;
pub mod executor;
pub mod pass;
pub mod programs;
pub mod targets;

pub use config::FrameConfig;
pub use executor::{FrameContext, LIGHT_BLOCK_BINDING, LightBlock, PassExecutor, stage_of};
pub use pass::{
    BlurPass, CompositePass, CubemapCapturePass, DrawItem, Pass, PassTarget, ScenePass, Shading,
    TextureSource,
};
pub use programs::{ProgramKind, ProgramLibrary};
pub use targets::{RenderTargets, TargetName, TargetSize, TargetSpec};
