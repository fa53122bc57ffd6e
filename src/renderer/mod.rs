//! Rendering System
//!
//! The renderer is split into a thin device layer and a pass pipeline:
//!
//! - [`backend`]: the [`GpuBackend`](backend::GpuBackend) trait, recorded
//!   frames, the headless recorder and the `wgpu` implementation
//! - [`device`]: the [`Device`] front end that allocates ids and owns the backend
//! - [`handles`]: owning handles whose drop queues a GPU release
//! - [`graph`]: frame stage ordering
//! - [`pipeline`]: declarative passes, render targets and the pass executor
//! - [`settings`]: startup configuration
//!
//! # Frame Flow
//!
//! ```text
//! Demo::passes ──► PassExecutor::record ──► Frame ──► Device::submit ──► overlay ──► Device::present
//! ```

pub mod backend;
pub mod device;
pub mod graph;
pub mod handles;
pub mod pipeline;
pub mod settings;

pub use device::{Device, Framebuffer};
pub use settings::{DEPTH_FORMAT, HDR_TEXTURE_FORMAT, Projection, RenderSettings};
