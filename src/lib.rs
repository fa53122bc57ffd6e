#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod app;
pub mod assets;
pub mod demos;
pub mod engine;
pub mod errors;
pub mod renderer;
pub mod resources;
pub mod scene;
pub mod ui;
pub mod utils;

pub use app::{App, AppSettings};
pub use assets::{FileAssetSource, MemoryAssetSource, ResourceCache};
pub use demos::{Demo, DemoKind};
pub use engine::Engine;
pub use errors::{Result, TavernError};
pub use renderer::pipeline::FrameConfig;
pub use renderer::{Device, RenderSettings};
pub use scene::{Camera, CameraMode, Light, LightSet};
