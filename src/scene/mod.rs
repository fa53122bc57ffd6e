//! Scene data shared by the demos:
//! - [`Camera`]: Euler camera value with FPS / freefly updates
//! - [`Light`]: std140 light record, [`LightSet`]: lights mirrored in a uniform buffer
//! - [`TavernScene`]: the tavern mesh, its textures and the light buffer

pub mod camera;
pub mod light;
pub mod tavern;

pub use camera::{Camera, CameraInputs, CameraMode, MoveMask};
pub use light::{LIGHT_SIZE, Light, LightSet, MAX_LIGHTS, attenuation};
pub use tavern::{DEFAULT_LIGHT_COUNT, TavernScene};
