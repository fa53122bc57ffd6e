//! Per-frame configuration.
//!
//! The UI edits one [`FrameConfig`]; at the start of each frame the app hands
//! an immutable reference to the pipeline executor. Nothing reads a toggle
//! from anywhere else mid-frame, so an edit always takes effect on the next
//! frame as a whole.

use glam::Mat3;

use crate::resources::instancing::InstanceParams;
use crate::resources::post_process::{
    DEFAULT_BLUR_ITERATIONS, DEFAULT_BRIGHTNESS_CLAMP, DEFAULT_EXPOSURE, DEFAULT_GAMMA,
    KernelPreset,
};
use crate::resources::uniforms::PostFlags;

#[derive(Debug, Clone, PartialEq)]
pub struct FrameConfig {
    // === Tone mapping ===
    pub tone_map: bool,
    pub exposure: f32,
    pub gamma_correct: bool,
    pub gamma: f32,

    // === Bloom ===
    pub bloom: bool,
    pub brightness_clamp: f32,
    pub blur_iterations: u32,

    // === Convolution post-processing ===
    pub kernel_enabled: bool,
    pub kernel: Mat3,
    /// Kernel sample offset is `1 / ratio` in UV units on each axis.
    pub kernel_ratio: (f32, f32),
    pub invert: bool,
    pub greyscale: bool,

    // === Scene ===
    /// Recapture the environment cubemap every frame instead of using the skybox.
    pub dynamic_reflection: bool,
    pub wireframe: bool,
    pub normal_mapping: bool,
    /// Draw the asteroid ring where a demo has one.
    pub instancing_enabled: bool,
    pub instancing: InstanceParams,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            tone_map: true,
            exposure: DEFAULT_EXPOSURE,
            gamma_correct: true,
            gamma: DEFAULT_GAMMA,
            bloom: true,
            brightness_clamp: DEFAULT_BRIGHTNESS_CLAMP,
            blur_iterations: DEFAULT_BLUR_ITERATIONS,
            kernel_enabled: false,
            kernel: KernelPreset::Identity.matrix(),
            kernel_ratio: (800.0, 800.0),
            invert: false,
            greyscale: false,
            dynamic_reflection: true,
            wireframe: false,
            normal_mapping: true,
            instancing_enabled: true,
            instancing: InstanceParams::default(),
        }
    }
}

impl FrameConfig {
    /// Composite stages enabled by this configuration. `with_bloom` is
    /// false for pipelines without a blur chain.
    #[must_use]
    pub fn post_flags(&self, with_bloom: bool) -> PostFlags {
        let mut flags = PostFlags::empty();
        flags.set(PostFlags::BLOOM, with_bloom && self.bloom);
        flags.set(PostFlags::TONE_MAP, self.tone_map);
        flags.set(PostFlags::GAMMA, self.gamma_correct);
        flags.set(PostFlags::KERNEL, self.kernel_enabled);
        flags.set(PostFlags::INVERT, self.invert);
        flags.set(PostFlags::GREYSCALE, self.greyscale);
        flags
    }
}
