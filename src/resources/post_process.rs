//! Post-Processing Math
//!
//! CPU rendition of everything the bloom, blur and composite shaders
//! compute, plus the parameters they share with the UI. The WGSL in
//! `renderer/pipeline/shaders` implements exactly these functions; the
//! [`HeadlessBackend`](crate::renderer::backend::HeadlessBackend) runs them
//! on every recorded bright-pass, blur and composite draw.
//!
//! # Composite order
//!
//! ```text
//! resolve(c)  = gamma(tone_map(scene + bloom))
//! kernel      = Σ k[i] · resolve(sample[i])      (3x3 neighbourhood)
//! invert      = 1 - kernel
//! greyscale   = avg(r, g, b)
//! ```
//!
//! Each stage is skipped when its toggle is off; the order never changes.

use glam::{Mat3, Vec3, Vec4};

use crate::resources::uniforms::{PostFlags, PostUniforms};

/// Separable Gaussian weights, center tap first.
pub const BLUR_WEIGHTS: [f32; 5] = [0.227_027, 0.194_595, 0.121_622, 0.054_054, 0.016_216];

/// Perceptual luminance weights.
pub const LUMINANCE: Vec3 = Vec3::new(0.2126, 0.7152, 0.0722);

pub const DEFAULT_EXPOSURE: f32 = 1.0;
pub const DEFAULT_GAMMA: f32 = 2.2;
pub const DEFAULT_BRIGHTNESS_CLAMP: f32 = 0.5;
pub const DEFAULT_BLUR_ITERATIONS: u32 = 8;

// ============================================================================
// Tone mapping and bloom
// ============================================================================

#[inline]
#[must_use]
pub fn luminance(color: Vec3) -> f32 {
    color.dot(LUMINANCE)
}

/// What a bloom-producing pass writes to its bright attachment: the color
/// itself when brighter than `clamp`, opaque black otherwise.
#[must_use]
pub fn bloom_threshold(color: Vec3, clamp: f32) -> Vec4 {
    if luminance(color) > clamp {
        color.extend(1.0)
    } else {
        Vec4::new(0.0, 0.0, 0.0, 1.0)
    }
}

/// Exponential tone map `1 - exp(-c · exposure)`.
#[must_use]
pub fn tone_map(color: Vec3, exposure: f32) -> Vec3 {
    Vec3::ONE - (-color * exposure).exp()
}

/// Gamma encode `c^(1/gamma)`.
#[must_use]
pub fn gamma_correct(color: Vec3, gamma: f32) -> Vec3 {
    color.powf(1.0 / gamma)
}

/// Tone map then gamma, each optional.
#[must_use]
pub fn resolve(color: Vec3, exposure: Option<f32>, gamma: Option<f32>) -> Vec3 {
    let mapped = exposure.map_or(color, |e| tone_map(color, e));
    gamma.map_or(mapped, |g| gamma_correct(mapped, g))
}

#[must_use]
pub fn invert(color: Vec3) -> Vec3 {
    Vec3::ONE - color
}

#[must_use]
pub fn greyscale(color: Vec3) -> Vec3 {
    Vec3::splat((color.x + color.y + color.z) / 3.0)
}

/// Weighted sum of a 3x3 neighbourhood. `samples[i * 3 + j]` pairs with
/// column `i`, row `j` of `kernel`.
#[must_use]
pub fn convolve(kernel: &Mat3, samples: &[Vec3; 9]) -> Vec3 {
    let k = kernel.to_cols_array();
    samples.iter().zip(k).map(|(s, w)| *s * w).sum()
}

/// One composited texel, driven by the packed composite uniforms.
///
/// `scene` and `bloom` are the 3x3 neighbourhoods around the texel, laid out
/// like [`convolve`] expects; without the kernel stage only the centre
/// (`[4]`) is read.
#[must_use]
pub fn composite(post: &PostUniforms, scene: &[Vec3; 9], bloom: &[Vec3; 9]) -> Vec3 {
    let flags = PostFlags::from_bits_truncate(post.flags.x);
    let exposure = flags.contains(PostFlags::TONE_MAP).then_some(post.params.z);
    let gamma = flags.contains(PostFlags::GAMMA).then_some(post.params.w);
    let resolved: [Vec3; 9] = std::array::from_fn(|i| {
        let mut color = scene[i];
        if flags.contains(PostFlags::BLOOM) {
            color += bloom[i];
        }
        resolve(color, exposure, gamma)
    });

    let mut color = if flags.contains(PostFlags::KERNEL) {
        convolve(&post.kernel_matrix(), &resolved)
    } else {
        resolved[4]
    };
    if flags.contains(PostFlags::INVERT) {
        color = invert(color);
    }
    if flags.contains(PostFlags::GREYSCALE) {
        color = greyscale(color);
    }
    color
}

// ============================================================================
// Blur ping-pong schedule
// ============================================================================

/// One step of the separable blur chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlurStep {
    /// Ping-pong target written by this step.
    pub target: usize,
    /// `None` reads the bloom source; `Some(i)` reads ping-pong target `i`.
    pub source: Option<usize>,
    pub horizontal: bool,
}

/// The `iterations` steps of the ping-pong chain.
///
/// The first step writes target 1 from the bloom source; each later step
/// reads what the previous one wrote and writes the other target.
pub fn blur_schedule(iterations: u32) -> impl Iterator<Item = BlurStep> {
    (0..iterations as usize).map(|i| {
        let target = 1 - i % 2;
        BlurStep {
            target,
            source: (i > 0).then_some(1 - target),
            horizontal: target == 1,
        }
    })
}

/// The ping-pong target holding the result after `iterations` steps,
/// which is `iterations mod 2`.
#[must_use]
pub fn blur_last_written(iterations: u32) -> usize {
    (iterations % 2) as usize
}

/// Texel offsets and weights of the blur taps along one axis, center
/// included once.
#[must_use]
pub fn blur_taps(weights: &[f32; 5]) -> [(i32, f32); 9] {
    let mut taps = [(0, weights[0]); 9];
    for (i, &weight) in weights.iter().enumerate().skip(1) {
        taps[2 * i - 1] = (i as i32, weight);
        taps[2 * i] = (-(i as i32), weight);
    }
    taps
}

// ============================================================================
// Convolution kernels
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KernelPreset {
    #[default]
    Identity,
    BoxBlur,
    EdgeDetectA,
    EdgeDetectB,
    Emboss,
}

impl KernelPreset {
    pub const ALL: [Self; 5] = [
        Self::Identity,
        Self::BoxBlur,
        Self::EdgeDetectA,
        Self::EdgeDetectB,
        Self::Emboss,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Identity => "Identity",
            Self::BoxBlur => "Box blur",
            Self::EdgeDetectA => "Edge detect A",
            Self::EdgeDetectB => "Edge detect B",
            Self::Emboss => "Emboss",
        }
    }

    #[must_use]
    pub fn matrix(self) -> Mat3 {
        let around = |value: f32, center: f32| {
            Mat3::from_cols_array(&[
                value, value, value, //
                value, center, value, //
                value, value, value,
            ])
        };
        match self {
            Self::Identity => around(0.0, 1.0),
            Self::BoxBlur => around(1.0 / 9.0, 1.0 / 9.0),
            Self::EdgeDetectA => around(2.0, -15.0),
            Self::EdgeDetectB => around(2.0, -16.0),
            Self::Emboss => Mat3::from_cols_array(&[
                -2.0, -1.0, 0.0, //
                -1.0, 1.0, 1.0, //
                0.0, 1.0, 2.0,
            ]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blur_weights_sum_to_one_over_both_sides() {
        let total: f32 = blur_taps(&BLUR_WEIGHTS).iter().map(|(_, w)| w).sum();
        assert!((total - 1.0).abs() < 1e-3, "{total}");
    }

    #[test]
    fn schedule_alternates_and_chains() {
        let steps: Vec<_> = blur_schedule(4).collect();
        assert_eq!(steps[0], BlurStep { target: 1, source: None, horizontal: true });
        assert_eq!(steps[1], BlurStep { target: 0, source: Some(1), horizontal: false });
        assert_eq!(steps[2].source, Some(0));
        assert_eq!(steps.last().map(|s| s.target), Some(blur_last_written(4)));
    }

    #[test]
    fn identity_kernel_returns_center() {
        let mut samples = [Vec3::ZERO; 9];
        samples[4] = Vec3::new(0.3, 0.6, 0.9);
        assert_eq!(convolve(&KernelPreset::Identity.matrix(), &samples), samples[4]);
    }

    #[test]
    fn greyscale_averages() {
        assert_eq!(greyscale(Vec3::new(0.0, 0.3, 0.6)), Vec3::splat(0.3));
    }
}
