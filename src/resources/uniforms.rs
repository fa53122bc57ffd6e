//! Uniform block layouts.
//!
//! Each struct is `#[repr(C)]` with explicit padding so its bytes can be
//! copied straight into a std140 / WGSL uniform block. Matrices are
//! column-major. The matching WGSL structs live next to the shaders.

use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, UVec4, Vec3, Vec4};

/// A uniform block the executor can pack into a draw call.
pub trait UniformBlock: Pod {
    fn to_bytes(&self) -> Vec<u8> {
        bytemuck::bytes_of(self).to_vec()
    }
}

/// Inverse-transpose of `model`, recomputed for every draw.
#[must_use]
pub fn normal_matrix(model: &Mat4) -> Mat4 {
    model.inverse().transpose()
}

bitflags! {
    /// Switches read by the scene shaders (`SceneUniforms::flags.x`).
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct SceneFlags: u32 {
        /// Write the bright-pass color to the second attachment.
        const BLOOM_OUTPUT  = 1 << 0;
        /// Perturb normals with the normal map in texture slot 1.
        const NORMAL_MAP    = 1 << 1;
        /// Reflect the environment cubemap instead of shading.
        const REFLECTIVE    = 1 << 2;
    }
}

bitflags! {
    /// Composite stages (`PostUniforms::flags.x`). Applied in declaration order.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct PostFlags: u32 {
        const BLOOM     = 1 << 0;
        const TONE_MAP  = 1 << 1;
        const GAMMA     = 1 << 2;
        const KERNEL    = 1 << 3;
        const INVERT    = 1 << 4;
        const GREYSCALE = 1 << 5;
    }
}

// ============================================================================
// Scene
// ============================================================================

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SceneUniforms {
    pub projection: Mat4,
    pub view: Mat4,
    pub model: Mat4,
    pub normal_matrix: Mat4,
    /// Camera position in world space, `w = 1`.
    pub view_position: Vec4,
    /// `x`: bloom brightness clamp, `y`: number of lights.
    pub params: Vec4,
    /// `x`: [`SceneFlags`].
    pub flags: UVec4,
}

impl UniformBlock for SceneUniforms {}

impl SceneUniforms {
    #[must_use]
    pub fn new(projection: Mat4, view: Mat4, model: Mat4, eye: Vec3) -> Self {
        Self {
            projection,
            view,
            model,
            normal_matrix: normal_matrix(&model),
            view_position: eye.extend(1.0),
            params: Vec4::ZERO,
            flags: UVec4::ZERO,
        }
    }

    #[must_use]
    pub fn with_lighting(mut self, light_count: usize, brightness_clamp: f32) -> Self {
        self.params.x = brightness_clamp;
        self.params.y = light_count as f32;
        self
    }

    #[must_use]
    pub fn with_flags(mut self, flags: SceneFlags) -> Self {
        self.flags.x = flags.bits();
        self
    }
}

/// Skybox: the view must already have its translation removed.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SkyUniforms {
    pub projection: Mat4,
    pub view: Mat4,
}

impl UniformBlock for SkyUniforms {}

/// Object-id pass used for picking.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct IdUniforms {
    pub projection: Mat4,
    pub view: Mat4,
    pub model: Mat4,
    pub color: Vec4,
}

impl UniformBlock for IdUniforms {}

/// RGB encoding of a pick id: `id = r + g·256 + b·65536`.
#[must_use]
pub fn id_to_color(id: u32) -> Vec4 {
    Vec4::new(
        (id & 0xff) as f32 / 255.0,
        ((id >> 8) & 0xff) as f32 / 255.0,
        ((id >> 16) & 0xff) as f32 / 255.0,
        1.0,
    )
}

#[must_use]
pub fn color_to_id(rgba: [u8; 4]) -> u32 {
    u32::from(rgba[0]) | u32::from(rgba[1]) << 8 | u32::from(rgba[2]) << 16
}

// ============================================================================
// Post processing
// ============================================================================

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct BlurUniforms {
    /// `x`: 1 for a horizontal pass, 0 for vertical.
    pub direction: UVec4,
    /// The five weights, center first, packed into `[w0..w3], [w4, 0, 0, 0]`.
    pub weights: [Vec4; 2],
}

impl UniformBlock for BlurUniforms {}

impl BlurUniforms {
    #[must_use]
    pub fn new(horizontal: bool, weights: &[f32; 5]) -> Self {
        Self {
            direction: UVec4::new(u32::from(horizontal), 0, 0, 0),
            weights: [
                Vec4::new(weights[0], weights[1], weights[2], weights[3]),
                Vec4::new(weights[4], 0.0, 0.0, 0.0),
            ],
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PostUniforms {
    /// Columns of the 3x3 kernel, each padded to a `vec4`.
    pub kernel: [Vec4; 3],
    /// `x, y`: kernel offset ratio (offset = 1 / ratio), `z`: exposure, `w`: gamma.
    pub params: Vec4,
    /// `x`: [`PostFlags`].
    pub flags: UVec4,
}

impl UniformBlock for PostUniforms {}

impl PostUniforms {
    #[must_use]
    pub fn new(kernel: &Mat3, ratio: (f32, f32), exposure: f32, gamma: f32, flags: PostFlags) -> Self {
        Self {
            kernel: [
                kernel.x_axis.extend(0.0),
                kernel.y_axis.extend(0.0),
                kernel.z_axis.extend(0.0),
            ],
            params: Vec4::new(ratio.0, ratio.1, exposure, gamma),
            flags: UVec4::new(flags.bits(), 0, 0, 0),
        }
    }

    #[must_use]
    pub fn kernel_matrix(&self) -> Mat3 {
        Mat3::from_cols(
            self.kernel[0].truncate(),
            self.kernel[1].truncate(),
            self.kernel[2].truncate(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_sizes_are_vec4_aligned() {
        assert_eq!(std::mem::size_of::<SceneUniforms>(), 4 * 64 + 3 * 16);
        assert_eq!(std::mem::size_of::<BlurUniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<PostUniforms>(), 80);
    }

    #[test]
    fn pick_ids_round_trip_through_color() {
        let id = 0x01_02_03;
        let color = id_to_color(id);
        let bytes = color.to_array().map(|c| (c * 255.0).round() as u8);
        assert_eq!(color_to_id(bytes), id);
    }

    #[test]
    fn normal_matrix_of_uniform_scale_keeps_direction() {
        let model = Mat4::from_scale(Vec3::splat(2.0));
        let n = normal_matrix(&model).transform_vector3(Vec3::Y);
        assert!((n.normalize() - Vec3::Y).length() < 1e-6);
    }
}
