//! Renderer Settings
//!
//! Startup configuration of the GPU backend and of the values every demo
//! shares (projection, light count, capture resolution). Per-frame tunables
//! live in [`FrameConfig`](super::pipeline::FrameConfig) instead.
//!
//! ```rust,ignore
//! use tavern::renderer::RenderSettings;
//!
//! let settings = RenderSettings {
//!     vsync: false,
//!     light_count: 4,
//!     ..Default::default()
//! };
//! ```

use glam::Mat4;

/// Color format of offscreen HDR targets.
pub const HDR_TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// Perspective projection parameters. Depth maps to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            fov_degrees: 60.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl Projection {
    #[must_use]
    pub fn matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), aspect.max(1e-4), self.near, self.far)
    }

    /// 90° square projection for one cubemap face.
    ///
    /// Y is mirrored: cube sampling expects faces stored with image rows
    /// top-down, opposite to the framebuffer's clip space.
    #[must_use]
    pub fn cube_face_matrix(&self) -> Mat4 {
        Mat4::from_scale(glam::Vec3::new(1.0, -1.0, 1.0))
            * Mat4::perspective_rh(90f32.to_radians(), 1.0, self.near, self.far)
    }
}

// ---------------------------------------------------------------------------
// RenderSettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub vsync: bool,

    pub power_preference: wgpu::PowerPreference,

    /// Lights in every scene's light block.
    pub light_count: usize,

    /// Edge length in pixels of environment capture faces.
    pub capture_size: u32,

    pub projection: Projection,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            vsync: true,
            power_preference: wgpu::PowerPreference::HighPerformance,
            light_count: crate::scene::DEFAULT_LIGHT_COUNT,
            capture_size: 128,
            projection: Projection::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    #[test]
    fn near_plane_maps_to_zero_depth() {
        let proj = Projection::default().matrix(1.0);
        let clip = proj * Vec4::new(0.0, 0.0, -0.1, 1.0);
        assert!((clip.z / clip.w).abs() < 1e-5);
    }

    #[test]
    fn cube_face_projection_flips_y() {
        let p = Projection::default();
        let point = Vec4::new(0.0, 1.0, -1.0, 1.0);
        let regular = Mat4::perspective_rh(90f32.to_radians(), 1.0, p.near, p.far) * point;
        let face = p.cube_face_matrix() * point;
        assert!((face.y + regular.y).abs() < 1e-6);
    }
}
