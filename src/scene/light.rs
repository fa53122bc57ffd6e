//! GPU-layout light record and the light array shared by a scene's passes.

use glam::{Vec3, Vec4};

use crate::errors::{Result, TavernError};
use crate::renderer::Device;
use crate::renderer::backend::{BufferDesc, BufferId, BufferUsage};
use crate::renderer::handles::BufferHandle;
use crate::renderer::pipeline::LightBlock;

/// One light as stored in the light uniform block (std140, 96 bytes).
///
/// `position.w` selects the kind: `1.0` is a point light at `position.xyz`,
/// `0.0` is a directional light shining along `-position.xyz`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Light {
    pub enabled: u32,
    _pad0: [u32; 3],
    pub position: [f32; 4],
    pub ambient: [f32; 3],
    _pad1: f32,
    pub diffuse: [f32; 3],
    _pad2: f32,
    pub specular: [f32; 3],
    _pad3: f32,
    /// Constant, linear and quadratic coefficients.
    pub attenuation: [f32; 3],
    _pad4: f32,
}

pub const LIGHT_SIZE: usize = std::mem::size_of::<Light>();
/// Capacity of the light block declared by the shaders.
pub const MAX_LIGHTS: usize = 8;
const _: () = assert!(LIGHT_SIZE == 96);

impl Default for Light {
    fn default() -> Self {
        Self::point(Vec4::new(0.0, 2.0, 0.0, 1.0))
    }
}

impl Light {
    /// An enabled light with the default white colors and no falloff.
    #[must_use]
    pub fn point(position: Vec4) -> Self {
        Self {
            enabled: 1,
            _pad0: [0; 3],
            position: position.to_array(),
            ambient: [0.2; 3],
            _pad1: 0.0,
            diffuse: [1.0; 3],
            _pad2: 0.0,
            specular: [0.0; 3],
            _pad3: 0.0,
            attenuation: [1.0, 0.0, 0.0],
            _pad4: 0.0,
        }
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: 0,
            ..Self::default()
        }
    }

    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled != 0
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = u32::from(enabled);
    }

    #[must_use]
    pub fn position(&self) -> Vec4 {
        Vec4::from_array(self.position)
    }

    /// Distance falloff factor `1 / (c + l·d + q·d²)`.
    #[must_use]
    pub fn attenuation_at(&self, distance: f32) -> f32 {
        let [c, l, q] = self.attenuation;
        attenuation(Vec3::new(c, l, q), distance)
    }
}

/// `1 / (c + l·d + q·d²)` for coefficients `(c, l, q)`.
#[must_use]
pub fn attenuation(coefficients: Vec3, distance: f32) -> f32 {
    let denom = coefficients.x + coefficients.y * distance + coefficients.z * distance * distance;
    if denom <= 0.0 { 1.0 } else { 1.0 / denom }
}

/// A fixed array of lights mirrored in one uniform buffer.
///
/// The buffer always spans [`MAX_LIGHTS`] slots so shaders can bind it
/// whatever the light count; slots past [`len`](Self::len) stay zeroed
/// (disabled).
pub struct LightSet {
    lights: Vec<Light>,
    buffer: BufferHandle,
}

impl LightSet {
    /// Uploads `lights` once. Anything past [`MAX_LIGHTS`] is dropped.
    pub fn new(device: &mut Device, mut lights: Vec<Light>) -> Self {
        if lights.len() > MAX_LIGHTS {
            log::warn!("{} lights requested, the light block holds {MAX_LIGHTS}", lights.len());
            lights.truncate(MAX_LIGHTS);
        }
        let bytes: &[u8] = bytemuck::cast_slice(&lights);
        let buffer = device.create_buffer(
            &BufferDesc {
                label: "Light Block",
                usage: BufferUsage::UNIFORM,
                size: (MAX_LIGHTS * LIGHT_SIZE) as u64,
            },
            Some(bytes),
        );
        Self { lights, buffer }
    }

    /// `count` lights: light 0 is the default light, the rest start disabled.
    pub fn with_default(device: &mut Device, count: usize) -> Self {
        let mut lights = vec![Light::disabled(); count];
        if let Some(first) = lights.first_mut() {
            *first = Light::default();
        }
        Self::new(device, lights)
    }

    #[inline]
    #[must_use]
    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.lights.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn buffer(&self) -> BufferId {
        self.buffer.id()
    }

    /// The array as bound by lit passes.
    #[must_use]
    pub fn block(&self) -> LightBlock {
        LightBlock {
            buffer: self.buffer.id(),
            count: self.lights.len(),
        }
    }

    /// Replaces light `index`. Returns whether anything changed; if so, only
    /// that light's 96-byte slot of the GPU buffer is rewritten.
    pub fn edit(&mut self, device: &mut Device, index: usize, light: Light) -> Result<bool> {
        let count = self.lights.len();
        let slot = self
            .lights
            .get_mut(index)
            .ok_or(TavernError::LightIndexOutOfRange { index, count })?;
        if *slot == light {
            return Ok(false);
        }
        *slot = light;
        device.write_buffer(self.buffer.id(), (index * LIGHT_SIZE) as u64, bytemuck::bytes_of(slot));
        log::debug!("Light {index} updated");
        Ok(true)
    }
}
