//! Instanced asteroid ring.
//!
//! Instance matrices are regenerated on the CPU every frame (the ring
//! drifts) and streamed into one vertex buffer that is only reallocated
//! when the instance count outgrows it.

use glam::{Vec3, Vec4};

use super::{Demo, DemoCore, DemoFeatures, DemoKind};
use crate::app::input::FrameInput;
use crate::assets::{MeshAsset, ResourceCache, TextureAsset, TextureFlags};
use crate::errors::Result;
use crate::renderer::Device;
use crate::renderer::backend::{BufferDesc, BufferUsage, InstanceSource};
use crate::renderer::handles::BufferHandle;
use crate::renderer::pipeline::{
    DrawItem, FrameConfig, Pass, PassTarget, ProgramKind, ScenePass, Shading, TextureSource,
};
use crate::resources::instancing::{InstanceField, InstanceParams};
use crate::resources::uniforms::SceneFlags;
use crate::scene::{Camera, Light, LightSet};

pub const ROCK_MESH: &str = "media/rock.obj";
pub const ROCK_TEXTURE: &str = "media/rock.png";

const INSTANCE_SEED: u64 = 0x5EED_0500;
const MATRIX_SIZE: usize = 64;

/// The rock mesh, its texture and the streamed instance buffer.
pub struct AsteroidField {
    mesh: Option<MeshAsset>,
    diffuse: TextureAsset,
    emissive: TextureAsset,
    field: InstanceField,
    buffer: Option<BufferHandle>,
    /// Instances the current buffer can hold.
    capacity: u32,
    count: u32,
}

impl AsteroidField {
    pub fn new(device: &mut Device, cache: &mut ResourceCache) -> Self {
        let mesh = match cache.load_mesh(device, ROCK_MESH, 1.0) {
            Ok(mesh) => Some(mesh),
            Err(e) => {
                log::warn!("Asteroid mesh unavailable: {e}");
                None
            }
        };
        Self {
            mesh,
            diffuse: cache.load_texture_or(
                device,
                ROCK_TEXTURE,
                TextureFlags::FLIP | TextureFlags::GEN_MIPMAPS,
                [255; 4],
            ),
            emissive: cache.solid_texture(device, [0, 0, 0, 255]),
            field: InstanceField::new(INSTANCE_SEED),
            buffer: None,
            capacity: 0,
            count: 0,
        }
    }

    /// Advances the ring and uploads this frame's matrices.
    pub fn update(&mut self, device: &mut Device, params: &InstanceParams) {
        let matrices = self.field.update(params);
        let count = matrices.len() as u32;
        let bytes: &[u8] = bytemuck::cast_slice(matrices);

        let reusable = self.buffer.as_ref().filter(|_| count <= self.capacity).map(BufferHandle::id);
        if let Some(buffer) = reusable {
            if !bytes.is_empty() {
                device.write_buffer(buffer, 0, bytes);
            }
        } else {
            // Release the old buffer before allocating the larger one.
            self.buffer = None;
            let size = bytes.len().max(MATRIX_SIZE) as u64;
            self.buffer = Some(device.create_buffer(
                &BufferDesc {
                    label: "Asteroid Instances",
                    usage: BufferUsage::VERTEX,
                    size,
                },
                Some(bytes),
            ));
            self.capacity = count.max(1);
            log::debug!("Instance buffer reallocated for {count} asteroids");
        }
        self.count = count;
    }

    #[must_use]
    pub fn instance_count(&self) -> u32 {
        self.count
    }

    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    #[must_use]
    pub fn field(&self) -> &InstanceField {
        &self.field
    }

    /// Nothing to draw before the first update or without a mesh.
    #[must_use]
    pub fn draw(&self) -> Option<DrawItem> {
        let (mesh, buffer) = (self.mesh?, self.buffer.as_ref()?);
        (self.count > 0).then(|| {
            DrawItem::new(
                ProgramKind::PhongInstanced,
                mesh,
                Shading::Lit(SceneFlags::empty()),
            )
            .with_textures([
                TextureSource::Texture(self.diffuse.texture),
                TextureSource::Texture(self.emissive.texture),
            ])
            .with_instances(InstanceSource {
                buffer: buffer.id(),
                count: self.count,
            })
        })
    }
}

pub struct InstancingDemo {
    core: DemoCore,
    asteroids: AsteroidField,
    lights: LightSet,
}

impl InstancingDemo {
    pub fn new(device: &mut Device, cache: &mut ResourceCache) -> Result<Self> {
        let camera = Camera::new(Vec3::new(0.0, 4.0, 30.0), 0.0, -0.15);
        let core = DemoCore::new(device, &[ProgramKind::PhongInstanced], camera)?;
        // A single directional light standing in for the sun.
        let lights = LightSet::new(device, vec![Light::point(Vec4::new(0.0, 0.0, 1.0, 0.0))]);
        Ok(Self {
            core,
            asteroids: AsteroidField::new(device, cache),
            lights,
        })
    }
}

impl Demo for InstancingDemo {
    fn kind(&self) -> DemoKind {
        DemoKind::Instancing
    }

    fn features(&self) -> DemoFeatures {
        DemoFeatures::INSTANCING
    }

    fn core(&self) -> &DemoCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut DemoCore {
        &mut self.core
    }

    fn light_set(&self) -> Option<&LightSet> {
        Some(&self.lights)
    }

    fn light_set_mut(&mut self) -> Option<&mut LightSet> {
        Some(&mut self.lights)
    }

    fn update(&mut self, device: &mut Device, _input: &FrameInput, config: &FrameConfig) {
        self.asteroids.update(device, &config.instancing);
    }

    fn passes(&self, _config: &FrameConfig) -> Vec<Pass> {
        vec![Pass::Scene(ScenePass {
            label: "Asteroids",
            target: PassTarget::Default,
            draws: self.asteroids.draw().into_iter().collect(),
        })]
    }
}
