//! Tangent-space normal mapping on a brick quad and the backpack model.

use glam::{Mat4, Vec3, Vec4};

use super::{Demo, DemoCore, DemoFeatures, DemoKind};
use crate::assets::{MeshAsset, ResourceCache, TextureAsset, TextureFlags};
use crate::errors::Result;
use crate::renderer::Device;
use crate::renderer::pipeline::{
    DrawItem, FrameConfig, Pass, PassTarget, ProgramKind, ScenePass, Shading, TextureSource,
};
use crate::resources::primitives::create_plane;
use crate::resources::uniforms::SceneFlags;
use crate::scene::{Camera, Light, LightSet};

pub const BRICK_DIFFUSE: &str = "media/brick.png";
pub const BRICK_NORMAL: &str = "media/bricknormal.png";
pub const BAG_MESH: &str = "media/bag/bag.obj";
pub const BAG_DIFFUSE: &str = "media/bag/bag_diffuse.jpg";
pub const BAG_NORMAL: &str = "media/bag/bag_normal.png";

const TEXTURE_FLAGS: TextureFlags = TextureFlags::FLIP.union(TextureFlags::GEN_MIPMAPS);
/// Tangent-space "straight up", used when a normal map is missing.
const FLAT_NORMAL: [u8; 4] = [128, 128, 255, 255];

/// Translation, XYZ Euler rotation in degrees and uniform scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelTransform {
    pub position: Vec3,
    pub rotation_degrees: Vec3,
    pub scale: f32,
}

impl Default for ModelTransform {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, -2.0),
            rotation_degrees: Vec3::ZERO,
            scale: 0.01,
        }
    }
}

impl ModelTransform {
    /// `T · Rx · Ry · Rz · S`.
    #[must_use]
    pub fn matrix(&self) -> Mat4 {
        let r = self.rotation_degrees;
        Mat4::from_translation(self.position)
            * Mat4::from_rotation_x(r.x.to_radians())
            * Mat4::from_rotation_y(r.y.to_radians())
            * Mat4::from_rotation_z(r.z.to_radians())
            * Mat4::from_scale(Vec3::splat(self.scale))
    }
}

struct NormalMapped {
    mesh: Option<MeshAsset>,
    diffuse: TextureAsset,
    normal: TextureAsset,
}

impl NormalMapped {
    fn draw(&self, model: Mat4, flags: SceneFlags) -> Option<DrawItem> {
        self.mesh.map(|mesh| {
            DrawItem::new(ProgramKind::NormalMapped, mesh, Shading::Lit(flags))
                .with_model(model)
                .with_textures([
                    TextureSource::Texture(self.diffuse.texture),
                    TextureSource::Texture(self.normal.texture),
                ])
        })
    }
}

pub struct NormalMappingDemo {
    core: DemoCore,
    quad: NormalMapped,
    bag: NormalMapped,
    lights: LightSet,
    pub transform: ModelTransform,
}

impl NormalMappingDemo {
    pub fn new(device: &mut Device, cache: &mut ResourceCache) -> Result<Self> {
        let core = DemoCore::new(device, &[ProgramKind::NormalMapped], Camera::default())?;

        let quad = NormalMapped {
            mesh: Some(cache.mesh_from_data(device, "builtin:quad", || create_plane(2.0))),
            diffuse: cache.load_texture_or(device, BRICK_DIFFUSE, TEXTURE_FLAGS, [255; 4]),
            normal: cache.load_texture_or(device, BRICK_NORMAL, TEXTURE_FLAGS, FLAT_NORMAL),
        };
        let bag = NormalMapped {
            mesh: match cache.load_mesh(device, BAG_MESH, 1.0) {
                Ok(mesh) => Some(mesh),
                Err(e) => {
                    log::warn!("Backpack mesh unavailable: {e}");
                    None
                }
            },
            diffuse: cache.load_texture_or(device, BAG_DIFFUSE, TEXTURE_FLAGS, [255; 4]),
            normal: cache.load_texture_or(device, BAG_NORMAL, TEXTURE_FLAGS, FLAT_NORMAL),
        };

        let lights = LightSet::new(device, vec![Light::point(Vec4::new(0.0, 0.0, -1.5, 1.0))]);
        Ok(Self {
            core,
            quad,
            bag,
            lights,
            transform: ModelTransform::default(),
        })
    }
}

impl Demo for NormalMappingDemo {
    fn kind(&self) -> DemoKind {
        DemoKind::NormalMapping
    }

    fn features(&self) -> DemoFeatures {
        DemoFeatures::NORMAL_MAP
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

    fn passes(&self, config: &FrameConfig) -> Vec<Pass> {
        let flags = if config.normal_mapping {
            SceneFlags::NORMAL_MAP
        } else {
            SceneFlags::empty()
        };
        let quad_model = Mat4::from_translation(Vec3::new(-2.5, 0.0, -2.0));
        let draws = self
            .quad
            .draw(quad_model, flags)
            .into_iter()
            .chain(self.bag.draw(self.transform.matrix(), flags))
            .collect();
        vec![Pass::Scene(ScenePass {
            label: "Normal Mapping",
            target: PassTarget::Default,
            draws,
        })]
    }

    fn ui(&mut self, ui: &mut egui::Ui) {
        egui::CollapsingHeader::new("Object").show(ui, |ui| {
            let t = &mut self.transform;
            ui.horizontal(|ui| {
                ui.label("Position");
                ui.add(egui::DragValue::new(&mut t.position.x).speed(0.05));
                ui.add(egui::DragValue::new(&mut t.position.y).speed(0.05));
                ui.add(egui::DragValue::new(&mut t.position.z).speed(0.05));
            });
            ui.horizontal(|ui| {
                ui.label("Rotation");
                ui.add(egui::DragValue::new(&mut t.rotation_degrees.x).suffix("°"));
                ui.add(egui::DragValue::new(&mut t.rotation_degrees.y).suffix("°"));
                ui.add(egui::DragValue::new(&mut t.rotation_degrees.z).suffix("°"));
            });
            ui.add(
                egui::DragValue::new(&mut t.scale)
                    .speed(0.01)
                    .range(0.01..=100.0)
                    .prefix("Scale: "),
            );
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_scales_before_translating() {
        let t = ModelTransform {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation_degrees: Vec3::ZERO,
            scale: 2.0,
        };
        let p = t.matrix().transform_point3(Vec3::X);
        assert!((p - Vec3::new(3.0, 2.0, 3.0)).length() < 1e-5);
    }
}
