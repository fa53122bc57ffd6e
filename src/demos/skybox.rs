//! Skybox, environment reflection and mouse picking.
//!
//! A mirror sphere next to the tavern reflects either the static skybox or
//! a cubemap captured every frame from the sphere's center. A left click
//! renders object ids into the picking target and reads back the pixel
//! under the cursor once the frame has been submitted.

use glam::{Mat4, Vec3};

use super::{DEFAULT_CAMERA, Demo, DemoCore, DemoFeatures, DemoKind, tavern_draw};
use crate::app::input::FrameInput;
use crate::assets::{MeshAsset, ResourceCache, TextureAsset};
use crate::errors::Result;
use crate::renderer::pipeline::{
    CubemapCapturePass, DrawItem, FrameConfig, Pass, PassTarget, ProgramKind, RenderTargets,
    ScenePass, Shading, TargetName, TargetSpec, TextureSource,
};
use crate::renderer::{Device, RenderSettings};
use crate::resources::primitives::create_box;
use crate::resources::uniforms::{SceneFlags, color_to_id};
use crate::scene::{LightSet, TavernScene};

/// Face images in cube layer order: +X, -X, +Y, -Y, +Z, -Z.
pub const SKYBOX_FACES: [&str; 6] = [
    "media/right.jpg",
    "media/left.jpg",
    "media/top.jpg",
    "media/bottom.jpg",
    "media/front.jpg",
    "media/back.jpg",
];
pub const SPHERE_MESH: &str = "media/sphere.obj";
pub const SPHERE_CENTER: Vec3 = Vec3::new(-4.0, 0.0, 0.0);
const SPHERE_SCALE: f32 = 1.5;

pub const TAVERN_PICK_ID: u32 = 1;
pub const SPHERE_PICK_ID: u32 = 2;

/// Skybox cube, its cubemap and the reflective sphere.
pub struct Environment {
    cube: MeshAsset,
    sky: TextureAsset,
    sphere: Option<MeshAsset>,
}

impl Environment {
    pub fn new(device: &mut Device, cache: &mut ResourceCache) -> Self {
        let sphere = match cache.load_mesh(device, SPHERE_MESH, 1.0) {
            Ok(mesh) => Some(mesh),
            Err(e) => {
                log::warn!("Sphere mesh unavailable: {e}");
                None
            }
        };
        Self {
            cube: cache.mesh_from_data(device, "builtin:skybox", || create_box(2.0, 2.0, 2.0)),
            sky: cache.load_cubemap_or(device, &SKYBOX_FACES, [90, 110, 140, 255]),
            sphere,
        }
    }

    pub fn declare_targets(targets: &mut RenderTargets, capture_size: u32) {
        targets.declare(TargetName::Environment, TargetSpec::cubemap(capture_size));
    }

    #[must_use]
    pub fn sphere_model() -> Mat4 {
        Mat4::from_translation(SPHERE_CENTER) * Mat4::from_scale(Vec3::splat(SPHERE_SCALE))
    }

    #[must_use]
    pub fn sky_draw(&self) -> DrawItem {
        DrawItem::new(ProgramKind::Skybox, self.cube, Shading::Sky)
            .with_textures([TextureSource::Texture(self.sky.texture)])
    }

    /// The mirror sphere, reflecting the captured cubemap when dynamic
    /// reflection is on and the skybox otherwise.
    #[must_use]
    pub fn sphere_draw(&self, config: &FrameConfig) -> Option<DrawItem> {
        let reflected = if config.dynamic_reflection {
            TextureSource::color(TargetName::Environment)
        } else {
            TextureSource::Texture(self.sky.texture)
        };
        self.sphere.map(|mesh| {
            DrawItem::new(ProgramKind::Reflective, mesh, Shading::Unlit(SceneFlags::REFLECTIVE))
                .with_model(Self::sphere_model())
                .with_textures([reflected])
        })
    }

    /// Capture of `draws` plus the sky around the sphere, when dynamic
    /// reflection is on.
    #[must_use]
    pub fn capture(&self, config: &FrameConfig, mut draws: Vec<DrawItem>) -> Option<Pass> {
        config.dynamic_reflection.then(|| {
            draws.push(self.sky_draw());
            Pass::CubemapCapture(CubemapCapturePass {
                target: TargetName::Environment,
                center: SPHERE_CENTER,
                draws,
            })
        })
    }

    #[must_use]
    pub fn sphere_pick(&self) -> Option<DrawItem> {
        self.sphere.map(|mesh| {
            DrawItem::new(ProgramKind::PickId, mesh, Shading::Id(SPHERE_PICK_ID))
                .with_model(Self::sphere_model())
        })
    }
}

/// Click-to-pick state: a click requests an id pass this frame and a
/// readback after submit.
#[derive(Debug, Default)]
pub struct Picker {
    requested: Option<(u32, u32)>,
    last: Option<u32>,
}

impl Picker {
    pub fn declare_target(targets: &mut RenderTargets) {
        targets.declare(TargetName::Picking, TargetSpec::picking());
    }

    pub fn request(&mut self, input: &FrameInput) {
        if input.just_clicked {
            let cursor = input.cursor.max(glam::Vec2::ZERO);
            self.requested = Some((cursor.x as u32, cursor.y as u32));
        }
    }

    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.requested.is_some()
    }

    /// The id pass, if a pick was requested this frame.
    #[must_use]
    pub fn pass(&self, draws: Vec<DrawItem>) -> Option<Pass> {
        self.requested.map(|_| {
            Pass::Scene(ScenePass {
                label: "Picking",
                target: PassTarget::Offscreen(TargetName::Picking),
                draws,
            })
        })
    }

    /// Reads the id under the requested pixel. Id 0 is the background.
    pub fn resolve(&mut self, device: &mut Device, targets: &RenderTargets) -> Option<u32> {
        let (x, y) = self.requested.take()?;
        let framebuffer = match targets.id(TargetName::Picking) {
            Ok(id) => id,
            Err(e) => {
                log::warn!("Picking skipped: {e}");
                return None;
            }
        };
        let id = color_to_id(device.read_pixel(framebuffer, x, y)?);
        log::info!("Picked object {id} at ({x}, {y})");
        self.last = Some(id);
        Some(id)
    }

    #[must_use]
    pub fn last_picked(&self) -> Option<u32> {
        self.last
    }

    pub fn ui(&self, ui: &mut egui::Ui) {
        match self.last {
            Some(0) => ui.label("Picked: background"),
            Some(id) => ui.label(format!("Picked: object {id}")),
            None => ui.label("Left click to pick an object"),
        };
    }
}

/// The tavern drawn as a flat pick id.
pub(crate) fn tavern_pick(tavern: &TavernScene) -> Option<DrawItem> {
    tavern.mesh.map(|mesh| {
        DrawItem::new(ProgramKind::PickId, mesh, Shading::Id(TAVERN_PICK_ID))
            .with_model(tavern.model_matrix())
    })
}

pub struct SkyboxDemo {
    core: DemoCore,
    tavern: TavernScene,
    environment: Environment,
    picker: Picker,
}

impl SkyboxDemo {
    pub fn new(device: &mut Device, cache: &mut ResourceCache, settings: &RenderSettings) -> Result<Self> {
        let mut core = DemoCore::new(
            device,
            &[
                ProgramKind::Phong,
                ProgramKind::Reflective,
                ProgramKind::Skybox,
                ProgramKind::PickId,
            ],
            DEFAULT_CAMERA,
        )?;
        Environment::declare_targets(&mut core.targets, settings.capture_size);
        Picker::declare_target(&mut core.targets);
        Ok(Self {
            core,
            tavern: TavernScene::new(device, cache, settings.light_count),
            environment: Environment::new(device, cache),
            picker: Picker::default(),
        })
    }

    #[must_use]
    pub fn picker(&self) -> &Picker {
        &self.picker
    }
}

impl Demo for SkyboxDemo {
    fn kind(&self) -> DemoKind {
        DemoKind::Skybox
    }

    fn features(&self) -> DemoFeatures {
        DemoFeatures::REFLECTION | DemoFeatures::PICKING
    }

    fn core(&self) -> &DemoCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut DemoCore {
        &mut self.core
    }

    fn light_set(&self) -> Option<&LightSet> {
        Some(self.tavern.light_set())
    }

    fn light_set_mut(&mut self) -> Option<&mut LightSet> {
        Some(self.tavern.light_set_mut())
    }

    fn update(&mut self, _device: &mut Device, input: &FrameInput, _config: &FrameConfig) {
        self.picker.request(input);
    }

    fn passes(&self, config: &FrameConfig) -> Vec<Pass> {
        let tavern = tavern_draw(&self.tavern);
        let env = &self.environment;

        let mut passes = Vec::with_capacity(3);
        passes.extend(env.capture(config, tavern.iter().cloned().collect()));
        passes.extend(
            self.picker
                .pass(tavern_pick(&self.tavern).into_iter().chain(env.sphere_pick()).collect()),
        );

        let mut draws: Vec<DrawItem> = tavern.into_iter().chain(env.sphere_draw(config)).collect();
        // Last, so depth testing discards sky fragments behind geometry.
        draws.push(env.sky_draw());
        passes.push(Pass::Scene(ScenePass {
            label: "Skybox Scene",
            target: PassTarget::Default,
            draws,
        }));
        passes
    }

    fn after_submit(&mut self, device: &mut Device) {
        self.picker.resolve(device, &self.core.targets);
    }

    fn ui(&mut self, ui: &mut egui::Ui) {
        self.picker.ui(ui);
    }
}
