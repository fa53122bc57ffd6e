//! Demo Catalogue
//!
//! Every demo is a [`Demo`]: it owns its camera, compiled programs and
//! offscreen targets ([`DemoCore`]), keeps its own scene objects, and
//! describes each frame as a pass list for the shared
//! [`PassExecutor`](crate::renderer::pipeline::PassExecutor).
//!
//! | Demo | Passes |
//! |------|--------|
//! | base | Scene → default |
//! | hdr | Scene → HDR; Composite (tone map, gamma) |
//! | bloom | Scene (MRT) → Blur × N → Composite (bloom, tone map, gamma) |
//! | framebuffer | Scene → offscreen; Composite (kernel, invert, greyscale) |
//! | instancing | Scene (asteroid ring) → default |
//! | normal_mapping | Scene (quad, bag) → default |
//! | skybox | [Capture] → [Pick] → Scene (tavern, sphere, sky) → default |
//! | full | [Capture] → [Pick] → Scene (MRT) → Blur × N → Composite |
//!
//! Demos are created through [`DemoKind::create`]; switching demos drops
//! the previous one, which releases its programs and targets.

mod base;
mod bloom;
mod framebuffer;
mod full;
mod hdr;
mod instancing;
mod normal_mapping;
mod skybox;

pub use base::BaseDemo;
pub use bloom::BloomDemo;
pub use framebuffer::FramebufferDemo;
pub use full::FullDemo;
pub use hdr::HdrDemo;
pub use instancing::{AsteroidField, InstancingDemo};
pub use normal_mapping::{ModelTransform, NormalMappingDemo};
pub use skybox::{Environment, Picker, SPHERE_CENTER, SPHERE_PICK_ID, SkyboxDemo, TAVERN_PICK_ID};

use bitflags::bitflags;
use glam::Vec3;

use crate::app::input::FrameInput;
use crate::assets::ResourceCache;
use crate::errors::Result;
use crate::renderer::pipeline::{
    DrawItem, FrameConfig, LightBlock, Pass, ProgramKind, ProgramLibrary, RenderTargets, Shading,
    TextureSource,
};
use crate::renderer::{Device, RenderSettings};
use crate::resources::uniforms::SceneFlags;
use crate::scene::{Camera, CameraMode, LightSet, TavernScene};

bitflags! {
    /// Which [`FrameConfig`] sections a demo reads. Also decides which UI
    /// panels are shown.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct DemoFeatures: u32 {
        const TONE_MAP   = 1 << 0;
        const BLOOM      = 1 << 1;
        const KERNEL     = 1 << 2;
        const REFLECTION = 1 << 3;
        const INSTANCING = 1 << 4;
        const NORMAL_MAP = 1 << 5;
        const PICKING    = 1 << 6;
    }
}

impl DemoFeatures {
    /// `config` with every toggle this demo does not support switched off,
    /// so the executor never applies a stage the demo's passes lack.
    #[must_use]
    pub fn mask(self, config: &FrameConfig) -> FrameConfig {
        let mut masked = config.clone();
        if !self.contains(Self::TONE_MAP) {
            masked.tone_map = false;
            masked.gamma_correct = false;
        }
        if !self.contains(Self::BLOOM) {
            masked.bloom = false;
        }
        if !self.contains(Self::KERNEL) {
            masked.kernel_enabled = false;
            masked.invert = false;
            masked.greyscale = false;
        }
        if !self.contains(Self::REFLECTION) {
            masked.dynamic_reflection = false;
        }
        if !self.contains(Self::INSTANCING) {
            masked.instancing_enabled = false;
        }
        if !self.contains(Self::NORMAL_MAP) {
            masked.normal_mapping = false;
        }
        masked
    }
}

/// State every demo carries.
pub struct DemoCore {
    pub camera: Camera,
    pub programs: ProgramLibrary,
    pub targets: RenderTargets,
}

impl DemoCore {
    /// Compiles `programs`. A shader failure is returned as is.
    pub fn new(device: &mut Device, programs: &[ProgramKind], camera: Camera) -> Result<Self> {
        Ok(Self {
            camera,
            programs: ProgramLibrary::compile(device, programs)?,
            targets: RenderTargets::new(),
        })
    }
}

pub trait Demo {
    fn kind(&self) -> DemoKind;

    fn features(&self) -> DemoFeatures {
        DemoFeatures::empty()
    }

    fn camera_mode(&self) -> CameraMode {
        CameraMode::Freefly
    }

    fn core(&self) -> &DemoCore;

    fn core_mut(&mut self) -> &mut DemoCore;

    /// The lights shown in the light inspector.
    fn light_set(&self) -> Option<&LightSet>;

    fn light_set_mut(&mut self) -> Option<&mut LightSet>;

    /// The light block lit passes bind.
    fn light_block(&self) -> Option<LightBlock> {
        self.light_set().map(LightSet::block)
    }

    /// Per-frame CPU work before the passes are built (after the camera moved).
    #[allow(unused_variables)]
    fn update(&mut self, device: &mut Device, input: &FrameInput, config: &FrameConfig) {}

    /// This frame's passes, in execution order.
    fn passes(&self, config: &FrameConfig) -> Vec<Pass>;

    /// Called once the frame's commands were submitted.
    #[allow(unused_variables)]
    fn after_submit(&mut self, device: &mut Device) {}

    /// Demo-specific controls.
    #[allow(unused_variables)]
    fn ui(&mut self, ui: &mut egui::Ui) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DemoKind {
    Base,
    Hdr,
    Bloom,
    Framebuffer,
    Instancing,
    NormalMapping,
    Skybox,
    #[default]
    Full,
}

impl DemoKind {
    pub const ALL: [Self; 8] = [
        Self::Base,
        Self::Hdr,
        Self::Bloom,
        Self::Framebuffer,
        Self::Instancing,
        Self::NormalMapping,
        Self::Skybox,
        Self::Full,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Hdr => "hdr",
            Self::Bloom => "bloom",
            Self::Framebuffer => "framebuffer",
            Self::Instancing => "instancing",
            Self::NormalMapping => "normal_mapping",
            Self::Skybox => "skybox",
            Self::Full => "full",
        }
    }

    /// Looks a demo up by [`name`](Self::name).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Builds the demo, loading its assets through `cache`.
    pub fn create(
        self,
        device: &mut Device,
        cache: &mut ResourceCache,
        settings: &RenderSettings,
    ) -> Result<Box<dyn Demo>> {
        log::info!("Creating demo '{}'", self.name());
        Ok(match self {
            Self::Base => Box::new(BaseDemo::new(device, cache, settings)?),
            Self::Hdr => Box::new(HdrDemo::new(device, cache, settings)?),
            Self::Bloom => Box::new(BloomDemo::new(device, cache, settings)?),
            Self::Framebuffer => Box::new(FramebufferDemo::new(device, cache, settings)?),
            Self::Instancing => Box::new(InstancingDemo::new(device, cache)?),
            Self::NormalMapping => Box::new(NormalMappingDemo::new(device, cache)?),
            Self::Skybox => Box::new(SkyboxDemo::new(device, cache, settings)?),
            Self::Full => Box::new(FullDemo::new(device, cache, settings)?),
        })
    }
}

/// Where the demos start looking from: inside the tavern, facing -Z.
pub const DEFAULT_CAMERA: Camera = Camera::new(Vec3::new(0.0, 1.0, 4.0), 0.0, 0.0);

/// The tavern drawn with Blinn-Phong over its light block.
pub(crate) fn tavern_draw(scene: &TavernScene) -> Option<DrawItem> {
    let [diffuse, emissive] = scene.textures();
    scene.mesh.map(|mesh| {
        DrawItem::new(ProgramKind::Phong, mesh, Shading::Lit(SceneFlags::empty()))
            .with_model(scene.model_matrix())
            .with_textures([TextureSource::Texture(diffuse), TextureSource::Texture(emissive)])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masking_keeps_supported_toggles() {
        let config = FrameConfig {
            kernel_enabled: true,
            invert: true,
            ..FrameConfig::default()
        };
        let masked = DemoFeatures::TONE_MAP.mask(&config);
        assert!(masked.tone_map && masked.gamma_correct);
        assert!(!masked.bloom && !masked.kernel_enabled && !masked.invert);
        assert!(!masked.dynamic_reflection && !masked.instancing_enabled);
        assert_eq!(masked.exposure, config.exposure);

        assert_eq!(DemoFeatures::all().mask(&config), config);
    }

    #[test]
    fn names_round_trip() {
        for kind in DemoKind::ALL {
            assert_eq!(DemoKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(DemoKind::from_name("deferred"), None);
    }
}
