//! Screen-space post-processing: the tavern is rendered offscreen, then
//! the composite applies a 3x3 convolution kernel, inversion and greyscale.

use super::{DEFAULT_CAMERA, Demo, DemoCore, DemoFeatures, DemoKind, tavern_draw};
use crate::assets::ResourceCache;
use crate::errors::Result;
use crate::renderer::pipeline::{
    CompositePass, FrameConfig, Pass, PassTarget, ProgramKind, ScenePass, TargetName, TargetSpec,
    TextureSource,
};
use crate::renderer::{Device, RenderSettings};
use crate::scene::{LightSet, TavernScene};

pub struct FramebufferDemo {
    core: DemoCore,
    tavern: TavernScene,
}

impl FramebufferDemo {
    pub fn new(device: &mut Device, cache: &mut ResourceCache, settings: &RenderSettings) -> Result<Self> {
        let mut core = DemoCore::new(
            device,
            &[ProgramKind::Phong, ProgramKind::Composite],
            DEFAULT_CAMERA,
        )?;
        core.targets.declare(TargetName::Scene, TargetSpec::hdr(1));
        Ok(Self {
            core,
            tavern: TavernScene::new(device, cache, settings.light_count),
        })
    }
}

impl Demo for FramebufferDemo {
    fn kind(&self) -> DemoKind {
        DemoKind::Framebuffer
    }

    fn features(&self) -> DemoFeatures {
        DemoFeatures::KERNEL
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

    fn passes(&self, _config: &FrameConfig) -> Vec<Pass> {
        vec![
            Pass::Scene(ScenePass {
                label: "Tavern Offscreen",
                target: PassTarget::Offscreen(TargetName::Scene),
                draws: tavern_draw(&self.tavern).into_iter().collect(),
            }),
            Pass::Composite(CompositePass {
                scene: TextureSource::color(TargetName::Scene),
                bloom: None,
                target: PassTarget::Default,
            }),
        ]
    }
}
