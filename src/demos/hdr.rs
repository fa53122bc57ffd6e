//! Tavern rendered into a floating-point target, then tone mapped and
//! gamma corrected onto the window.

use super::{DEFAULT_CAMERA, Demo, DemoCore, DemoFeatures, DemoKind, tavern_draw};
use crate::assets::ResourceCache;
use crate::errors::Result;
use crate::renderer::pipeline::{
    CompositePass, FrameConfig, Pass, PassTarget, ProgramKind, ScenePass, TargetName, TargetSpec,
    TextureSource,
};
use crate::renderer::{Device, RenderSettings};
use crate::scene::{LightSet, TavernScene};

pub struct HdrDemo {
    core: DemoCore,
    tavern: TavernScene,
}

impl HdrDemo {
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

impl Demo for HdrDemo {
    fn kind(&self) -> DemoKind {
        DemoKind::Hdr
    }

    fn features(&self) -> DemoFeatures {
        DemoFeatures::TONE_MAP
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
                label: "Tavern HDR",
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
