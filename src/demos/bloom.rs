//! Bloom: the scene pass writes color plus a thresholded bright pass, the
//! bright pass is blurred by ping-pong, and the composite adds it back
//! before tone mapping.

use super::{DEFAULT_CAMERA, Demo, DemoCore, DemoFeatures, DemoKind, tavern_draw};
use crate::assets::ResourceCache;
use crate::errors::Result;
use crate::renderer::pipeline::{
    BlurPass, CompositePass, FrameConfig, Pass, PassTarget, ProgramKind, RenderTargets, ScenePass,
    TargetName, TargetSpec, TextureSource,
};
use crate::renderer::{Device, RenderSettings};
use crate::scene::{LightSet, TavernScene};

pub struct BloomDemo {
    core: DemoCore,
    tavern: TavernScene,
}

/// Scene target with a bright-pass attachment plus both ping-pong targets.
pub(crate) fn declare_bloom_targets(targets: &mut RenderTargets) {
    targets
        .declare(TargetName::Scene, TargetSpec::hdr(2))
        .declare(TargetName::PingPong0, TargetSpec::ping_pong())
        .declare(TargetName::PingPong1, TargetSpec::ping_pong());
}

/// Blur of the scene's bright pass, when bloom is on.
pub(crate) fn bloom_blur(config: &FrameConfig) -> Option<Pass> {
    config.bloom.then(|| {
        Pass::Blur(BlurPass {
            source: TextureSource::Attachment {
                target: TargetName::Scene,
                index: 1,
            },
            targets: [TargetName::PingPong0, TargetName::PingPong1],
        })
    })
}

/// Composite of the scene color with the blurred bright pass if one ran.
pub(crate) fn bloom_composite(config: &FrameConfig) -> Pass {
    Pass::Composite(CompositePass {
        scene: TextureSource::color(TargetName::Scene),
        bloom: config.bloom.then_some(TextureSource::BlurOutput),
        target: PassTarget::Default,
    })
}

impl BloomDemo {
    pub fn new(device: &mut Device, cache: &mut ResourceCache, settings: &RenderSettings) -> Result<Self> {
        let mut core = DemoCore::new(
            device,
            &[ProgramKind::Phong, ProgramKind::Blur, ProgramKind::Composite],
            DEFAULT_CAMERA,
        )?;
        declare_bloom_targets(&mut core.targets);
        Ok(Self {
            core,
            tavern: TavernScene::new(device, cache, settings.light_count),
        })
    }
}

impl Demo for BloomDemo {
    fn kind(&self) -> DemoKind {
        DemoKind::Bloom
    }

    fn features(&self) -> DemoFeatures {
        DemoFeatures::TONE_MAP | DemoFeatures::BLOOM
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

    fn passes(&self, config: &FrameConfig) -> Vec<Pass> {
        let mut passes = vec![Pass::Scene(ScenePass {
            label: "Tavern MRT",
            target: PassTarget::Offscreen(TargetName::Scene),
            draws: tavern_draw(&self.tavern).into_iter().collect(),
        })];
        passes.extend(bloom_blur(config));
        passes.push(bloom_composite(config));
        passes
    }
}
