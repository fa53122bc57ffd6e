//! The tavern lit by its light block, drawn straight to the window.

use super::{DEFAULT_CAMERA, Demo, DemoCore, DemoKind, tavern_draw};
use crate::assets::ResourceCache;
use crate::errors::Result;
use crate::renderer::pipeline::{FrameConfig, Pass, PassTarget, ProgramKind, ScenePass};
use crate::renderer::{Device, RenderSettings};
use crate::scene::{CameraMode, LightSet, TavernScene};

pub struct BaseDemo {
    core: DemoCore,
    tavern: TavernScene,
}

impl BaseDemo {
    pub fn new(device: &mut Device, cache: &mut ResourceCache, settings: &RenderSettings) -> Result<Self> {
        Ok(Self {
            core: DemoCore::new(device, &[ProgramKind::Phong], DEFAULT_CAMERA)?,
            tavern: TavernScene::new(device, cache, settings.light_count),
        })
    }
}

impl Demo for BaseDemo {
    fn kind(&self) -> DemoKind {
        DemoKind::Base
    }

    fn camera_mode(&self) -> CameraMode {
        CameraMode::Fps
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
        vec![Pass::Scene(ScenePass {
            label: "Tavern",
            target: PassTarget::Default,
            draws: tavern_draw(&self.tavern).into_iter().collect(),
        })]
    }
}
