//! Every technique at once: environment capture, asteroid ring, MRT scene
//! with bloom, and the full composite chain.

use super::bloom::{bloom_blur, bloom_composite, declare_bloom_targets};
use super::skybox::tavern_pick;
use super::{
    AsteroidField, DEFAULT_CAMERA, Demo, DemoCore, DemoFeatures, DemoKind, Environment, Picker,
    tavern_draw,
};
use crate::app::input::FrameInput;
use crate::assets::ResourceCache;
use crate::errors::Result;
use crate::renderer::pipeline::{
    DrawItem, FrameConfig, Pass, PassTarget, ProgramKind, ScenePass, TargetName,
};
use crate::renderer::{Device, RenderSettings};
use crate::scene::{LightSet, TavernScene};

pub struct FullDemo {
    core: DemoCore,
    tavern: TavernScene,
    asteroids: AsteroidField,
    environment: Environment,
    picker: Picker,
}

impl FullDemo {
    pub fn new(device: &mut Device, cache: &mut ResourceCache, settings: &RenderSettings) -> Result<Self> {
        let mut core = DemoCore::new(
            device,
            &[
                ProgramKind::Phong,
                ProgramKind::PhongInstanced,
                ProgramKind::Reflective,
                ProgramKind::Skybox,
                ProgramKind::PickId,
                ProgramKind::Blur,
                ProgramKind::Composite,
            ],
            DEFAULT_CAMERA,
        )?;
        declare_bloom_targets(&mut core.targets);
        Environment::declare_targets(&mut core.targets, settings.capture_size);
        Picker::declare_target(&mut core.targets);

        Ok(Self {
            core,
            tavern: TavernScene::new(device, cache, settings.light_count),
            asteroids: AsteroidField::new(device, cache),
            environment: Environment::new(device, cache),
            picker: Picker::default(),
        })
    }

    /// Lit geometry shared by the capture and the main scene.
    fn lit_draws(&self, config: &FrameConfig) -> Vec<DrawItem> {
        let asteroids = self.asteroids.draw().filter(|_| config.instancing_enabled);
        tavern_draw(&self.tavern).into_iter().chain(asteroids).collect()
    }
}

impl Demo for FullDemo {
    fn kind(&self) -> DemoKind {
        DemoKind::Full
    }

    fn features(&self) -> DemoFeatures {
        DemoFeatures::TONE_MAP
            | DemoFeatures::BLOOM
            | DemoFeatures::KERNEL
            | DemoFeatures::REFLECTION
            | DemoFeatures::INSTANCING
            | DemoFeatures::PICKING
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

    fn update(&mut self, device: &mut Device, input: &FrameInput, config: &FrameConfig) {
        if config.instancing_enabled {
            self.asteroids.update(device, &config.instancing);
        }
        self.picker.request(input);
    }

    fn passes(&self, config: &FrameConfig) -> Vec<Pass> {
        let env = &self.environment;
        let lit = self.lit_draws(config);

        let mut passes = Vec::with_capacity(5);
        passes.extend(env.capture(config, lit.clone()));
        passes.extend(
            self.picker
                .pass(tavern_pick(&self.tavern).into_iter().chain(env.sphere_pick()).collect()),
        );

        let mut draws = lit;
        draws.extend(env.sphere_draw(config));
        draws.push(env.sky_draw());
        passes.push(Pass::Scene(ScenePass {
            label: "Full Scene MRT",
            target: PassTarget::Offscreen(TargetName::Scene),
            draws,
        }));

        passes.extend(bloom_blur(config));
        passes.push(bloom_composite(config));
        passes
    }

    fn after_submit(&mut self, device: &mut Device) {
        self.picker.resolve(device, &self.core.targets);
    }

    fn ui(&mut self, ui: &mut egui::Ui) {
        ui.label(format!("Asteroids: {}", self.asteroids.instance_count()));
        self.picker.ui(ui);
    }
}
