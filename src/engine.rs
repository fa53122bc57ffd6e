//! Engine Core Module
//!
//! This module contains [`Engine`], the coordinator of one running demo.
//! It owns no window: the [`Device`] it drives may be backed by the `wgpu`
//! backend created by the winit frontend or by the headless recorder used
//! in tests.
//!
//! # Frame
//!
//! ```text
//! BeginFrame      release dropped GPU resources
//! camera          Camera::update with the frame's input, per the demo's mode
//! demo.update     CPU work (instance matrices, pick requests)
//! record          Demo::passes → PassExecutor → Frame
//! submit          Device::submit
//! Present         the demo's image is complete
//! after_submit    readbacks (picking)
//! DebugUi         overlay, drawn by the frontend
//! present         Device::present
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use tavern::{Engine, demos::DemoKind};
//!
//! let mut engine = Engine::new(device, cache, RenderSettings::default(), DemoKind::Bloom)?;
//! loop {
//!     engine.frame(dt)?;
//!     engine.begin_overlay()?;
//!     // ... draw UI ...
//!     engine.present();
//! }
//! ```

use crate::app::input::{FrameInput, Input};
use crate::assets::ResourceCache;
use crate::demos::{Demo, DemoKind};
use crate::errors::Result;
use crate::renderer::graph::{FrameStage, FrameTracker};
use crate::renderer::pipeline::{FrameConfig, FrameContext, PassExecutor};
use crate::renderer::{Device, RenderSettings};

/// The running demo plus everything it renders with.
///
/// # Components
///
/// - `device`: GPU front end; owns the backend and the release queue
/// - `cache`: meshes and textures shared by every demo created here
/// - `input`: platform input, condensed once per frame
/// - `config`: the frame configuration the UI edits
pub struct Engine {
    pub device: Device,
    pub cache: ResourceCache,
    pub input: Input,
    pub config: FrameConfig,

    settings: RenderSettings,
    demo: Box<dyn Demo>,
    tracker: FrameTracker,

    time: f32,
    frame_count: u64,
}

impl Engine {
    /// Creates the engine and its first demo.
    ///
    /// # Errors
    ///
    /// Fails if one of the demo's programs does not compile.
    pub fn new(
        mut device: Device,
        mut cache: ResourceCache,
        settings: RenderSettings,
        initial: DemoKind,
    ) -> Result<Self> {
        let demo = initial.create(&mut device, &mut cache, &settings)?;
        Ok(Self {
            device,
            cache,
            input: Input::new(),
            config: FrameConfig::default(),
            settings,
            demo,
            tracker: FrameTracker::new(),
            time: 0.0,
            frame_count: 0,
        })
    }

    /// Returns the total elapsed time in seconds since the engine started.
    #[inline]
    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Returns the total number of frames rendered since startup.
    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Returns the current surface size in pixels as `(width, height)`.
    #[inline]
    #[must_use]
    pub fn size(&self) -> (u32, u32) {
        self.device.surface_size()
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    #[inline]
    #[must_use]
    pub fn demo(&self) -> &dyn Demo {
        self.demo.as_ref()
    }

    #[inline]
    pub fn demo_mut(&mut self) -> &mut dyn Demo {
        self.demo.as_mut()
    }

    /// The demo, the device and the frame configuration, borrowed together
    /// for the UI.
    pub fn split_mut(&mut self) -> (&mut dyn Demo, &mut Device, &mut FrameConfig) {
        (self.demo.as_mut(), &mut self.device, &mut self.config)
    }

    #[inline]
    #[must_use]
    pub fn stage(&self) -> Option<FrameStage> {
        self.tracker.current()
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.device.resize(width, height);
    }

    /// Replaces the running demo. The old demo is dropped only once the new
    /// one exists, so a failed switch keeps the current demo running.
    pub fn switch_demo(&mut self, kind: DemoKind) -> Result<()> {
        if kind == self.demo.kind() {
            return Ok(());
        }
        let next = kind.create(&mut self.device, &mut self.cache, &self.settings)?;
        let previous = std::mem::replace(&mut self.demo, next);
        log::info!("Switched demo '{}' -> '{}'", previous.kind().name(), kind.name());
        Ok(())
    }

    /// Runs one frame up to [`FrameStage::Present`]. The frontend may then
    /// draw an overlay and must call [`present`](Self::present).
    pub fn frame(&mut self, dt: f32) -> Result<()> {
        self.time += dt;
        self.frame_count += 1;

        self.tracker.enter(FrameStage::BeginFrame)?;
        self.device.begin_frame();

        let input = self.input.frame_input(dt, self.time);
        self.input.start_frame();
        self.render(&input)
    }

    /// Same as [`frame`](Self::frame) with an explicit input snapshot.
    pub fn frame_with_input(&mut self, input: &FrameInput) -> Result<()> {
        self.time = input.time;
        self.frame_count += 1;

        self.tracker.enter(FrameStage::BeginFrame)?;
        self.device.begin_frame();
        self.render(input)
    }

    fn render(&mut self, input: &FrameInput) -> Result<()> {
        let mode = self.demo.camera_mode();
        let core = self.demo.core_mut();
        core.camera = core.camera.update(mode, &input.camera_inputs());

        // Toggles the demo has no pass for never reach the executor.
        let config = self.demo.features().mask(&self.config);
        self.demo.update(&mut self.device, input, &config);

        let window = self.device.surface_size();
        self.demo.core_mut().targets.prepare(&mut self.device, window);

        let passes = self.demo.passes(&config);
        let frame = {
            let core = self.demo.core();
            let ctx = FrameContext {
                camera: &core.camera,
                projection: &self.settings.projection,
                window,
                lights: self.demo.light_block(),
                config: &config,
            };
            PassExecutor::new(&core.programs, &core.targets).record(
                self.demo.kind().name(),
                &passes,
                &ctx,
                &mut self.tracker,
            )?
        };
        self.device.submit(&frame);
        self.tracker.enter(FrameStage::Present)?;

        self.demo.after_submit(&mut self.device);
        Ok(())
    }

    /// Enters [`FrameStage::DebugUi`]. Fails unless this frame was presented.
    pub fn begin_overlay(&mut self) -> Result<()> {
        self.tracker.enter(FrameStage::DebugUi)
    }

    pub fn present(&mut self) {
        self.device.present();
    }
}
