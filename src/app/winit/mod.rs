//! Winit-based Application
//!
//! Hosts the demos in a window:
//!
//! - [`App`]: builder for configuring and launching the app
//! - `AppRunner`: the winit [`ApplicationHandler`] (not exposed publicly)
//!
//! Window events go to the egui overlay first; whatever it does not
//! consume reaches the engine's [`Input`](crate::app::input::Input)
//! through [`input_adapter`].
//!
//! # Example
//!
//! ```rust,ignore
//! use tavern::app::{App, AppSettings};
//!
//! fn main() -> tavern::errors::Result<()> {
//!     App::new().with_title("Tavern").run()
//! }
//! ```

use std::sync::Arc;
use std::time::Instant;

use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
pub use winit::window::{Window, WindowId};

use super::AppSettings;
use crate::assets::{FileAssetSource, ResourceCache};
use crate::engine::Engine;
use crate::errors::{Result, TavernError};
use crate::renderer::Device;
use crate::renderer::backend::WgpuBackend;
use crate::ui::{ControlPanel, UiOverlay};
use crate::utils::FpsCounter;

pub mod input_adapter;

/// Application builder.
///
/// ```rust,ignore
/// App::new()
///     .with_title("Tavern")
///     .with_settings(AppSettings::from_args(std::env::args().skip(1)))
///     .run()?;
/// ```
pub struct App {
    settings: AppSettings,
}

impl App {
    #[must_use]
    pub fn new() -> Self {
        Self {
            settings: AppSettings::default(),
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.settings.title = title.into();
        self
    }

    /// Replaces every setting, title included.
    #[must_use]
    pub fn with_settings(mut self, settings: AppSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Runs the event loop on the current thread until the window closes.
    ///
    /// # Errors
    ///
    /// Returns an error if event loop creation or execution fails.
    pub fn run(self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut runner = AppRunner::new(self.settings);
        event_loop.run_app(&mut runner).map_err(TavernError::from)
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything that exists once the window does.
struct Running {
    window: Arc<Window>,
    engine: Engine,
    overlay: UiOverlay,
    panel: ControlPanel,
    fps: FpsCounter,
}

struct AppRunner {
    settings: AppSettings,
    running: Option<Running>,
    last_loop_time: Instant,
}

impl AppRunner {
    fn new(settings: AppSettings) -> Self {
        Self {
            settings,
            running: None,
            last_loop_time: Instant::now(),
        }
    }

    fn init(&self, event_loop: &ActiveEventLoop) -> Result<Running> {
        let window_attributes = Window::default_attributes()
            .with_title(&self.settings.title)
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.settings.width,
                self.settings.height,
            ));
        let window = Arc::new(event_loop.create_window(window_attributes)?);

        log::info!("Initializing Renderer Backend...");
        let size = window.inner_size();
        let backend = pollster::block_on(WgpuBackend::new(
            window.clone(),
            &self.settings.render,
            size.width.max(1),
            size.height.max(1),
        ))?;
        let overlay = UiOverlay::new(&backend.context().device, backend.surface_format(), &window);

        let device = Device::new(backend);
        let cache = ResourceCache::new(FileAssetSource::new(&self.settings.asset_root));
        let engine = Engine::new(
            device,
            cache,
            self.settings.render.clone(),
            self.settings.initial_demo,
        )?;

        Ok(Running {
            window,
            engine,
            overlay,
            panel: ControlPanel::new(),
            fps: FpsCounter::new(),
        })
    }

    fn redraw(&mut self) {
        let now = Instant::now();
        let dt = now.duration_since(self.last_loop_time).as_secs_f32();
        self.last_loop_time = now;

        let Some(running) = &mut self.running else {
            return;
        };
        running.fps.update();

        if let Some(kind) = running.panel.take_requested_demo()
            && let Err(e) = running.engine.switch_demo(kind)
        {
            log::error!("Cannot switch to demo '{}': {e}", kind.name());
        }

        match running.engine.frame(dt) {
            Ok(()) => running.draw_overlay(),
            Err(e) => log::error!("Frame skipped: {e}"),
        }
        running.engine.present();
    }
}

impl Running {
    fn draw_overlay(&mut self) {
        if let Err(e) = self.engine.begin_overlay() {
            log::error!("{e}");
            return;
        }

        self.overlay.begin_frame(&self.window);
        {
            let (demo, device, config) = self.engine.split_mut();
            self.panel
                .show(self.overlay.context(), self.fps.current_fps, demo, device, config);
        }
        self.overlay.end_frame(&self.window);

        let overlay = &mut self.overlay;
        if let Some(backend) = self.engine.device.backend_mut::<WgpuBackend>() {
            backend.render_overlay(|ctx, encoder, view| overlay.paint(ctx, encoder, view));
        }
    }
}

impl ApplicationHandler for AppRunner {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.running.is_some() {
            return;
        }

        match self.init(event_loop) {
            Ok(running) => {
                self.running = Some(running);
                self.last_loop_time = Instant::now();
            }
            Err(e) => {
                log::error!("Fatal Renderer Error: {e}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(running) = &mut self.running else {
            return;
        };

        let consumed = running.overlay.handle_input(&running.window, &event);
        if !consumed {
            input_adapter::process_window_event(&mut running.engine.input, &event);
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(physical_size) => {
                let scale_factor = running.window.scale_factor() as f32;
                running
                    .engine
                    .resize(physical_size.width, physical_size.height);
                running
                    .overlay
                    .resize(physical_size.width, physical_size.height, scale_factor);
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
                if let Some(running) = &self.running {
                    running.window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(running) = &self.running {
            running.window.request_redraw();
        }
    }
}
