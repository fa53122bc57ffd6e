//! egui Overlay
//!
//! Wraps the egui lifecycle (input → pass → tessellation → GPU upload →
//! draw) for the debug panels. The overlay draws straight into the window
//! image after the demo's frame was submitted, through
//! [`WgpuBackend::render_overlay`](crate::renderer::backend::WgpuBackend::render_overlay).
//!
//! # Per-Frame Usage
//!
//! ```text
//! handle_input()          // forward winit events to egui
//! begin_frame(window)     // start an egui pass
//! … build UI via context() …
//! end_frame(window)       // tessellate shapes, capture texture delta
//! paint(ctx, encoder, view)
//! ```

use wgpu::TextureFormat;
use winit::event::WindowEvent;
use winit::window::Window;

use crate::renderer::backend::webgpu::WgpuContext;

pub struct UiOverlay {
    /// Shared egui context (reference-counted internally).
    egui_ctx: egui::Context,
    /// Bridges winit events into egui raw input.
    state: egui_winit::State,
    /// Owns egui's GPU pipelines, textures and vertex buffers.
    renderer: egui_wgpu::Renderer,

    clipped_primitives: Vec<egui::ClippedPrimitive>,
    textures_delta: egui::TexturesDelta,
    screen_descriptor: egui_wgpu::ScreenDescriptor,
}

impl UiOverlay {
    /// The initial screen descriptor is derived from `window`'s inner size
    /// and scale factor.
    pub fn new(device: &wgpu::Device, output_format: TextureFormat, window: &Window) -> Self {
        let size = window.inner_size();
        let egui_ctx = egui::Context::default();

        let id = egui_ctx.viewport_id();
        let state = egui_winit::State::new(egui_ctx.clone(), id, window, None, None, None);

        let renderer =
            egui_wgpu::Renderer::new(device, output_format, egui_wgpu::RendererOptions::default());

        Self {
            egui_ctx,
            state,
            renderer,
            clipped_primitives: Vec::new(),
            textures_delta: egui::TexturesDelta::default(),
            screen_descriptor: egui_wgpu::ScreenDescriptor {
                size_in_pixels: [size.width, size.height],
                pixels_per_point: window.scale_factor() as f32,
            },
        }
    }

    /// Forwards a winit window event to egui.
    ///
    /// Returns `true` if egui consumed the event. Mouse-button releases are
    /// always reported as unconsumed so mouse look never sticks.
    pub fn handle_input(&mut self, window: &Window, event: &WindowEvent) -> bool {
        let response = self.state.on_window_event(window, event);

        if let WindowEvent::MouseInput {
            state: winit::event::ElementState::Released,
            ..
        } = event
        {
            return false;
        }

        response.consumed
    }

    /// Begins a new egui pass. Call once per frame before building UI.
    pub fn begin_frame(&mut self, window: &Window) {
        let raw_input = self.state.take_egui_input(window);
        self.egui_ctx.begin_pass(raw_input);
    }

    /// Ends the egui pass, tessellates it and forwards platform output
    /// (cursor icon, clipboard) back to winit.
    pub fn end_frame(&mut self, window: &Window) {
        let egui::FullOutput {
            shapes,
            textures_delta,
            platform_output,
            ..
        } = self.egui_ctx.end_pass();

        self.state.handle_platform_output(window, platform_output);
        self.textures_delta.append(textures_delta);
        self.clipped_primitives = self
            .egui_ctx
            .tessellate(shapes, self.egui_ctx.pixels_per_point());
    }

    #[must_use]
    pub fn context(&self) -> &egui::Context {
        &self.egui_ctx
    }

    pub fn resize(&mut self, width: u32, height: u32, scale_factor: f32) {
        self.screen_descriptor.size_in_pixels = [width, height];
        self.screen_descriptor.pixels_per_point = scale_factor;
    }

    /// `true` while a widget has keyboard focus; camera keys are ignored then.
    #[must_use]
    pub fn wants_keyboard_input(&self) -> bool {
        self.egui_ctx.egui_wants_keyboard_input()
    }

    #[must_use]
    pub fn wants_pointer_input(&self) -> bool {
        self.egui_ctx.egui_wants_pointer_input()
    }

    /// Uploads this frame's textures and geometry, then draws the UI on top
    /// of `target` without clearing it.
    pub fn paint(
        &mut self,
        ctx: &WgpuContext,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
    ) {
        let device = &ctx.device;
        let queue = &ctx.queue;

        for (id, delta) in &self.textures_delta.set {
            self.renderer.update_texture(device, queue, *id, delta);
        }

        let user_cmd_bufs = self.renderer.update_buffers(
            device,
            queue,
            encoder,
            &self.clipped_primitives,
            &self.screen_descriptor,
        );
        if !user_cmd_bufs.is_empty() {
            queue.submit(user_cmd_bufs);
        }

        {
            let mut rpass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: target,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                    multiview_mask: None,
                })
                .forget_lifetime();

            self.renderer
                .render(&mut rpass, &self.clipped_primitives, &self.screen_descriptor);
        }

        for id in &self.textures_delta.free {
            self.renderer.free_texture(id);
        }
        self.textures_delta.set.clear();
        self.textures_delta.free.clear();
    }
}
