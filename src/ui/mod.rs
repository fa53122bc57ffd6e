//! Debug UI
//!
//! egui panels for live parameter tweaking, drawn over the finished frame:
//!
//! - [`ControlPanel`]: demo selector, FPS, camera, post-processing and
//!   scene toggles, plus the demo's own controls
//! - [`lights`]: light inspector and attenuation calculator
//! - [`overlay::UiOverlay`]: the egui ↔ winit/wgpu glue
//!
//! Panels only write into the [`FrameConfig`] the engine hands over and
//! into demo state; a change shows up on the next frame.

pub mod lights;
pub mod overlay;
pub mod post;

pub use overlay::UiOverlay;
pub use post::{KernelEditor, RatioAxis, sync_ratio};

use crate::demos::{Demo, DemoKind};
use crate::renderer::Device;
use crate::renderer::pipeline::FrameConfig;
use crate::scene::Camera;
use crate::scene::camera::PITCH_LIMIT;

pub struct ControlPanel {
    kernel: KernelEditor,
    attenuation_distance: f32,
    requested_demo: Option<DemoKind>,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            kernel: KernelEditor::default(),
            attenuation_distance: 5.0,
            requested_demo: None,
        }
    }
}

impl ControlPanel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Demo picked in the selector since the last call.
    pub fn take_requested_demo(&mut self) -> Option<DemoKind> {
        self.requested_demo.take()
    }

    pub fn show(
        &mut self,
        ctx: &egui::Context,
        fps: f32,
        demo: &mut dyn Demo,
        device: &mut Device,
        config: &mut FrameConfig,
    ) {
        let features = demo.features();

        egui::Window::new("Control Panel")
            .default_pos([10.0, 10.0])
            .default_width(300.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(format!("FPS: {fps:.1}"));
                    ui.separator();
                    self.demo_selector(ui, demo.kind());
                });
                ui.separator();

                ui.collapsing("Camera", |ui| camera_panel(ui, &mut demo.core_mut().camera));

                post::post_panel(ui, features, config, &mut self.kernel);
                post::scene_panel(ui, features, config);

                ui.separator();
                demo.ui(ui);
            });

        if let Some(lights) = demo.light_set_mut() {
            egui::Window::new("Lights")
                .default_pos([10.0, 420.0])
                .default_open(false)
                .show(ctx, |ui| {
                    ui.collapsing("Attenuation", |ui| {
                        lights::attenuation_calculator(ui, lights, &mut self.attenuation_distance);
                    });
                    egui::ScrollArea::vertical()
                        .max_height(360.0)
                        .show(ui, |ui| lights::light_inspector(ui, lights, device));
                });
        }
    }

    fn demo_selector(&mut self, ui: &mut egui::Ui, current: DemoKind) {
        let mut selected = current;
        egui::ComboBox::from_id_salt("demo_selector")
            .selected_text(current.name())
            .show_ui(ui, |ui| {
                for kind in DemoKind::ALL {
                    ui.selectable_value(&mut selected, kind, kind.name());
                }
            });
        if selected != current {
            self.requested_demo = Some(selected);
        }
    }
}

/// Position plus yaw and pitch shown in degrees.
fn camera_panel(ui: &mut egui::Ui, camera: &mut Camera) {
    ui.horizontal(|ui| {
        ui.label("Position");
        ui.add(egui::DragValue::new(&mut camera.position.x).speed(0.05));
        ui.add(egui::DragValue::new(&mut camera.position.y).speed(0.05));
        ui.add(egui::DragValue::new(&mut camera.position.z).speed(0.05));
    });

    let mut yaw = camera.yaw.to_degrees();
    if ui
        .add(egui::DragValue::new(&mut yaw).suffix("°").prefix("Yaw: "))
        .changed()
    {
        camera.yaw = yaw.to_radians();
    }

    let limit = PITCH_LIMIT.to_degrees();
    let mut pitch = camera.pitch.to_degrees();
    if ui
        .add(
            egui::DragValue::new(&mut pitch)
                .range(-limit..=limit)
                .suffix("°")
                .prefix("Pitch: "),
        )
        .changed()
    {
        camera.pitch = pitch.to_radians().clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{MemoryAssetSource, ResourceCache};
    use crate::renderer::RenderSettings;
    use crate::renderer::backend::HeadlessBackend;

    #[test]
    fn panel_without_interaction_leaves_config_alone() {
        let mut device = Device::new(HeadlessBackend::new(640, 480));
        let mut cache = ResourceCache::new(MemoryAssetSource::new());
        let settings = RenderSettings::default();
        let mut demo = DemoKind::Full.create(&mut device, &mut cache, &settings).unwrap();
        let mut config = FrameConfig::default();
        let mut panel = ControlPanel::new();

        let ctx = egui::Context::default();
        ctx.begin_pass(egui::RawInput::default());
        panel.show(&ctx, 60.0, demo.as_mut(), &mut device, &mut config);
        let _ = ctx.end_pass();

        assert_eq!(config, FrameConfig::default());
        assert_eq!(panel.take_requested_demo(), None);
    }
}
