//! Post-processing and scene parameter panels.
//!
//! Each panel edits the shared [`FrameConfig`]; which panels appear is
//! decided by the demo's [`DemoFeatures`].

use crate::demos::DemoFeatures;
use crate::renderer::pipeline::FrameConfig;
use crate::resources::KernelPreset;

pub const EXPOSURE_RANGE: std::ops::RangeInclusive<f32> = 0.1..=8.0;
pub const GAMMA_RANGE: std::ops::RangeInclusive<f32> = 0.45..=4.4;
pub const BLUR_RANGE: std::ops::RangeInclusive<u32> = 1..=30;
pub const RATIO_RANGE: std::ops::RangeInclusive<f32> = 5.0..=1000.0;

/// Kernel editor state that is not part of the frame configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KernelEditor {
    pub preset: KernelPreset,
    /// Editing one ratio axis edits both.
    pub link_ratio: bool,
}

impl Default for KernelEditor {
    fn default() -> Self {
        Self {
            preset: KernelPreset::Identity,
            link_ratio: true,
        }
    }
}

/// Which ratio axis the user touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatioAxis {
    X,
    Y,
}

/// Copies the edited axis onto the other one when linked.
#[must_use]
pub fn sync_ratio(ratio: (f32, f32), linked: bool, edited: RatioAxis) -> (f32, f32) {
    match (linked, edited) {
        (false, _) => ratio,
        (true, RatioAxis::X) => (ratio.0, ratio.0),
        (true, RatioAxis::Y) => (ratio.1, ratio.1),
    }
}

pub fn post_panel(
    ui: &mut egui::Ui,
    features: DemoFeatures,
    config: &mut FrameConfig,
    kernel: &mut KernelEditor,
) {
    if features.contains(DemoFeatures::TONE_MAP) {
        ui.collapsing("Tone Mapping", |ui| {
            ui.checkbox(&mut config.tone_map, "Tone map");
            ui.add_enabled(
                config.tone_map,
                egui::Slider::new(&mut config.exposure, EXPOSURE_RANGE).text("Exposure"),
            );
            ui.checkbox(&mut config.gamma_correct, "Gamma correction");
            ui.add_enabled(
                config.gamma_correct,
                egui::Slider::new(&mut config.gamma, GAMMA_RANGE).text("Gamma"),
            );
        });
    }

    if features.contains(DemoFeatures::BLOOM) {
        ui.collapsing("Bloom", |ui| {
            ui.checkbox(&mut config.bloom, "Bloom");
            ui.add(egui::Slider::new(&mut config.brightness_clamp, 0.0..=1.0).text("Brightness clamp"));
            ui.add(egui::Slider::new(&mut config.blur_iterations, BLUR_RANGE).text("Blur iterations"));
        });
    }

    if features.contains(DemoFeatures::KERNEL) {
        ui.collapsing("Post Processing", |ui| kernel_panel(ui, config, kernel));
    }
}

fn kernel_panel(ui: &mut egui::Ui, config: &mut FrameConfig, editor: &mut KernelEditor) {
    ui.checkbox(&mut config.kernel_enabled, "Kernel");

    ui.add_enabled_ui(config.kernel_enabled, |ui| {
        egui::ComboBox::from_id_salt("kernel_preset")
            .selected_text(editor.preset.name())
            .show_ui(ui, |ui| {
                for preset in KernelPreset::ALL {
                    if ui.selectable_value(&mut editor.preset, preset, preset.name()).changed() {
                        config.kernel = preset.matrix();
                    }
                }
            });

        egui::Grid::new("kernel_matrix").num_columns(3).show(ui, |ui| {
            for row in 0..3 {
                for col in 0..3 {
                    ui.add(egui::DragValue::new(&mut config.kernel.col_mut(col)[row]).speed(0.05));
                }
                ui.end_row();
            }
        });

        ui.checkbox(&mut editor.link_ratio, "Ratio X = Y");
        let x = ui.add(egui::Slider::new(&mut config.kernel_ratio.0, RATIO_RANGE).text("Ratio X"));
        if x.changed() {
            config.kernel_ratio = sync_ratio(config.kernel_ratio, editor.link_ratio, RatioAxis::X);
        }
        let y = ui.add(egui::Slider::new(&mut config.kernel_ratio.1, RATIO_RANGE).text("Ratio Y"));
        if y.changed() {
            config.kernel_ratio = sync_ratio(config.kernel_ratio, editor.link_ratio, RatioAxis::Y);
        }
    });

    ui.checkbox(&mut config.invert, "Invert");
    ui.checkbox(&mut config.greyscale, "Greyscale");
}

/// Scene toggles: reflection, asteroid ring, normal mapping and wireframe.
pub fn scene_panel(ui: &mut egui::Ui, features: DemoFeatures, config: &mut FrameConfig) {
    if features.contains(DemoFeatures::REFLECTION) {
        ui.checkbox(&mut config.dynamic_reflection, "Dynamic reflection");
    }
    if features.contains(DemoFeatures::NORMAL_MAP) {
        ui.checkbox(&mut config.normal_mapping, "Normal mapping");
    }
    if features.contains(DemoFeatures::INSTANCING) {
        ui.collapsing("Instancing", |ui| {
            ui.checkbox(&mut config.instancing_enabled, "Asteroids");
            let params = &mut config.instancing;
            ui.add(egui::Slider::new(&mut params.count, 1..=20_000).text("Count"));
            ui.add(egui::Slider::new(&mut params.radius, 1.0..=100.0).text("Radius"));
            ui.add(egui::Slider::new(&mut params.offset, 0.0..=25.0).text("Offset"));
        });
    }
    ui.checkbox(&mut config.wireframe, "Wireframe");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linked_ratio_follows_edited_axis() {
        assert_eq!(sync_ratio((300.0, 800.0), true, RatioAxis::X), (300.0, 300.0));
        assert_eq!(sync_ratio((800.0, 40.0), true, RatioAxis::Y), (40.0, 40.0));
        assert_eq!(sync_ratio((300.0, 800.0), false, RatioAxis::X), (300.0, 800.0));
    }
}
