//! Light inspector and attenuation calculator.

use crate::renderer::Device;
use crate::scene::{Light, LightSet};

/// Slider range of light positions on every axis.
pub const POSITION_RANGE: std::ops::RangeInclusive<f32> = -4.0..=4.0;
pub const ATTENUATION_RANGE: std::ops::RangeInclusive<f32> = 0.0..=10.0;
pub const DISTANCE_RANGE: std::ops::RangeInclusive<f32> = 0.0..=20.0;

/// One collapsible editor per light. Edits go through [`LightSet::edit`]
/// so only the touched light is rewritten on the GPU.
pub fn light_inspector(ui: &mut egui::Ui, lights: &mut LightSet, device: &mut Device) {
    for index in 0..lights.len() {
        let Some(&current) = lights.lights().get(index) else {
            continue;
        };
        let mut edited = current;

        egui::CollapsingHeader::new(format!("Light {index}"))
            .id_salt(("light", index))
            .show(ui, |ui| light_editor(ui, &mut edited));

        if edited != current
            && let Err(e) = lights.edit(device, index, edited)
        {
            log::error!("Light edit rejected: {e}");
        }
    }
}

fn light_editor(ui: &mut egui::Ui, light: &mut Light) {
    let mut enabled = light.is_enabled();
    if ui.checkbox(&mut enabled, "Enabled").changed() {
        light.set_enabled(enabled);
    }

    ui.horizontal(|ui| {
        ui.label("Position");
        for value in &mut light.position {
            ui.add(egui::DragValue::new(value).speed(0.05).range(POSITION_RANGE));
        }
    });
    ui.small(if light.position[3] == 0.0 { "w = 0: directional" } else { "w ≠ 0: point" });

    egui::Grid::new("light_colors").num_columns(2).show(ui, |ui| {
        ui.label("Ambient");
        ui.color_edit_button_rgb(&mut light.ambient);
        ui.end_row();
        ui.label("Diffuse");
        ui.color_edit_button_rgb(&mut light.diffuse);
        ui.end_row();
        ui.label("Specular");
        ui.color_edit_button_rgb(&mut light.specular);
        ui.end_row();
    });

    ui.horizontal(|ui| {
        ui.label("Attenuation");
        for (value, prefix) in light.attenuation.iter_mut().zip(["c: ", "l: ", "q: "]) {
            ui.add(
                egui::DragValue::new(value)
                    .speed(0.01)
                    .range(ATTENUATION_RANGE)
                    .prefix(prefix),
            );
        }
    });
}

/// `1 / (c + l·d + q·d²)` for every enabled light at a chosen distance.
pub fn attenuation_calculator(ui: &mut egui::Ui, lights: &LightSet, distance: &mut f32) {
    ui.add(egui::Slider::new(distance, DISTANCE_RANGE).text("Distance"));
    for (index, light) in lights.lights().iter().enumerate() {
        if light.is_enabled() {
            ui.label(format!("Light {index}: {:.4}", light.attenuation_at(*distance)));
        }
    }
}
