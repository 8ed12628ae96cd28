use crate::app::{AppState, ModelStatus};
use egui::Context as EguiContext;
use garment_common::Rgba;
use garment_input::{Action, Tool};

/// Side panel with tools, color, history and session controls.
pub fn draw_ui(state: &mut AppState, ctx: &EguiContext) {
    let mut actions = Vec::new();
    let mut save = false;
    let mut load = false;
    let mut export = false;

    egui::SidePanel::left("tools")
        .default_width(240.0)
        .show(ctx, |ui| {
            ui.heading("Garment Paint");
            ui.separator();

            ui.label("Tool");
            ui.horizontal(|ui| {
                for tool in Tool::ALL {
                    let active = state.editor.tool() == tool;
                    if ui.selectable_label(active, tool.label()).clicked() && !active {
                        actions.push(Action::SelectTool(tool));
                    }
                }
            });

            ui.horizontal(|ui| {
                ui.label("Color");
                let color = state.editor.color();
                let mut rgb = [color.r(), color.g(), color.b()];
                if ui.color_edit_button_srgb(&mut rgb).changed() {
                    actions.push(Action::SetColor(Rgba::rgb(rgb[0], rgb[1], rgb[2])));
                }
                ui.monospace(color.to_hex());
            });

            if ui.button("Clear (Del)").clicked() {
                actions.push(Action::ClearCanvas);
            }
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(state.editor.can_undo(), egui::Button::new("Undo (Ctrl+Z)"))
                    .clicked()
                {
                    actions.push(Action::Undo);
                }
                if ui
                    .add_enabled(state.editor.can_redo(), egui::Button::new("Redo (Ctrl+Y)"))
                    .clicked()
                {
                    actions.push(Action::Redo);
                }
            });
            ui.label(format!(
                "Undo: {} / Redo: {}",
                state.editor.history().undo_count(),
                state.editor.history().redo_count()
            ));

            ui.separator();
            ui.heading("Session");
            ui.horizontal(|ui| {
                save = ui.button("Save (F5)").clicked();
                load = ui.button("Load (F9)").clicked();
            });
            export = ui.button("Export PNG").clicked();
            if let Some(message) = &state.message {
                ui.small(message);
            }

            ui.separator();
            ui.heading("Model");
            match &state.model_status {
                ModelStatus::Loading(name) => {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label(format!("Loading {name}..."));
                    });
                }
                ModelStatus::Ready(summary) => {
                    ui.label(summary);
                }
                ModelStatus::Failed(err) => {
                    ui.colored_label(egui::Color32::RED, format!("Load failed: {err}"));
                }
            }
            ui.label(format!(
                "Camera distance: {:.2}  Yaw: {:.2}",
                state.camera.distance(),
                state.scene.model_yaw()
            ));

            ui.separator();
            ui.small("Drag on the garment to paint, elsewhere to turn it. Wheel or pinch to zoom.");
        });

    for action in actions {
        state.apply(action);
    }
    if save {
        state.save_session();
    }
    if load {
        state.load_session();
    }
    if export {
        state.export_texture();
    }
}
