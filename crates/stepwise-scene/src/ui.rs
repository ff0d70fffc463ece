//! Guide panel, count label overlay and keyboard shortcuts (bevy_egui)

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPrimaryContextPass};
use stepwise_core::{describe, Navigation};

use crate::assembly::{ActiveAssembly, Navigate};
use crate::settings::AssemblySettings;
use crate::stage::CountLabels;

pub struct GuideUiPlugin;

impl Plugin for GuideUiPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, keyboard_navigation)
            // Runs in EguiPrimaryContextPass for proper input handling (bevy_egui 0.38+)
            .add_systems(EguiPrimaryContextPass, (guide_panel, count_label_overlay));
    }
}

/// Right arrow: next, left arrow: previous, R: restart
fn keyboard_navigation(keyboard: Res<ButtonInput<KeyCode>>, mut navigate: MessageWriter<Navigate>) {
    if keyboard.just_pressed(KeyCode::ArrowRight) {
        navigate.write(Navigate(Navigation::Advance));
    }
    if keyboard.just_pressed(KeyCode::ArrowLeft) {
        navigate.write(Navigate(Navigation::Retreat));
    }
    if keyboard.just_pressed(KeyCode::KeyR) {
        navigate.write(Navigate(Navigation::Reset));
    }
}

fn guide_panel(
    mut contexts: EguiContexts,
    assembly: Option<Res<ActiveAssembly>>,
    settings: Res<AssemblySettings>,
    mut navigate: MessageWriter<Navigate>,
) {
    let Ok(ctx) = contexts.ctx_mut() else { return };

    egui::TopBottomPanel::bottom("guide_panel").show(ctx, |ui| {
        let Some(assembly) = assembly.as_ref() else {
            ui.label(
                egui::RichText::new(format!("Looking for \"{}\"...", settings.root))
                    .color(egui::Color32::GRAY),
            );
            return;
        };

        let sequencer = &assembly.sequencer;
        let view = describe(sequencer.current_step(), sequencer.last_step(), &settings.step_texts);

        ui.add_space(4.0);
        ui.label(egui::RichText::new(&view.message).size(18.0));
        ui.add_space(4.0);

        ui.horizontal(|ui| {
            if view.show_previous && ui.button("Previous step").clicked() {
                navigate.write(Navigate(Navigation::Retreat));
            }
            if view.show_next && ui.button("Next step").clicked() {
                navigate.write(Navigate(Navigation::Advance));
            }
            if view.show_restart && ui.button("Restart").clicked() {
                navigate.write(Navigate(Navigation::Reset));
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(
                    egui::RichText::new(format!(
                        "{} / {}",
                        sequencer.current_step().max(0),
                        sequencer.last_step()
                    ))
                    .small()
                    .color(egui::Color32::GRAY),
                );
            });
        });
    });
}

/// Draw each visible `x<N>` label at its anchor, projected to the screen
fn count_label_overlay(
    mut contexts: EguiContexts,
    labels: Res<CountLabels>,
    cameras: Query<(&Camera, &GlobalTransform), With<Camera3d>>,
) {
    let Ok(ctx) = contexts.ctx_mut() else { return };
    let Some((camera, camera_transform)) = cameras.iter().find(|(camera, _)| camera.is_active) else {
        return;
    };

    for (material, label) in labels.visible() {
        let Ok(position) = camera.world_to_viewport(camera_transform, label.anchor.translation) else {
            continue;
        };

        egui::Area::new(egui::Id::new(("count_label", material)))
            .fixed_pos(egui::pos2(position.x, position.y))
            .pivot(egui::Align2::CENTER_CENTER)
            .interactable(false)
            .show(ctx, |ui| {
                ui.label(
                    egui::RichText::new(&label.text)
                        .size(22.0)
                        .strong()
                        .color(egui::Color32::WHITE),
                );
            });
    }
}
