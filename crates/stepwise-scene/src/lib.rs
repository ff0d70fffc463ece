//! Stepwise Scene - Bevy front end for assembly guides
//!
//! Finds the model in a spawned scene by name, runs the core sequencer on
//! it and renders the guide: parts moved between anchors and their final
//! poses, `x<N>` count labels, the pulsing indicator of the current step
//! and an egui navigation panel.

pub mod assembly;
pub mod hierarchy;
pub mod indicators;
pub mod settings;
pub mod stage;
pub mod ui;

use bevy::prelude::*;

/// Emission pulse on the active indicator's meshes
pub struct IndicatorPulsePlugin;

impl Plugin for IndicatorPulsePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<indicators::PulseMaterials>().add_systems(
            Update,
            (indicators::restore_emission, indicators::apply_pulse_emission)
                .chain()
                .after(indicators::advance_pulses),
        );
    }
}

/// Everything needed to show an assembly guide; requires `EguiPlugin`
pub struct StepwisePlugin;

impl Plugin for StepwisePlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(assembly::AssemblyPlugin)
            .add_plugins(IndicatorPulsePlugin)
            .add_plugins(ui::GuideUiPlugin);
    }
}

// Re-export commonly used types
pub use assembly::{ActiveAssembly, AssemblyPlugin, Navigate};
pub use settings::AssemblySettings;
pub use stage::{BevyStage, CountLabels};
