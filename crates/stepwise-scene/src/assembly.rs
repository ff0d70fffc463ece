//! Assembly session inside the bevy app
//!
//! The model root is looked up by name every frame until it has spawned
//! with its children. From then on [`ActiveAssembly`] holds the sequencer
//! and [`Navigate`] messages drive it.

use bevy::prelude::*;
use stepwise_core::{find_path, Hierarchy, IndicatorSet, Navigation, Sequencer};
use tracing::{error, info, warn};

use crate::hierarchy::{entity_node, node_entity, EntityHierarchy, NodeData};
use crate::indicators::{
    advance_pulses, apply_highlight_requests, HighlightRequests, IndicatorHighlighter,
    StepIndicators,
};
use crate::settings::AssemblySettings;
use crate::stage::{apply_stage_commands, BevyStage, CountLabels, StageQueue};

/// The running assembly guide
#[derive(Resource, Debug)]
pub struct ActiveAssembly {
    pub sequencer: Sequencer,
    /// Parent of the model root; anchors and indicators resolve below it
    pub scene_root: Entity,
    pub model_root: Entity,
}

/// Request to move through the assembly
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Navigate(pub Navigation);

/// Discovery, navigation and highlight state without rendering
pub struct AssemblyPlugin;

impl Plugin for AssemblyPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AssemblySettings>()
            .init_resource::<StageQueue>()
            .init_resource::<CountLabels>()
            .init_resource::<HighlightRequests>()
            .add_message::<Navigate>()
            .add_systems(
                Update,
                (
                    discover_assembly.run_if(not(resource_exists::<ActiveAssembly>)),
                    apply_navigation,
                    apply_stage_commands,
                    apply_highlight_requests,
                    advance_pulses,
                )
                    .chain(),
            );
    }
}

fn discover_assembly(
    mut commands: Commands,
    settings: Res<AssemblySettings>,
    requests: Res<HighlightRequests>,
    named: Query<(Entity, &Name)>,
    nodes: Query<NodeData>,
    mut announced: Local<bool>,
) {
    let Some(model_root) = named
        .iter()
        .find(|(_, name)| name.as_str() == settings.root)
        .map(|(entity, _)| entity)
    else {
        if !*announced {
            info!(root = %settings.root, "Waiting for model root");
            *announced = true;
        }
        return;
    };

    let hierarchy = EntityHierarchy::new(&nodes);
    let model_node = entity_node(model_root);
    if hierarchy.children(model_node).is_empty() {
        return;
    }

    let scene_node = match hierarchy.parent(model_node) {
        Some(parent) => parent,
        None => {
            warn!(root = %settings.root, "Model root has no parent, resolving anchors below it");
            model_node
        }
    };

    let sequencer =
        match Sequencer::from_hierarchy(&hierarchy, scene_node, &settings.root, &settings.naming) {
            Ok(sequencer) => sequencer,
            Err(e) => {
                error!(error = %e, "Assembly discovery failed");
                return;
            }
        };

    let indicator_set = match find_path(&hierarchy, scene_node, &settings.naming.indicators_path) {
        Some(container) => IndicatorSet::discover(&hierarchy, container, &settings.naming.step_prefix),
        None => IndicatorSet::default(),
    };
    let indicators = StepIndicators::from_set(&indicator_set);
    for entity in indicators.entities() {
        commands.entity(entity).insert(Visibility::Hidden);
    }

    let sequencer = sequencer.with_highlighter(Box::new(IndicatorHighlighter::new(requests.clone())));
    info!(
        parts = sequencer.parts().len(),
        last_step = sequencer.last_step(),
        indicators = indicators.len(),
        "Assembly ready"
    );

    commands.insert_resource(indicators);
    commands.insert_resource(ActiveAssembly {
        sequencer,
        scene_root: node_entity(scene_node),
        model_root,
    });
}

fn apply_navigation(
    mut navigate: MessageReader<Navigate>,
    assembly: Option<ResMut<ActiveAssembly>>,
    mut queue: ResMut<StageQueue>,
    mut labels: ResMut<CountLabels>,
) {
    let Some(mut assembly) = assembly else {
        navigate.clear();
        return;
    };

    for &Navigate(navigation) in navigate.read() {
        let mut stage = BevyStage::new(&mut queue, &mut labels);
        let transition = assembly.sequencer.apply(navigation, &mut stage);
        info!(
            command = navigation.as_str(),
            from = transition.from,
            to = transition.to,
            "Navigation"
        );
    }
}
