//! Stage adapter: sequencer output buffered, then applied to entities
//!
//! The sequencer runs inside a system that has no query access to the
//! parts, so [`BevyStage`] only records commands. [`apply_stage_commands`]
//! writes them to `Transform` and `Visibility` in the same frame.

use bevy::prelude::*;
use std::collections::BTreeMap;
use stepwise_core::{LabelState, NodeId, Pose, Stage};

use crate::hierarchy::{node_entity, pose_from_transform, transform_from_pose};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StageCommand {
    SetVisible { entity: Entity, visible: bool },
    /// Restore the pose relative to the parent
    SetLocal { entity: Entity, pose: Pose },
    /// Move to a world-space pose, keeping the current scale
    PlaceAt { entity: Entity, pose: Pose },
}

/// Commands waiting for [`apply_stage_commands`]
#[derive(Resource, Debug, Default)]
pub struct StageQueue {
    commands: Vec<StageCommand>,
}

impl StageQueue {
    pub fn push(&mut self, command: StageCommand) {
        self.commands.push(command);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// `x<N>` count labels by material, drawn by the UI overlay
#[derive(Resource, Debug, Default)]
pub struct CountLabels {
    labels: BTreeMap<String, LabelState>,
}

impl CountLabels {
    pub fn get(&self, material: &str) -> Option<&LabelState> {
        self.labels.get(material)
    }

    pub fn visible(&self) -> impl Iterator<Item = (&str, &LabelState)> {
        self.labels
            .iter()
            .filter(|(_, l)| l.visible)
            .map(|(m, l)| (m.as_str(), l))
    }
}

/// [`Stage`] backed by the bevy world
pub struct BevyStage<'a> {
    queue: &'a mut StageQueue,
    labels: &'a mut CountLabels,
}

impl<'a> BevyStage<'a> {
    pub fn new(queue: &'a mut StageQueue, labels: &'a mut CountLabels) -> Self {
        Self { queue, labels }
    }
}

impl Stage for BevyStage<'_> {
    fn set_visible(&mut self, node: NodeId, visible: bool) {
        self.queue.push(StageCommand::SetVisible {
            entity: node_entity(node),
            visible,
        });
    }

    fn set_local_pose(&mut self, node: NodeId, pose: &Pose) {
        self.queue.push(StageCommand::SetLocal {
            entity: node_entity(node),
            pose: *pose,
        });
    }

    fn place_at_anchor(&mut self, node: NodeId, anchor: &Pose) {
        self.queue.push(StageCommand::PlaceAt {
            entity: node_entity(node),
            pose: *anchor,
        });
    }

    fn show_label(&mut self, material: &str, text: &str, anchor: &Pose) {
        self.labels.labels.insert(
            material.to_string(),
            LabelState {
                text: text.to_string(),
                anchor: *anchor,
                visible: true,
            },
        );
    }

    fn hide_label(&mut self, material: &str) {
        if let Some(label) = self.labels.labels.get_mut(material) {
            label.visible = false;
        }
    }
}

/// Write queued stage commands to the scene
pub fn apply_stage_commands(
    mut commands: Commands,
    mut queue: ResMut<StageQueue>,
    mut transforms: Query<&mut Transform>,
    parents: Query<&ChildOf>,
    globals: Query<&GlobalTransform>,
) {
    if queue.is_empty() {
        return;
    }

    for command in queue.commands.drain(..) {
        match command {
            StageCommand::SetVisible { entity, visible } => {
                if let Ok(mut entity_commands) = commands.get_entity(entity) {
                    entity_commands.insert(if visible {
                        Visibility::Inherited
                    } else {
                        Visibility::Hidden
                    });
                }
            }
            StageCommand::SetLocal { entity, pose } => {
                if let Ok(mut transform) = transforms.get_mut(entity) {
                    *transform = transform_from_pose(&pose);
                }
            }
            StageCommand::PlaceAt { entity, pose } => {
                let parent_world = parents
                    .get(entity)
                    .ok()
                    .and_then(|child_of| globals.get(child_of.parent()).ok())
                    .map(|global| pose_from_transform(&global.compute_transform()))
                    .unwrap_or(Pose::IDENTITY);
                let local = pose.relative_to(&parent_world);

                if let Ok(mut transform) = transforms.get_mut(entity) {
                    transform.translation = local.translation;
                    transform.rotation = local.rotation;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::entity_node;

    #[test]
    fn test_labels_keep_text_when_hidden() {
        let mut queue = StageQueue::default();
        let mut labels = CountLabels::default();
        let mut stage = BevyStage::new(&mut queue, &mut labels);

        stage.show_label("Leg", "x3", &Pose::IDENTITY);
        stage.show_label("Top", "x1", &Pose::IDENTITY);
        stage.hide_label("Top");
        stage.hide_label("Shelf");

        assert_eq!(labels.get("Top").unwrap().text, "x1");
        let visible: Vec<&str> = labels.visible().map(|(m, _)| m).collect();
        assert_eq!(visible, vec!["Leg"]);
    }

    #[test]
    fn test_anchor_placement_is_relative_to_parent() {
        let mut app = App::new();
        app.init_resource::<StageQueue>()
            .add_systems(Update, apply_stage_commands);

        let world = app.world_mut();
        let parent = world
            .spawn((Transform::from_xyz(1.0, 0.0, 0.0), GlobalTransform::from_xyz(1.0, 0.0, 0.0)))
            .id();
        let part = world
            .spawn((Transform::from_xyz(0.5, 0.0, 0.0).with_scale(Vec3::splat(2.0)), ChildOf(parent)))
            .id();

        {
            let mut queue = world.resource_mut::<StageQueue>();
            queue.push(StageCommand::PlaceAt {
                entity: part,
                pose: Pose::from_translation(Vec3::new(4.0, 2.0, 0.0)),
            });
            queue.push(StageCommand::SetVisible {
                entity: part,
                visible: false,
            });
        }
        app.update();

        let transform = app.world().get::<Transform>(part).unwrap();
        assert_eq!(transform.translation, Vec3::new(3.0, 2.0, 0.0));
        assert_eq!(transform.scale, Vec3::splat(2.0));
        assert_eq!(app.world().get::<Visibility>(part), Some(&Visibility::Hidden));
        assert!(app.world().resource::<StageQueue>().is_empty());

        let mut queue = StageQueue::default();
        let mut labels = CountLabels::default();
        BevyStage::new(&mut queue, &mut labels).set_local_pose(entity_node(part), &Pose::IDENTITY);
        assert_eq!(
            queue.commands,
            vec![StageCommand::SetLocal {
                entity: part,
                pose: Pose::IDENTITY
            }]
        );
    }
}
