//! Bevy entity hierarchy seen through the core `Hierarchy` trait

use bevy::prelude::*;
use stepwise_core::{Hierarchy, NodeId, Pose};

/// Components read while walking the scene
pub type NodeData = (
    Option<&'static Name>,
    Option<&'static Children>,
    Option<&'static ChildOf>,
    &'static Transform,
);

pub fn entity_node(entity: Entity) -> NodeId {
    NodeId(entity.to_bits())
}

pub fn node_entity(node: NodeId) -> Entity {
    Entity::from_bits(node.0)
}

pub fn pose_from_transform(transform: &Transform) -> Pose {
    Pose {
        translation: transform.translation,
        rotation: transform.rotation,
        scale: transform.scale,
    }
}

pub fn transform_from_pose(pose: &Pose) -> Transform {
    Transform {
        translation: pose.translation,
        rotation: pose.rotation,
        scale: pose.scale,
    }
}

/// Read-only view over the spawned scene
pub struct EntityHierarchy<'q, 'w, 's> {
    nodes: &'q Query<'w, 's, NodeData>,
}

impl<'q, 'w, 's> EntityHierarchy<'q, 'w, 's> {
    pub fn new(nodes: &'q Query<'w, 's, NodeData>) -> Self {
        Self { nodes }
    }
}

impl Hierarchy for EntityHierarchy<'_, '_, '_> {
    fn name(&self, node: NodeId) -> Option<&str> {
        let (name, _, _, _) = self.nodes.get(node_entity(node)).ok()?;
        name.map(|n| n.as_str())
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        match self.nodes.get(node_entity(node)) {
            Ok((_, Some(children), _, _)) => children.to_vec().into_iter().map(entity_node).collect(),
            _ => Vec::new(),
        }
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        let (_, _, child_of, _) = self.nodes.get(node_entity(node)).ok()?;
        child_of.map(|c| entity_node(c.parent()))
    }

    fn local_pose(&self, node: NodeId) -> Pose {
        self.nodes
            .get(node_entity(node))
            .map(|(_, _, _, transform)| pose_from_transform(transform))
            .unwrap_or(Pose::IDENTITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::SystemState;
    use stepwise_core::find_path;

    #[test]
    fn test_entity_round_trip() {
        let mut world = World::new();
        let entity = world.spawn_empty().id();
        assert_eq!(node_entity(entity_node(entity)), entity);
    }

    #[test]
    fn test_walks_named_children() {
        let mut world = World::new();
        let root = world.spawn((Name::new("Target"), Transform::default())).id();
        let anchors = world
            .spawn((Name::new("Anchors"), Transform::from_xyz(0.0, 1.0, 0.0), ChildOf(root)))
            .id();
        let leg = world
            .spawn((Name::new("Anchor_Leg"), Transform::from_xyz(2.0, 0.0, 0.0), ChildOf(anchors)))
            .id();

        let mut state: SystemState<Query<NodeData>> = SystemState::new(&mut world);
        let nodes = state.get(&world);
        let hierarchy = EntityHierarchy::new(&nodes);

        let found = find_path(&hierarchy, entity_node(root), "Anchors/Anchor_Leg");
        assert_eq!(found, Some(entity_node(leg)));
        assert_eq!(hierarchy.parent(entity_node(leg)), Some(entity_node(anchors)));
        assert_eq!(
            hierarchy.world_pose(entity_node(leg)).translation,
            Vec3::new(2.0, 1.0, 0.0)
        );
    }
}
