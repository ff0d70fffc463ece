//! Stage: the host scene as seen by the sequencer
//!
//! The sequencer only ever toggles visibility, moves nodes, and shows or
//! hides `x<N>` count labels. [`RecordingStage`] keeps that state in memory
//! for headless runs and tests.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::catalog::Part;
use crate::hierarchy::NodeId;
use crate::pose::Pose;

/// Scene operations the sequencer drives
pub trait Stage {
    fn set_visible(&mut self, node: NodeId, visible: bool);
    /// Restore a node's pose relative to its parent
    fn set_local_pose(&mut self, node: NodeId, pose: &Pose);
    /// Move a node to a world-space anchor (position and rotation; scale kept)
    fn place_at_anchor(&mut self, node: NodeId, anchor: &Pose);
    /// Create or update the count label of a material and show it
    fn show_label(&mut self, material: &str, text: &str, anchor: &Pose);
    fn hide_label(&mut self, material: &str);
}

/// Where a recorded node currently sits
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Placement {
    /// Local pose relative to the model (final position when restored)
    Local(Pose),
    /// World-space anchor position and rotation
    Anchored(Pose),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NodeState {
    pub placement: Placement,
    pub visible: bool,
}

impl Default for NodeState {
    fn default() -> Self {
        Self {
            placement: Placement::Local(Pose::IDENTITY),
            visible: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelState {
    pub text: String,
    pub anchor: Pose,
    pub visible: bool,
}

/// In-memory stage recording the latest state of every node and label
#[derive(Debug, Clone, Default)]
pub struct RecordingStage {
    nodes: HashMap<NodeId, NodeState>,
    labels: BTreeMap<String, LabelState>,
}

impl RecordingStage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with every part visible at its original pose, like a freshly loaded model
    pub fn from_parts(parts: &[Part]) -> Self {
        let mut stage = Self::new();
        for part in parts {
            stage.nodes.insert(
                part.node,
                NodeState {
                    placement: Placement::Local(part.original_pose),
                    visible: true,
                },
            );
        }
        stage
    }

    pub fn node(&self, node: NodeId) -> Option<&NodeState> {
        self.nodes.get(&node)
    }

    pub fn label(&self, material: &str) -> Option<&LabelState> {
        self.labels.get(material)
    }

    pub fn labels(&self) -> impl Iterator<Item = (&str, &LabelState)> {
        self.labels.iter().map(|(m, l)| (m.as_str(), l))
    }

    /// Labels currently shown, by material
    pub fn visible_labels(&self) -> Vec<(&str, &str)> {
        self.labels
            .iter()
            .filter(|(_, l)| l.visible)
            .map(|(m, l)| (m.as_str(), l.text.as_str()))
            .collect()
    }

    pub fn is_visible(&self, node: NodeId) -> bool {
        self.nodes.get(&node).is_some_and(|n| n.visible)
    }

    pub fn is_anchored_at(&self, node: NodeId, anchor: &Pose) -> bool {
        matches!(
            self.nodes.get(&node).map(|n| n.placement),
            Some(Placement::Anchored(pose))
                if pose.translation == anchor.translation && pose.rotation == anchor.rotation
        )
    }
}

impl Stage for RecordingStage {
    fn set_visible(&mut self, node: NodeId, visible: bool) {
        self.nodes.entry(node).or_default().visible = visible;
    }

    fn set_local_pose(&mut self, node: NodeId, pose: &Pose) {
        self.nodes.entry(node).or_default().placement = Placement::Local(*pose);
    }

    fn place_at_anchor(&mut self, node: NodeId, anchor: &Pose) {
        let state = self.nodes.entry(node).or_default();
        let scale = match state.placement {
            Placement::Local(pose) | Placement::Anchored(pose) => pose.scale,
        };
        state.placement = Placement::Anchored(Pose {
            translation: anchor.translation,
            rotation: anchor.rotation,
            scale,
        });
    }

    fn show_label(&mut self, material: &str, text: &str, anchor: &Pose) {
        self.labels.insert(
            material.to_string(),
            LabelState {
                text: text.to_string(),
                anchor: *anchor,
                visible: true,
            },
        );
    }

    fn hide_label(&mut self, material: &str) {
        if let Some(label) = self.labels.get_mut(material) {
            label.visible = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_anchor_keeps_scale() {
        let mut stage = RecordingStage::new();
        let node = NodeId(7);
        stage.set_local_pose(node, &Pose::IDENTITY.with_scale(Vec3::splat(0.5)));

        let anchor = Pose::from_translation(Vec3::new(1.0, 0.0, 0.0)).with_scale(Vec3::splat(3.0));
        stage.place_at_anchor(node, &anchor);

        assert!(stage.is_anchored_at(node, &anchor));
        match stage.node(node).unwrap().placement {
            Placement::Anchored(pose) => assert_eq!(pose.scale, Vec3::splat(0.5)),
            other => panic!("unexpected placement {other:?}"),
        }
    }

    #[test]
    fn test_hidden_label_only_after_shown() {
        let mut stage = RecordingStage::new();
        stage.hide_label("Leg");
        assert!(stage.label("Leg").is_none());

        stage.show_label("Leg", "x2", &Pose::IDENTITY);
        assert_eq!(stage.visible_labels(), vec![("Leg", "x2")]);

        stage.hide_label("Leg");
        assert!(stage.visible_labels().is_empty());
        assert_eq!(stage.label("Leg").unwrap().text, "x2");
    }
}
