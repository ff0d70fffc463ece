//! Material grouping: one staged anchor and count label per material

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{error, info};

use crate::catalog::Part;
use crate::pose::Pose;

/// Lookup of the staging anchor and count-label point for a material
pub trait AnchorResolver {
    /// Where the group's sample part is staged; `None` excludes the group
    fn resolve_anchor(&self, material: &str) -> Option<Pose>;
    /// Where the `x<N>` label is shown; falls back to the anchor when `None`
    fn resolve_label(&self, material: &str) -> Option<Pose>;
}

/// Fixed anchors keyed by material, without dedicated label points
impl AnchorResolver for HashMap<String, Pose> {
    fn resolve_anchor(&self, material: &str) -> Option<Pose> {
        self.get(material).copied()
    }

    fn resolve_label(&self, _material: &str) -> Option<Pose> {
        None
    }
}

/// All parts sharing a material, ordered by step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialGroup {
    pub material: String,
    /// Where the staged sample part appears
    pub anchor_pose: Pose,
    /// Where the remaining-count label appears
    pub label_anchor: Pose,
    /// Catalog indices sorted ascending by step (stable on ties)
    ordered_parts: Vec<usize>,
}

impl MaterialGroup {
    pub fn new(material: impl Into<String>, anchor_pose: Pose, label_anchor: Option<Pose>) -> Self {
        Self {
            material: material.into(),
            anchor_pose,
            label_anchor: label_anchor.unwrap_or(anchor_pose),
            ordered_parts: Vec::new(),
        }
    }

    pub fn ordered_parts(&self) -> &[usize] {
        &self.ordered_parts
    }

    pub fn len(&self) -> usize {
        self.ordered_parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered_parts.is_empty()
    }

    /// Number of parts in this group not yet placed
    pub fn remaining(&self, parts: &[Part]) -> usize {
        self.ordered_parts
            .iter()
            .filter(|&&i| parts.get(i).is_some_and(|p| !p.placed))
            .count()
    }
}

/// Partition catalog indices by material, in first-discovery order
pub fn partition_by_material(parts: &[Part]) -> Vec<(String, Vec<usize>)> {
    let mut partitions: Vec<(String, Vec<usize>)> = Vec::new();
    for (index, part) in parts.iter().enumerate() {
        match partitions.iter_mut().find(|(m, _)| *m == part.material) {
            Some((_, members)) => members.push(index),
            None => partitions.push((part.material.clone(), vec![index])),
        }
    }
    partitions
}

/// Build one group per material that has an anchor
///
/// Materials without an anchor are logged and left out: their parts still
/// execute with their step but never get a staged preview or label.
pub fn build_groups(parts: &[Part], resolver: &dyn AnchorResolver) -> BTreeMap<String, MaterialGroup> {
    let partitions = partition_by_material(parts);
    let total = partitions.len();
    let mut groups = BTreeMap::new();

    for (material, mut members) in partitions {
        info!(material = %material, parts = members.len(), "Material found");

        let Some(anchor_pose) = resolver.resolve_anchor(&material) else {
            error!(material = %material, "No anchor found for material, parts will not be staged");
            continue;
        };
        let label_anchor = resolver.resolve_label(&material);

        // Vec::sort_by_key is stable, ties keep discovery order
        members.sort_by_key(|&i| parts[i].step);

        let mut group = MaterialGroup::new(material.clone(), anchor_pose, label_anchor);
        group.ordered_parts = members;

        info!(
            material = %material,
            parts = group.len(),
            dedicated_label = label_anchor.is_some(),
            "Group linked to anchor"
        );
        groups.insert(material, group);
    }

    info!(anchored = groups.len(), materials = total, "Material groups built");
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::NodeId;
    use glam::Vec3;

    fn part(id: u64, name: &str, step: u32, material: &str) -> Part {
        Part::new(name, NodeId(id), step, material, Pose::IDENTITY)
    }

    #[test]
    fn test_groups_sorted_by_step_stable() {
        let parts = vec![
            part(0, "Step3_Leg1", 3, "Leg"),
            part(1, "Step1_Leg2", 1, "Leg"),
            part(2, "Step1_Leg3", 1, "Leg"),
            part(3, "Step2_Top", 2, "Top"),
        ];
        let mut anchors = HashMap::new();
        anchors.insert("Leg".to_string(), Pose::from_translation(Vec3::X));
        anchors.insert("Top".to_string(), Pose::from_translation(Vec3::Y));

        let groups = build_groups(&parts, &anchors);
        assert_eq!(groups.len(), 2);

        let legs = &groups["Leg"];
        assert_eq!(legs.ordered_parts(), &[1, 2, 0]);
        assert_eq!(legs.anchor_pose.translation, Vec3::X);
        assert_eq!(legs.label_anchor, legs.anchor_pose);
        assert_eq!(legs.remaining(&parts), 3);
    }

    #[test]
    fn test_missing_anchor_excludes_group() {
        let parts = vec![part(0, "Step1_Leg", 1, "Leg"), part(1, "Step1_Top", 1, "Top")];
        let mut anchors = HashMap::new();
        anchors.insert("Leg".to_string(), Pose::IDENTITY);

        let groups = build_groups(&parts, &anchors);
        assert!(groups.contains_key("Leg"));
        assert!(!groups.contains_key("Top"));
    }

    #[test]
    fn test_partition_keeps_discovery_order() {
        let parts = vec![
            part(0, "Step2_Top", 2, "Top"),
            part(1, "Step1_Leg", 1, "Leg"),
            part(2, "Step3_Top2", 3, "Top"),
        ];
        let partitions = partition_by_material(&parts);
        assert_eq!(partitions[0], ("Top".to_string(), vec![0, 2]));
        assert_eq!(partitions[1], ("Leg".to_string(), vec![1]));
    }
}
