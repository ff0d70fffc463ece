//! Part catalog: discovery of tagged parts in the model hierarchy

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::hierarchy::{Hierarchy, NodeId};
use crate::naming::NamingConfig;
use crate::pose::Pose;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Model root '{0}' not found in scene")]
    MissingRoot(String),
}

/// A single tagged part of the assembled item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    /// Source node name, e.g. `Step2_Leg3`
    pub name: String,
    /// Scene node this part drives
    pub node: NodeId,
    /// Step at which the part reaches its final pose
    pub step: u32,
    /// Material key (label without trailing digits)
    pub material: String,
    /// Local pose captured at discovery; the final assembled position
    pub original_pose: Pose,
    /// Whether the part sits at its final pose in the current session
    #[serde(default)]
    pub placed: bool,
}

impl Part {
    pub fn new(
        name: impl Into<String>,
        node: NodeId,
        step: u32,
        material: impl Into<String>,
        original_pose: Pose,
    ) -> Self {
        Self {
            name: name.into(),
            node,
            step,
            material: material.into(),
            original_pose,
            placed: false,
        }
    }
}

/// All parts discovered under the model root, in discovery order
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    parts: Vec<Part>,
}

/// `scene_root` itself or its first descendant named `root_name`
pub fn find_model_root<H: Hierarchy + ?Sized>(
    hierarchy: &H,
    scene_root: NodeId,
    root_name: &str,
) -> Result<NodeId, CatalogError> {
    if hierarchy.name(scene_root) == Some(root_name) {
        return Ok(scene_root);
    }
    crate::hierarchy::find_descendant(hierarchy, scene_root, root_name)
        .ok_or_else(|| CatalogError::MissingRoot(root_name.to_string()))
}

/// Node that anchors and indicators are resolved below: the model root's
/// parent, or the model root itself when it has none
pub fn model_base<H: Hierarchy + ?Sized>(hierarchy: &H, model_root: NodeId) -> NodeId {
    hierarchy.parent(model_root).unwrap_or(model_root)
}

impl Catalog {
    pub fn from_parts(parts: Vec<Part>) -> Self {
        Self { parts }
    }

    /// Walk every descendant of `root` and collect the tagged parts
    ///
    /// Nodes whose names do not match are skipped but their children are
    /// still visited, so tagged parts may sit at any depth.
    pub fn discover<H: Hierarchy + ?Sized>(hierarchy: &H, root: NodeId, naming: &NamingConfig) -> Self {
        let mut parts = Vec::new();
        collect_parts(hierarchy, root, naming, &mut parts);
        info!(parts = parts.len(), "Parts discovered");
        Self { parts }
    }

    /// Find the model root by name below `scene_root`, then discover
    pub fn discover_named<H: Hierarchy + ?Sized>(
        hierarchy: &H,
        scene_root: NodeId,
        root_name: &str,
        naming: &NamingConfig,
    ) -> Result<Self, CatalogError> {
        let root = find_model_root(hierarchy, scene_root, root_name)?;
        Ok(Self::discover(hierarchy, root, naming))
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn into_parts(self) -> Vec<Part> {
        self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Distinct materials in first-discovery order
    pub fn materials(&self) -> Vec<&str> {
        let mut materials: Vec<&str> = Vec::new();
        for part in &self.parts {
            if !materials.contains(&part.material.as_str()) {
                materials.push(&part.material);
            }
        }
        materials
    }
}

fn collect_parts<H: Hierarchy + ?Sized>(
    hierarchy: &H,
    parent: NodeId,
    naming: &NamingConfig,
    parts: &mut Vec<Part>,
) {
    for child in hierarchy.children(parent) {
        let name = hierarchy.name(child).unwrap_or_default();
        match naming.classify(name) {
            Some((step, material)) => {
                parts.push(Part::new(
                    name,
                    child,
                    step,
                    material,
                    hierarchy.local_pose(child),
                ));
            }
            None => {
                debug!(node = %name, "Node without step tag, not sequenced");
            }
        }

        collect_parts(hierarchy, child, naming, parts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::{SceneNode, SceneTree};
    use glam::Vec3;

    fn furniture() -> SceneTree {
        let scene = SceneNode::new("Target").with_child(
            SceneNode::new("Model")
                .with_child(
                    SceneNode::new("Step1_Leg1")
                        .with_pose(Pose::from_translation(Vec3::new(0.1, 0.0, 0.0))),
                )
                .with_child(
                    SceneNode::new("Frame")
                        .with_child(SceneNode::new("Step2_Shelf"))
                        .with_child(SceneNode::new("Step1_Leg2")),
                )
                .with_child(SceneNode::new("Step3_Screw12")),
        );
        SceneTree::from_node(&scene)
    }

    #[test]
    fn test_discover_depth_first() {
        let tree = furniture();
        let naming = NamingConfig::default();
        let catalog = Catalog::discover_named(&tree, tree.root(), "Model", &naming).unwrap();

        let names: Vec<&str> = catalog.parts().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Step1_Leg1", "Step2_Shelf", "Step1_Leg2", "Step3_Screw12"]);

        let leg = &catalog.parts()[0];
        assert_eq!(leg.step, 1);
        assert_eq!(leg.material, "Leg");
        assert_eq!(leg.original_pose.translation, Vec3::new(0.1, 0.0, 0.0));
        assert!(!leg.placed);

        assert_eq!(catalog.materials(), vec!["Leg", "Shelf", "Screw"]);
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let tree = furniture();
        let naming = NamingConfig::default();
        let err = Catalog::discover_named(&tree, tree.root(), "Sofa", &naming).unwrap_err();
        assert!(matches!(err, CatalogError::MissingRoot(name) if name == "Sofa"));
    }

    #[test]
    fn test_root_itself_is_not_classified() {
        let scene = SceneNode::new("Step1_Root").with_child(SceneNode::new("Step2_Top"));
        let tree = SceneTree::from_node(&scene);
        let catalog = Catalog::discover(&tree, tree.root(), &NamingConfig::default());
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.parts()[0].material, "Top");
    }
}
