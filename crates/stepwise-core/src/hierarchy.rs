//! Scene hierarchy access and the serde scene manifest
//!
//! The sequencer never owns the scene. Hosts expose their node tree through
//! the [`Hierarchy`] trait; [`SceneTree`] is the in-memory implementation
//! built from a JSON or TOML [`SceneManifest`].

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::grouping::AnchorResolver;
use crate::naming::NamingConfig;
use crate::pose::Pose;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse JSON manifest: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Failed to parse TOML manifest: {0}")]
    TomlError(#[from] toml::de::Error),
    #[error("Unsupported manifest format: {0}")]
    UnsupportedFormat(String),
}

/// Opaque handle to a node in the host scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Read access to a named node tree
pub trait Hierarchy {
    /// Node name, if the node has one
    fn name(&self, node: NodeId) -> Option<&str>;
    /// Direct children in scene order
    fn children(&self, node: NodeId) -> Vec<NodeId>;
    fn parent(&self, node: NodeId) -> Option<NodeId>;
    /// Pose relative to the parent
    fn local_pose(&self, node: NodeId) -> Pose;

    /// Pose relative to the scene origin, composed up the parent chain
    fn world_pose(&self, node: NodeId) -> Pose {
        let mut pose = self.local_pose(node);
        let mut current = self.parent(node);
        while let Some(parent) = current {
            pose = self.local_pose(parent).mul_pose(&pose);
            current = self.parent(parent);
        }
        pose
    }
}

/// Direct child of `parent` named `name`
pub fn find_child<H: Hierarchy + ?Sized>(hierarchy: &H, parent: NodeId, name: &str) -> Option<NodeId> {
    hierarchy
        .children(parent)
        .into_iter()
        .find(|child| hierarchy.name(*child) == Some(name))
}

/// Resolve a `/`-separated path of child names starting below `base`
pub fn find_path<H: Hierarchy + ?Sized>(hierarchy: &H, base: NodeId, path: &str) -> Option<NodeId> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .try_fold(base, |node, segment| find_child(hierarchy, node, segment))
}

/// First descendant of `root` (depth-first, pre-order) named `name`
pub fn find_descendant<H: Hierarchy + ?Sized>(hierarchy: &H, root: NodeId, name: &str) -> Option<NodeId> {
    for child in hierarchy.children(root) {
        if hierarchy.name(child) == Some(name) {
            return Some(child);
        }
        if let Some(found) = find_descendant(hierarchy, child, name) {
            return Some(found);
        }
    }
    None
}

/// Anchor lookup by naming convention, relative to a base node
///
/// The base is the node that holds both the model and the anchors
/// container (the tracked target in an AR scene).
pub struct HierarchyAnchors<'a, H: Hierarchy + ?Sized> {
    hierarchy: &'a H,
    base: NodeId,
    naming: &'a NamingConfig,
}

impl<'a, H: Hierarchy + ?Sized> HierarchyAnchors<'a, H> {
    pub fn new(hierarchy: &'a H, base: NodeId, naming: &'a NamingConfig) -> Self {
        Self {
            hierarchy,
            base,
            naming,
        }
    }

    fn anchor_node(&self, material: &str) -> Option<NodeId> {
        find_path(self.hierarchy, self.base, &self.naming.anchor_path(material))
    }
}

impl<H: Hierarchy + ?Sized> AnchorResolver for HierarchyAnchors<'_, H> {
    fn resolve_anchor(&self, material: &str) -> Option<Pose> {
        self.anchor_node(material)
            .map(|node| self.hierarchy.world_pose(node))
    }

    fn resolve_label(&self, material: &str) -> Option<Pose> {
        let anchor = self.anchor_node(material)?;
        find_child(self.hierarchy, anchor, &self.naming.label_name(material))
            .map(|node| self.hierarchy.world_pose(node))
    }
}

/// A node in the scene manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneNode {
    pub name: String,
    #[serde(default)]
    pub pose: Pose,
    #[serde(default)]
    pub children: Vec<SceneNode>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pose: Pose::IDENTITY,
            children: Vec::new(),
        }
    }

    pub fn with_pose(mut self, pose: Pose) -> Self {
        self.pose = pose;
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }
}

/// Scene manifest describing the tracked scene root and everything below it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneManifest {
    #[serde(default = "default_version")]
    pub version: String,
    pub scene: SceneNode,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl SceneManifest {
    pub fn new(scene: SceneNode) -> Self {
        Self {
            version: default_version(),
            scene,
        }
    }

    /// Load a manifest, picking the format from the file extension
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            Some("toml") => Self::from_toml(&content),
            other => Err(ManifestError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }

    pub fn from_json(content: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn from_toml(content: &str) -> Result<Self, ManifestError> {
        Ok(toml::from_str(content)?)
    }
}

#[derive(Debug, Clone)]
struct TreeNode {
    name: String,
    pose: Pose,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed node tree built from a [`SceneNode`]
#[derive(Debug, Clone)]
pub struct SceneTree {
    nodes: Vec<TreeNode>,
}

impl SceneTree {
    pub fn from_node(root: &SceneNode) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.insert(root, None);
        debug!(nodes = tree.nodes.len(), "Scene tree built");
        tree
    }

    pub fn from_manifest(manifest: &SceneManifest) -> Self {
        Self::from_node(&manifest.scene)
    }

    fn insert(&mut self, node: &SceneNode, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u64);
        self.nodes.push(TreeNode {
            name: node.name.clone(),
            pose: node.pose,
            parent,
            children: Vec::new(),
        });
        for child in &node.children {
            let child_id = self.insert(child, Some(id));
            self.nodes[id.0 as usize].children.push(child_id);
        }
        id
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// First node below the root named `name`
    pub fn find(&self, name: &str) -> Option<NodeId> {
        find_descendant(self, self.root(), name)
    }

    fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id.0 as usize)
    }
}

impl Hierarchy for SceneTree {
    fn name(&self, node: NodeId) -> Option<&str> {
        self.node(node).map(|n| n.name.as_str())
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.node(node).map(|n| n.children.clone()).unwrap_or_default()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).and_then(|n| n.parent)
    }

    fn local_pose(&self, node: NodeId) -> Pose {
        self.node(node).map(|n| n.pose).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn sample_tree() -> SceneTree {
        let scene = SceneNode::new("Target")
            .with_pose(Pose::from_translation(Vec3::new(0.0, 1.0, 0.0)))
            .with_child(SceneNode::new("Model").with_child(SceneNode::new("Step1_Leg1")))
            .with_child(
                SceneNode::new("Anchors").with_child(
                    SceneNode::new("Anchor_Leg")
                        .with_pose(Pose::from_translation(Vec3::new(2.0, 0.0, 0.0)))
                        .with_child(
                            SceneNode::new("Label_Leg")
                                .with_pose(Pose::from_translation(Vec3::new(0.0, 0.5, 0.0))),
                        ),
                ),
            );
        SceneTree::from_node(&scene)
    }

    #[test]
    fn test_find_path_and_descendant() {
        let tree = sample_tree();
        let anchor = find_path(&tree, tree.root(), "Anchors/Anchor_Leg").unwrap();
        assert_eq!(tree.name(anchor), Some("Anchor_Leg"));
        assert!(find_path(&tree, tree.root(), "Anchors/Anchor_Top").is_none());

        let leg = tree.find("Step1_Leg1").unwrap();
        assert_eq!(tree.parent(leg), tree.find("Model"));
    }

    #[test]
    fn test_anchor_resolution_uses_world_pose() {
        let tree = sample_tree();
        let naming = NamingConfig::default();
        let anchors = HierarchyAnchors::new(&tree, tree.root(), &naming);

        let anchor = anchors.resolve_anchor("Leg").unwrap();
        assert_eq!(anchor.translation, Vec3::new(2.0, 1.0, 0.0));

        let label = anchors.resolve_label("Leg").unwrap();
        assert_eq!(label.translation, Vec3::new(2.0, 1.5, 0.0));

        assert!(anchors.resolve_anchor("Top").is_none());
        assert!(anchors.resolve_label("Top").is_none());
    }

    #[test]
    fn test_manifest_from_toml() {
        let toml = r#"
[scene]
name = "Target"

[[scene.children]]
name = "Model"

[[scene.children.children]]
name = "Step2_Shelf"
pose = { translation = [0.0, 0.4, 0.0] }

[[scene.children]]
name = "Anchors"
"#;

        let manifest = SceneManifest::from_toml(toml).unwrap();
        assert_eq!(manifest.version, "1.0");

        let tree = SceneTree::from_manifest(&manifest);
        assert_eq!(tree.len(), 4);
        let shelf = tree.find("Step2_Shelf").unwrap();
        assert_eq!(tree.local_pose(shelf).translation, Vec3::new(0.0, 0.4, 0.0));
    }

    #[test]
    fn test_manifest_from_file_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = SceneManifest::new(SceneNode::new("Target").with_child(SceneNode::new("Model")));

        let json_path = dir.path().join("scene.json");
        std::fs::write(&json_path, serde_json::to_string(&manifest).unwrap()).unwrap();
        let loaded = SceneManifest::from_file(&json_path).unwrap();
        assert_eq!(loaded.scene.children[0].name, "Model");

        let yaml_path = dir.path().join("scene.yaml");
        std::fs::write(&yaml_path, "scene: {}").unwrap();
        assert!(matches!(
            SceneManifest::from_file(&yaml_path),
            Err(ManifestError::UnsupportedFormat(_))
        ));
    }
}
