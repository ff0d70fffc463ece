//! Stepwise Core - Assembly sequencing for exploded-view furniture guides
//!
//! This crate provides the engine-independent heart of Stepwise:
//! - Part discovery and `Step<N>_<Material>` name classification
//! - Material grouping with anchor and count-label resolution
//! - Step index (step number to parts, highest step)
//! - Group presentation (sample part at the anchor, `x<N>` labels)
//! - The navigation state machine (advance, retreat, reset)
//!
//! Rendering, highlight playback and UI live behind the [`Stage`] and
//! [`StepHighlighter`] traits so hosts (bevy, the headless CLI) plug in.

pub mod catalog;
pub mod grouping;
pub mod guide;
pub mod hierarchy;
pub mod highlight;
pub mod naming;
pub mod pose;
pub mod presentation;
pub mod sequencer;
pub mod stage;
pub mod steps;

pub use catalog::{find_model_root, model_base, Catalog, CatalogError, Part};
pub use grouping::{build_groups, AnchorResolver, MaterialGroup};
pub use guide::{describe, GuideView};
pub use hierarchy::{
    find_descendant, find_path, Hierarchy, HierarchyAnchors, ManifestError, NodeId,
    SceneManifest, SceneNode, SceneTree,
};
pub use highlight::{pulse_intensity, IndicatorSet, PulseSettings, StepHighlighter};
pub use naming::{classify, indicator_step, NamingConfig};
pub use pose::Pose;
pub use presentation::{apply_presentation, label_text, select_sample};
pub use sequencer::{Navigation, Sequencer, SequencerPhase, Transition, UnknownNavigation};
pub use stage::{LabelState, NodeState, Placement, RecordingStage, Stage};
pub use steps::StepIndex;
