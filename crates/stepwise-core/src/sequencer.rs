//! Assembly sequencer: the explode / step / rewind state machine
//!
//! `current_step` is the single source of truth:
//! - `-1`: pre-assembled, every part at its original pose
//! - `0`: exploded, one sample per material staged at its anchor
//! - `n > 0`: steps `1..=n` executed
//!
//! Rewinding rebuilds the state from the exploded baseline by replaying
//! every step up to the new position instead of undoing incrementally.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;
use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::{find_model_root, model_base, Catalog, CatalogError, Part};
use crate::grouping::{build_groups, AnchorResolver, MaterialGroup};
use crate::hierarchy::{Hierarchy, HierarchyAnchors, NodeId};
use crate::highlight::StepHighlighter;
use crate::naming::NamingConfig;
use crate::presentation::apply_presentation;
use crate::stage::Stage;
use crate::steps::StepIndex;

/// Navigation command surfaced to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Navigation {
    Advance,
    Retreat,
    Reset,
}

impl Navigation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Navigation::Advance => "next",
            Navigation::Retreat => "previous",
            Navigation::Reset => "restart",
        }
    }

}

impl FromStr for Navigation {
    type Err = UnknownNavigation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "next" | "n" | "advance" => Ok(Navigation::Advance),
            "previous" | "prev" | "p" | "back" | "retreat" => Ok(Navigation::Retreat),
            "restart" | "reset" | "r" => Ok(Navigation::Reset),
            _ => Err(UnknownNavigation(s.trim().to_string())),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown navigation command '{0}'")]
pub struct UnknownNavigation(pub String);

/// Position of the sequencer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SequencerPhase {
    /// Fully assembled, nothing exploded yet
    PreAssembled,
    /// Exploded view, no step executed
    Exploded,
    /// Steps `1..=n` executed
    Stepped(u32),
}

/// Result of a navigation call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub navigation: Navigation,
    pub from: i32,
    pub to: i32,
}

impl Transition {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// One assembly session: catalog, groups, step index and navigation state
pub struct Sequencer {
    parts: Vec<Part>,
    groups: BTreeMap<String, MaterialGroup>,
    steps: StepIndex,
    current_step: i32,
    highlighter: Option<Box<dyn StepHighlighter + Send + Sync>>,
}

impl std::fmt::Debug for Sequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sequencer")
            .field("parts", &self.parts.len())
            .field("groups", &self.groups.len())
            .field("current_step", &self.current_step)
            .field("last_step", &self.last_step())
            .finish()
    }
}

impl Sequencer {
    /// Build groups and the step index from already discovered parts
    pub fn new(catalog: Catalog, resolver: &dyn AnchorResolver) -> Self {
        let parts = catalog.into_parts();
        let groups = build_groups(&parts, resolver);
        let steps = StepIndex::build(&parts);

        info!(
            parts = parts.len(),
            groups = groups.len(),
            last_step = steps.last_step(),
            "Sequencer ready"
        );

        Self {
            parts,
            groups,
            steps,
            current_step: -1,
            highlighter: None,
        }
    }

    /// Discover parts under the model root named `root_name`, searched
    /// below `scene_root`, and resolve anchors below the model root's parent
    ///
    /// A missing model root is fatal: no sequencer is built.
    pub fn from_hierarchy<H: Hierarchy + ?Sized>(
        hierarchy: &H,
        scene_root: NodeId,
        root_name: &str,
        naming: &NamingConfig,
    ) -> Result<Self, CatalogError> {
        let root = find_model_root(hierarchy, scene_root, root_name)?;
        let catalog = Catalog::discover(hierarchy, root, naming);
        let anchors = HierarchyAnchors::new(hierarchy, model_base(hierarchy, root), naming);
        Ok(Self::new(catalog, &anchors))
    }

    pub fn with_highlighter(mut self, highlighter: Box<dyn StepHighlighter + Send + Sync>) -> Self {
        self.highlighter = Some(highlighter);
        self
    }

    pub fn set_highlighter(&mut self, highlighter: Box<dyn StepHighlighter + Send + Sync>) {
        self.highlighter = Some(highlighter);
    }

    pub fn current_step(&self) -> i32 {
        self.current_step
    }

    pub fn last_step(&self) -> i32 {
        // Step numbers are bounded to i32 at classification
        self.steps.last_step() as i32
    }

    pub fn phase(&self) -> SequencerPhase {
        match self.current_step {
            s if s < 0 => SequencerPhase::PreAssembled,
            0 => SequencerPhase::Exploded,
            s => SequencerPhase::Stepped(s as u32),
        }
    }

    /// True once the last step is reached (labels are hidden)
    pub fn is_final(&self) -> bool {
        self.current_step == self.last_step()
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn groups(&self) -> impl Iterator<Item = &MaterialGroup> {
        self.groups.values()
    }

    pub fn group(&self, material: &str) -> Option<&MaterialGroup> {
        self.groups.get(material)
    }

    pub fn step_index(&self) -> &StepIndex {
        &self.steps
    }

    /// Parts not yet at their final pose
    pub fn unplaced_count(&self) -> usize {
        self.parts.iter().filter(|p| !p.placed).count()
    }

    /// Run a navigation command
    pub fn apply(&mut self, navigation: Navigation, stage: &mut dyn Stage) -> Transition {
        match navigation {
            Navigation::Advance => self.advance(stage),
            Navigation::Retreat => self.retreat(stage),
            Navigation::Reset => self.reset(stage),
        }
    }

    /// Mark every part unplaced and stage one sample per group at its anchor
    ///
    /// Poses of parts outside any group are not touched.
    pub fn explode_to_anchors(&mut self, stage: &mut dyn Stage) {
        for part in &mut self.parts {
            part.placed = false;
        }

        for group in self.groups.values() {
            apply_presentation(group, &self.parts, stage);
        }

        info!("Exploded view: one sample per material at its anchor");
    }

    /// Move every part of `step` to its final pose and refresh touched groups
    ///
    /// Returns `false` (and changes nothing) when no part has that step.
    pub fn execute_step(&mut self, step: u32, stage: &mut dyn Stage) -> bool {
        let Some(indices) = self.steps.parts_at(step) else {
            warn!(step, "No parts registered for step");
            return false;
        };

        let mut touched = BTreeSet::new();
        for &index in indices {
            let part = &mut self.parts[index];
            stage.set_visible(part.node, true);
            stage.set_local_pose(part.node, &part.original_pose);
            part.placed = true;
            touched.insert(part.material.clone());
        }

        for material in &touched {
            if let Some(group) = self.groups.get(material) {
                apply_presentation(group, &self.parts, stage);
            }
        }

        info!(step, parts = indices.len(), "Step executed");
        true
    }

    /// Next: explode from the assembled model, or execute the following step
    pub fn advance(&mut self, stage: &mut dyn Stage) -> Transition {
        let from = self.current_step;

        if self.current_step < 0 {
            self.explode_to_anchors(stage);
            self.current_step = 0;
        } else if self.current_step < self.last_step() {
            self.current_step += 1;
            self.execute_step(self.current_step as u32, stage);
        } else {
            info!(step = self.current_step, "Already at the last step");
        }

        if self.is_final() {
            self.hide_all_labels(stage);
        }

        self.notify_highlighter();
        Transition {
            navigation: Navigation::Advance,
            from,
            to: self.current_step,
        }
    }

    /// Previous: step back one, rebuilt by replay from the exploded view
    ///
    /// Never goes below the exploded view; use [`Sequencer::reset`] to
    /// return to the assembled model.
    pub fn retreat(&mut self, stage: &mut dyn Stage) -> Transition {
        let from = self.current_step;

        if self.current_step <= 0 {
            self.current_step = 0;
            self.explode_to_anchors(stage);
        } else {
            self.current_step -= 1;
            self.explode_to_anchors(stage);
            for step in 1..=self.current_step {
                self.execute_step(step as u32, stage);
            }
        }

        self.notify_highlighter();
        Transition {
            navigation: Navigation::Retreat,
            from,
            to: self.current_step,
        }
    }

    /// Restart: back to the assembled model with every label hidden
    pub fn reset(&mut self, stage: &mut dyn Stage) -> Transition {
        let from = self.current_step;
        self.current_step = -1;

        for part in &mut self.parts {
            part.placed = false;
            stage.set_visible(part.node, true);
            stage.set_local_pose(part.node, &part.original_pose);
        }
        self.hide_all_labels(stage);

        if let Some(highlighter) = self.highlighter.as_mut() {
            highlighter.hide_all();
        }

        info!("Model reset to original poses");
        Transition {
            navigation: Navigation::Reset,
            from,
            to: self.current_step,
        }
    }

    fn hide_all_labels(&self, stage: &mut dyn Stage) {
        for material in self.groups.keys() {
            stage.hide_label(material);
        }
    }

    fn notify_highlighter(&mut self) {
        if let Some(highlighter) = self.highlighter.as_mut() {
            highlighter.show_only(self.current_step);
        }
    }
}
