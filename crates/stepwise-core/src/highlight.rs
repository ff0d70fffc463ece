//! Step indicators and the highlight collaborator
//!
//! Each step may have an indicator node (e.g. spheres marking where the
//! screws go). Exactly one indicator pulses at a time: the one of the
//! current step.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::hierarchy::{Hierarchy, NodeId};
use crate::naming::indicator_step;

/// Receiver of "highlight only this step" notifications
pub trait StepHighlighter {
    /// Show and pulse only the indicator for `step`; `step <= 0` shows none
    fn show_only(&mut self, step: i32);
    /// Stop any pulse and hide every indicator
    fn hide_all(&mut self);
}

/// Pulse timing shared by every highlighter implementation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PulseSettings {
    /// Phase advance per second
    #[serde(default = "default_speed")]
    pub speed: f32,
    /// Emission multiplier at full intensity is `1 + gain`
    #[serde(default = "default_gain")]
    pub gain: f32,
}

fn default_speed() -> f32 {
    4.0
}

fn default_gain() -> f32 {
    3.0
}

impl Default for PulseSettings {
    fn default() -> Self {
        Self {
            speed: default_speed(),
            gain: default_gain(),
        }
    }
}

impl PulseSettings {
    /// Emission factor at phase `t`
    pub fn factor(&self, t: f32) -> f32 {
        1.0 + pulse_intensity(t) * self.gain
    }
}

/// Pulse intensity in `[0, 1]` at phase `t`
pub fn pulse_intensity(t: f32) -> f32 {
    0.5 + 0.5 * t.sin()
}

/// Indicator nodes keyed by step
#[derive(Debug, Clone, Default)]
pub struct IndicatorSet {
    indicators: BTreeMap<u32, NodeId>,
}

impl IndicatorSet {
    /// Collect direct children of `container` whose name carries `<prefix><N>`
    pub fn discover<H: Hierarchy + ?Sized>(hierarchy: &H, container: NodeId, prefix: &str) -> Self {
        let mut indicators = BTreeMap::new();
        for child in hierarchy.children(container) {
            let Some(step) = hierarchy.name(child).and_then(|n| indicator_step(n, prefix)) else {
                continue;
            };
            indicators.insert(step, child);
        }
        info!(indicators = indicators.len(), "Step indicators found");
        Self { indicators }
    }

    pub fn get(&self, step: i32) -> Option<NodeId> {
        u32::try_from(step)
            .ok()
            .and_then(|s| self.indicators.get(&s).copied())
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, NodeId)> + '_ {
        self.indicators.iter().map(|(s, n)| (*s, *n))
    }

    pub fn len(&self) -> usize {
        self.indicators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }
}
