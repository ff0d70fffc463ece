//! Step indicators: only the current step's indicator is shown and pulses
//!
//! The sequencer talks to [`IndicatorHighlighter`], which queues requests
//! in a shared buffer. [`apply_highlight_requests`] turns them into
//! `Visibility` changes and a [`Pulsing`] component on the active
//! indicator; removing the component cancels the pulse.

use bevy::color::LinearRgba;
use bevy::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use stepwise_core::{IndicatorSet, StepHighlighter};
use tracing::{debug, warn};

use crate::hierarchy::node_entity;
use crate::settings::AssemblySettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightRequest {
    ShowOnly(i32),
    HideAll,
}

/// Requests written by the sequencer, drained once per frame
#[derive(Resource, Clone, Default)]
pub struct HighlightRequests(pub Arc<Mutex<Vec<HighlightRequest>>>);

impl HighlightRequests {
    fn push(&self, request: HighlightRequest) {
        if let Ok(mut queue) = self.0.lock() {
            queue.push(request);
        }
    }

    fn drain(&self) -> Vec<HighlightRequest> {
        match self.0.lock() {
            Ok(mut queue) => queue.drain(..).collect(),
            Err(_) => Vec::new(),
        }
    }
}

/// [`StepHighlighter`] handed to the sequencer
pub struct IndicatorHighlighter {
    requests: HighlightRequests,
}

impl IndicatorHighlighter {
    pub fn new(requests: HighlightRequests) -> Self {
        Self { requests }
    }
}

impl StepHighlighter for IndicatorHighlighter {
    fn show_only(&mut self, step: i32) {
        self.requests.push(HighlightRequest::ShowOnly(step));
    }

    fn hide_all(&mut self) {
        self.requests.push(HighlightRequest::HideAll);
    }
}

/// Indicator entities by step
#[derive(Resource, Debug, Clone, Default)]
pub struct StepIndicators {
    indicators: BTreeMap<u32, Entity>,
}

impl StepIndicators {
    pub fn from_set(set: &IndicatorSet) -> Self {
        Self {
            indicators: set
                .iter()
                .map(|(step, node)| (step, node_entity(node)))
                .collect(),
        }
    }

    pub fn get(&self, step: i32) -> Option<Entity> {
        u32::try_from(step)
            .ok()
            .and_then(|s| self.indicators.get(&s).copied())
    }

    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.indicators.values().copied()
    }

    pub fn len(&self) -> usize {
        self.indicators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }
}

/// Active pulse on an indicator entity
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Pulsing {
    pub phase: f32,
    /// Emission factor, 1.0 at rest
    pub level: f32,
}

impl Default for Pulsing {
    fn default() -> Self {
        Self {
            phase: 0.0,
            level: 1.0,
        }
    }
}

pub fn apply_highlight_requests(
    mut commands: Commands,
    requests: Res<HighlightRequests>,
    indicators: Option<Res<StepIndicators>>,
) {
    let pending = requests.drain();
    let Some(indicators) = indicators else {
        return;
    };

    for request in pending {
        for entity in indicators.entities() {
            commands
                .entity(entity)
                .remove::<Pulsing>()
                .insert(Visibility::Hidden);
        }

        let HighlightRequest::ShowOnly(step) = request else {
            continue;
        };
        if step <= 0 {
            continue;
        }

        match indicators.get(step) {
            Some(entity) => {
                commands
                    .entity(entity)
                    .insert((Visibility::Inherited, Pulsing::default()));
                debug!(step, "Indicator pulsing");
            }
            None => warn!(step, "No indicator for step"),
        }
    }
}

pub fn advance_pulses(
    time: Res<Time>,
    settings: Res<AssemblySettings>,
    mut pulsing: Query<&mut Pulsing>,
) {
    let dt = time.delta_secs();
    for mut pulse in &mut pulsing {
        pulse.phase += dt * settings.pulse.speed;
        pulse.level = settings.pulse.factor(pulse.phase);
    }
}

/// Per-mesh material clones with their original emission
#[derive(Resource, Default)]
pub struct PulseMaterials {
    owned: HashMap<Entity, (Handle<StandardMaterial>, LinearRgba)>,
}

/// Scale the emission of every mesh below a pulsing indicator
///
/// Each mesh gets its own material clone so other meshes sharing the
/// material are unaffected.
pub fn apply_pulse_emission(
    mut commands: Commands,
    pulsing: Query<(Entity, &Pulsing)>,
    children: Query<&Children>,
    mesh_materials: Query<&MeshMaterial3d<StandardMaterial>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut cache: ResMut<PulseMaterials>,
) {
    for (indicator, pulse) in &pulsing {
        for entity in std::iter::once(indicator).chain(children.iter_descendants(indicator)) {
            let Ok(material) = mesh_materials.get(entity) else {
                continue;
            };

            let (handle, base) = cache.owned.entry(entity).or_insert_with(|| {
                match materials.get(&material.0).cloned() {
                    Some(original) => {
                        let base = original.emissive;
                        let handle = materials.add(original);
                        commands.entity(entity).insert(MeshMaterial3d(handle.clone()));
                        (handle, base)
                    }
                    None => (material.0.clone(), LinearRgba::BLACK),
                }
            });

            if let Some(material) = materials.get_mut(&*handle) {
                material.emissive = scaled(*base, pulse.level);
            }
        }
    }
}

/// Put the original emission back once an indicator stops pulsing
pub fn restore_emission(
    mut removed: RemovedComponents<Pulsing>,
    children: Query<&Children>,
    cache: Res<PulseMaterials>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    for indicator in removed.read() {
        for entity in std::iter::once(indicator).chain(children.iter_descendants(indicator)) {
            let Some((handle, base)) = cache.owned.get(&entity) else {
                continue;
            };
            if let Some(material) = materials.get_mut(handle) {
                material.emissive = *base;
            }
        }
    }
}

fn scaled(color: LinearRgba, factor: f32) -> LinearRgba {
    LinearRgba::new(
        color.red * factor,
        color.green * factor,
        color.blue * factor,
        color.alpha,
    )
}
