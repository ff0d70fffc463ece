//! Pulsing step indicators driven by a tokio task
//!
//! At most one pulse task runs. Starting a new step stops the previous
//! task before the new one is spawned; a generation counter held under the
//! board lock keeps a task that is mid-iteration from writing after it was
//! replaced.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use stepwise_core::{IndicatorSet, PulseSettings, StepHighlighter};
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, warn};

/// Display state of one step indicator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorLight {
    pub active: bool,
    /// Emission factor, 1.0 at rest
    pub level: f32,
    /// Pulse iterations applied since the indicator was activated
    pub pulses: u64,
}

impl Default for IndicatorLight {
    fn default() -> Self {
        Self {
            active: false,
            level: 1.0,
            pulses: 0,
        }
    }
}

/// Shared indicator state read by the console
#[derive(Debug, Default)]
pub struct IndicatorBoard {
    lights: BTreeMap<u32, IndicatorLight>,
    generation: u64,
}

impl IndicatorBoard {
    pub fn from_indicators(indicators: &IndicatorSet) -> Self {
        Self {
            lights: indicators
                .iter()
                .map(|(step, _)| (step, IndicatorLight::default()))
                .collect(),
            generation: 0,
        }
    }

    pub fn light(&self, step: u32) -> Option<&IndicatorLight> {
        self.lights.get(&step)
    }

    /// Steps whose indicator is currently shown
    pub fn active_steps(&self) -> Vec<u32> {
        self.lights
            .iter()
            .filter(|(_, l)| l.active)
            .map(|(s, _)| *s)
            .collect()
    }

    /// Invalidate running pulses and turn every light off
    fn reset(&mut self) -> u64 {
        self.generation += 1;
        for light in self.lights.values_mut() {
            *light = IndicatorLight::default();
        }
        self.generation
    }
}

struct ActivePulse {
    step: u32,
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Highlighter that pulses the current step's indicator on the tokio runtime
///
/// Must be used from within a tokio runtime.
pub struct PulseHighlighter {
    board: Arc<Mutex<IndicatorBoard>>,
    settings: PulseSettings,
    tick: Duration,
    active: Option<ActivePulse>,
}

impl PulseHighlighter {
    pub fn new(indicators: &IndicatorSet, settings: PulseSettings, tick: Duration) -> Self {
        Self {
            board: Arc::new(Mutex::new(IndicatorBoard::from_indicators(indicators))),
            settings,
            tick,
            active: None,
        }
    }

    /// Shared handle to the indicator state
    pub fn board(&self) -> Arc<Mutex<IndicatorBoard>> {
        self.board.clone()
    }

    pub fn active_step(&self) -> Option<u32> {
        self.active.as_ref().map(|p| p.step)
    }

    fn stop_active(&mut self) {
        if let Some(pulse) = self.active.take() {
            pulse.stop.store(true, Ordering::Release);
            pulse.handle.abort();
            debug!(step = pulse.step, "Pulse stopped");
        }
    }

    fn start(&mut self, step: u32, generation: u64) {
        let stop = Arc::new(AtomicBool::new(false));
        let handle = tokio::spawn(pulse_loop(
            self.board.clone(),
            step,
            generation,
            self.settings,
            self.tick,
            stop.clone(),
        ));
        self.active = Some(ActivePulse { step, stop, handle });
        debug!(step, "Pulse started");
    }
}

impl StepHighlighter for PulseHighlighter {
    fn show_only(&mut self, step: i32) {
        self.stop_active();

        let Ok(mut board) = self.board.lock() else {
            return;
        };
        let generation = board.reset();

        let Ok(step) = u32::try_from(step) else {
            return;
        };
        if step == 0 {
            return;
        }

        let Some(light) = board.lights.get_mut(&step) else {
            warn!(step, "No indicator for step");
            return;
        };
        light.active = true;
        drop(board);

        self.start(step, generation);
    }

    fn hide_all(&mut self) {
        self.stop_active();
        if let Ok(mut board) = self.board.lock() {
            board.reset();
        }
    }
}

impl Drop for PulseHighlighter {
    fn drop(&mut self) {
        self.stop_active();
    }
}

async fn pulse_loop(
    board: Arc<Mutex<IndicatorBoard>>,
    step: u32,
    generation: u64,
    settings: PulseSettings,
    tick: Duration,
    stop: Arc<AtomicBool>,
) {
    let mut ticker = interval(tick);
    let dt = tick.as_secs_f32();
    let mut t = 0.0f32;

    loop {
        ticker.tick().await;
        if stop.load(Ordering::Acquire) {
            break;
        }

        t += dt * settings.speed;
        let Ok(mut board) = board.lock() else {
            break;
        };
        if board.generation != generation {
            break;
        }
        if let Some(light) = board.lights.get_mut(&step) {
            light.level = settings.factor(t);
            light.pulses += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stepwise_core::{SceneNode, SceneTree};

    fn highlighter() -> PulseHighlighter {
        let scene = SceneNode::new("Indicators")
            .with_child(SceneNode::new("Step1"))
            .with_child(SceneNode::new("Step2"))
            .with_child(SceneNode::new("Step3"));
        let tree = SceneTree::from_node(&scene);
        let indicators = IndicatorSet::discover(&tree, tree.root(), "Step");
        PulseHighlighter::new(&indicators, PulseSettings::default(), Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_only_one_indicator_pulses() {
        let mut highlighter = highlighter();
        let board = highlighter.board();

        highlighter.show_only(2);
        tokio::time::sleep(Duration::from_millis(30)).await;
        {
            let board = board.lock().unwrap();
            assert_eq!(board.active_steps(), vec![2]);
            assert!(board.light(2).unwrap().pulses > 0);
        }

        highlighter.show_only(3);
        tokio::time::sleep(Duration::from_millis(30)).await;
        let board = board.lock().unwrap();
        assert_eq!(board.active_steps(), vec![3]);
        assert_eq!(*board.light(2).unwrap(), IndicatorLight::default());
        assert_eq!(highlighter.active_step(), Some(3));
    }

    #[tokio::test]
    async fn test_non_positive_step_and_hide_all() {
        let mut highlighter = highlighter();
        let board = highlighter.board();

        highlighter.show_only(1);
        highlighter.show_only(0);
        assert!(highlighter.active_step().is_none());
        assert!(board.lock().unwrap().active_steps().is_empty());

        highlighter.show_only(1);
        highlighter.hide_all();
        tokio::time::sleep(Duration::from_millis(20)).await;
        let board = board.lock().unwrap();
        assert!(board.active_steps().is_empty());
        assert_eq!(board.light(1).unwrap().pulses, 0);
    }

    #[tokio::test]
    async fn test_unknown_step_shows_nothing() {
        let mut highlighter = highlighter();
        highlighter.show_only(9);
        assert!(highlighter.active_step().is_none());
        assert!(highlighter.board().lock().unwrap().active_steps().is_empty());
    }
}
