use serde::Serialize;
use sf_api_types::{Direction, SignalSource, Visibility};
use sf_config::EngineConfig;
use tracing::debug;

use crate::tracker::{ScrollReading, ScrollTracker, SignalDiagnostics};
use crate::visibility::{VisibilityStateMachine, VisibilityTransition};

pub type TransitionListener = Box<dyn FnMut(&VisibilityTransition)>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeaderSnapshot {
    pub visibility: Visibility,
    pub scroll_y: f64,
    pub is_past_threshold: bool,
    pub direction: Direction,
    pub source: SignalSource,
}

/// Scroll tracker and visibility state machine behind one event-loop facing
/// surface. Listeners hear about transitions only; how the header animates
/// is up to them.
pub struct HeaderVisibility {
    tracker: ScrollTracker,
    machine: VisibilityStateMachine,
    last_direction: Direction,
    listeners: Vec<TransitionListener>,
}

impl HeaderVisibility {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            tracker: ScrollTracker::new(config),
            machine: VisibilityStateMachine::new(config.threshold),
            last_direction: Direction::None,
            listeners: Vec::new(),
        }
    }

    pub fn on_transition<F>(&mut self, listener: F)
    where
        F: FnMut(&VisibilityTransition) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn on_native_scroll(&mut self, position: f64, timestamp_ms: f64) -> Option<VisibilityTransition> {
        let reading = self.tracker.sample_native(position, timestamp_ms)?;
        self.apply(reading)
    }

    pub fn on_wheel(&mut self, delta_y: f64, timestamp_ms: f64) -> Option<VisibilityTransition> {
        let reading = self.tracker.sample_wheel(delta_y, timestamp_ms)?;
        self.apply(reading)
    }

    /// Adopt the page's current offset, e.g. on load after scroll
    /// restoration, without treating the jump as movement.
    pub fn sync_position(&mut self, position: f64) -> Option<VisibilityTransition> {
        let position = self.tracker.sync_position(position)?;
        self.last_direction = Direction::None;
        self.settle(position, Direction::None, self.tracker.active_source())
    }

    pub fn is_visible(&self) -> bool {
        self.machine.is_visible()
    }

    pub fn visibility(&self) -> Visibility {
        self.machine.state()
    }

    pub fn is_past_threshold(&self) -> bool {
        self.machine.is_past_threshold()
    }

    pub fn scroll_y(&self) -> f64 {
        self.machine.scroll_y()
    }

    pub fn direction(&self) -> Direction {
        self.last_direction
    }

    pub fn active_source(&self) -> SignalSource {
        self.tracker.active_source()
    }

    pub fn diagnostics(&self) -> Option<&SignalDiagnostics> {
        self.tracker.diagnostics()
    }

    pub fn snapshot(&self) -> HeaderSnapshot {
        HeaderSnapshot {
            visibility: self.visibility(),
            scroll_y: self.scroll_y(),
            is_past_threshold: self.is_past_threshold(),
            direction: self.last_direction,
            source: self.active_source(),
        }
    }

    fn apply(&mut self, reading: ScrollReading) -> Option<VisibilityTransition> {
        self.last_direction = reading.direction;
        self.settle(reading.scroll_y, reading.direction, reading.source)
    }

    fn settle(&mut self, scroll_y: f64, direction: Direction, source: SignalSource) -> Option<VisibilityTransition> {
        let transition = self.machine.observe(scroll_y, direction)?;
        debug!(
            "header {:?} -> {:?} at y={} ({:?}, {:?})",
            transition.from, transition.to, transition.scroll_y, transition.direction, source
        );
        for listener in &mut self.listeners {
            listener(&transition);
        }
        Some(transition)
    }
}
