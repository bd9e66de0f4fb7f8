use serde::Serialize;
use sf_api_types::{Direction, ScrollSample, SignalSource};
use sf_config::EngineConfig;
use tracing::debug;

/// Direction of a position change, ignoring movement within `epsilon`.
pub fn classify(delta: f64, epsilon: f64) -> Direction {
    if delta > epsilon {
        Direction::Down
    } else if delta < -epsilon {
        Direction::Up
    } else {
        Direction::None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScrollReading {
    pub scroll_y: f64,
    pub delta: f64,
    pub direction: Direction,
    pub source: SignalSource,
    pub timestamp_ms: f64,
}

/// Synthetic scroll position built from wheel deltas.
#[derive(Debug, Clone)]
pub struct WheelAccumulator {
    position: f64,
    sensitivity: f64,
}

impl WheelAccumulator {
    pub fn new(sensitivity: f64) -> Self {
        Self {
            position: 0.0,
            sensitivity,
        }
    }

    /// Apply a scaled delta; the position never goes below zero.
    pub fn push(&mut self, delta_y: f64) -> f64 {
        self.position = (self.position + delta_y * self.sensitivity).max(0.0);
        self.position
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn reset_to(&mut self, position: f64) {
        self.position = position.max(0.0);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SourceDiagnostics {
    pub last: Option<ScrollSample>,
    pub samples: u64,
}

impl SourceDiagnostics {
    fn record(&mut self, sample: ScrollSample) {
        self.last = Some(sample);
        self.samples += 1;
    }
}

/// Side-by-side view of both signal sources, kept only in debug mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalDiagnostics {
    pub active: SignalSource,
    pub native: SourceDiagnostics,
    pub wheel: SourceDiagnostics,
}

#[derive(Debug, Clone)]
pub struct ScrollTracker {
    active: SignalSource,
    epsilon: f64,
    previous: Option<f64>,
    wheel: WheelAccumulator,
    diagnostics: Option<SignalDiagnostics>,
}

impl ScrollTracker {
    pub fn new(config: &EngineConfig) -> Self {
        let active = if config.use_wheel_fallback {
            SignalSource::Wheel
        } else {
            SignalSource::Native
        };
        Self {
            active,
            epsilon: config.direction_epsilon,
            previous: None,
            wheel: WheelAccumulator::new(config.wheel_sensitivity),
            diagnostics: config.debug.then(|| SignalDiagnostics {
                active,
                native: SourceDiagnostics::default(),
                wheel: SourceDiagnostics::default(),
            }),
        }
    }

    pub fn active_source(&self) -> SignalSource {
        self.active
    }

    pub fn diagnostics(&self) -> Option<&SignalDiagnostics> {
        self.diagnostics.as_ref()
    }

    /// Adopt an absolute position without producing a reading, e.g. the
    /// offset a page was restored at. Seeds the wheel accumulator so the
    /// fallback continues from there. Returns the position now in effect.
    pub fn sync_position(&mut self, position: f64) -> Option<f64> {
        if !position.is_finite() {
            return None;
        }
        self.wheel.reset_to(position);
        let position = match self.active {
            SignalSource::Native => position,
            SignalSource::Wheel => self.wheel.position(),
        };
        self.previous = Some(position);
        Some(position)
    }

    /// Feed a native scroll offset. Returns `None` when the wheel fallback is
    /// driving decisions or the value is not finite.
    pub fn sample_native(&mut self, position: f64, timestamp_ms: f64) -> Option<ScrollReading> {
        if !position.is_finite() {
            return None;
        }
        self.record(SignalSource::Native, position, timestamp_ms);
        if self.active != SignalSource::Native {
            return None;
        }
        Some(self.advance(position, timestamp_ms))
    }

    /// Feed a wheel delta. The accumulator always tracks wheel input so debug
    /// output can compare it with the native offset, but a reading is only
    /// produced when the fallback is active.
    pub fn sample_wheel(&mut self, delta_y: f64, timestamp_ms: f64) -> Option<ScrollReading> {
        if !delta_y.is_finite() {
            return None;
        }
        let position = self.wheel.push(delta_y);
        self.record(SignalSource::Wheel, position, timestamp_ms);
        if self.active != SignalSource::Wheel {
            return None;
        }
        Some(self.advance(position, timestamp_ms))
    }

    fn advance(&mut self, position: f64, timestamp_ms: f64) -> ScrollReading {
        let delta = self.previous.map_or(0.0, |previous| position - previous);
        self.previous = Some(position);
        ScrollReading {
            scroll_y: position,
            delta,
            direction: classify(delta, self.epsilon),
            source: self.active,
            timestamp_ms,
        }
    }

    fn record(&mut self, source: SignalSource, raw_position: f64, timestamp_ms: f64) {
        let Some(diagnostics) = self.diagnostics.as_mut() else {
            return;
        };
        let sample = ScrollSample {
            raw_position,
            timestamp_ms,
        };
        match source {
            SignalSource::Native => diagnostics.native.record(sample),
            SignalSource::Wheel => diagnostics.wheel.record(sample),
        }
        debug!(
            "scroll signal {:?}: position={} t={} (driving: {:?})",
            source, raw_position, timestamp_ms, diagnostics.active
        );
    }
}
