use serde::Serialize;
use sf_api_types::{Direction, Visibility};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VisibilityTransition {
    pub from: Visibility,
    pub to: Visibility,
    pub scroll_y: f64,
    pub direction: Direction,
}

/// Show/hide decision for a sticky header.
///
/// - Visible -> Hidden: past the threshold and moving down.
/// - Hidden -> Visible: any upward movement, or back within the threshold.
///
/// Anything else, including `Direction::None`, leaves the state alone.
#[derive(Debug, Clone)]
pub struct VisibilityStateMachine {
    state: Visibility,
    scroll_y: f64,
    threshold: f64,
}

impl VisibilityStateMachine {
    pub fn new(threshold: f64) -> Self {
        Self {
            state: Visibility::Visible,
            scroll_y: 0.0,
            threshold,
        }
    }

    pub fn observe(&mut self, scroll_y: f64, direction: Direction) -> Option<VisibilityTransition> {
        self.scroll_y = scroll_y;
        let next = match self.state {
            Visibility::Visible if scroll_y > self.threshold && direction == Direction::Down => Visibility::Hidden,
            Visibility::Hidden if direction == Direction::Up || scroll_y <= self.threshold => Visibility::Visible,
            current => current,
        };
        if next == self.state {
            return None;
        }
        let transition = VisibilityTransition {
            from: self.state,
            to: next,
            scroll_y,
            direction,
        };
        self.state = next;
        Some(transition)
    }

    pub fn state(&self) -> Visibility {
        self.state
    }

    pub fn is_visible(&self) -> bool {
        self.state == Visibility::Visible
    }

    pub fn scroll_y(&self) -> f64 {
        self.scroll_y
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Position-only flag for styling such as background blur.
    pub fn is_past_threshold(&self) -> bool {
        self.scroll_y > self.threshold
    }
}
