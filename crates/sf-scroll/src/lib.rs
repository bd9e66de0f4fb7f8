//! Scroll-driven header visibility.
//!
//! `ScrollTracker` turns native scroll offsets, or accumulated wheel deltas
//! when the native signal is unreliable, into a position and direction.
//! `VisibilityStateMachine` decides whether the sticky header is shown.
//! `HeaderVisibility` wires the two together for a host event loop.

mod header;
mod tracker;
mod visibility;

pub use header::{HeaderSnapshot, HeaderVisibility, TransitionListener};
pub use tracker::{ScrollReading, ScrollTracker, SignalDiagnostics, SourceDiagnostics, WheelAccumulator, classify};
pub use visibility::{VisibilityStateMachine, VisibilityTransition};
