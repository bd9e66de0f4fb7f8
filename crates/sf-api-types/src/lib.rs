use serde::{Deserialize, Serialize};
use std::fmt;

/// Message returned when a toggle is rejected because one is already running
/// for the same entity.
pub const ALREADY_IN_PROGRESS: &str = "already in progress";

/// Message returned when a mutation does not settle before its deadline.
pub const TIMED_OUT: &str = "timed out";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Result of a membership mutation, both as reported by the backend and as
/// returned to callers of the toggle engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MutationOutcome {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

impl MutationOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }

    pub fn already_in_progress() -> Self {
        Self::failed(ALREADY_IN_PROGRESS)
    }

    pub fn timed_out() -> Self {
        Self::failed(TIMED_OUT)
    }

    /// True for the duplicate-click rejection, which is informational rather
    /// than a server failure.
    pub fn is_already_in_progress(&self) -> bool {
        !self.success && self.message == ALREADY_IN_PROGRESS
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MembershipState {
    pub is_member: bool,
    pub pending: bool,
}

/// Which membership list a toggle targets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MembershipKind {
    Wishlist,
    Cart,
}

impl MembershipKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MembershipKind::Wishlist => "wishlist",
            MembershipKind::Cart => "cart",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    #[default]
    None,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SignalSource {
    Native,
    Wheel,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ScrollSample {
    pub raw_position: f64,
    pub timestamp_ms: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_accepts_missing_message() {
        let outcome: MutationOutcome = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert_eq!(outcome, MutationOutcome::ok(""));
    }

    #[test]
    fn duplicate_rejection_is_distinguishable_from_server_failure() {
        assert!(MutationOutcome::already_in_progress().is_already_in_progress());
        assert!(!MutationOutcome::failed("out of stock").is_already_in_progress());
        assert!(!MutationOutcome::ok(ALREADY_IN_PROGRESS).is_already_in_progress());
    }

    #[test]
    fn enums_use_snake_case_on_the_wire() {
        assert_eq!(serde_json::to_string(&Direction::Down).unwrap(), r#""down""#);
        assert_eq!(serde_json::to_string(&Visibility::Hidden).unwrap(), r#""hidden""#);
        assert_eq!(
            serde_json::from_str::<SignalSource>(r#""wheel""#).unwrap(),
            SignalSource::Wheel
        );
        assert_eq!(MembershipKind::Cart.as_str(), "cart");
    }
}
