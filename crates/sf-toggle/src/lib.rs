//! Optimistic membership toggles for wishlist and cart buttons.
//!
//! `ToggleMutator` flips local state before the backend answers, rejects a
//! second toggle for an id that is still in flight, and restores the
//! pre-toggle value when the mutation fails.

mod inflight;
mod mutator;
mod store;

pub use inflight::{InFlightGuard, InFlightTicket};
pub use mutator::{BulkItem, BulkToggleReport, MembershipMutation, ToggleMutator};
pub use store::{InMemoryMembershipStore, Listener, MembershipChange, MembershipStore, SubscriptionId};
