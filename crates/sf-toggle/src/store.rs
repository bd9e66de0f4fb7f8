use sf_api_types::{EntityId, MembershipState};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipChange {
    pub entity_id: EntityId,
    pub previous: Option<MembershipState>,
    pub current: Option<MembershipState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type Listener = Rc<dyn Fn(&MembershipChange)>;

/// State holder shared between the toggle engine and the views reading it.
///
/// Methods take `&self`: implementations live on a single-threaded event
/// loop and use interior mutability.
pub trait MembershipStore {
    fn get(&self, entity_id: &EntityId) -> Option<MembershipState>;
    fn set(&self, entity_id: &EntityId, state: MembershipState);
    fn remove(&self, entity_id: &EntityId);
    fn subscribe(&self, listener: Listener) -> SubscriptionId;
    fn unsubscribe(&self, subscription: SubscriptionId) -> bool;
}

impl<S: MembershipStore + ?Sized> MembershipStore for Rc<S> {
    fn get(&self, entity_id: &EntityId) -> Option<MembershipState> {
        (**self).get(entity_id)
    }

    fn set(&self, entity_id: &EntityId, state: MembershipState) {
        (**self).set(entity_id, state)
    }

    fn remove(&self, entity_id: &EntityId) {
        (**self).remove(entity_id)
    }

    fn subscribe(&self, listener: Listener) -> SubscriptionId {
        (**self).subscribe(listener)
    }

    fn unsubscribe(&self, subscription: SubscriptionId) -> bool {
        (**self).unsubscribe(subscription)
    }
}

#[derive(Default)]
pub struct InMemoryMembershipStore {
    entries: RefCell<HashMap<EntityId, MembershipState>>,
    listeners: RefCell<Vec<(SubscriptionId, Listener)>>,
    next_subscription: Cell<u64>,
}

impl InMemoryMembershipStore {
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    fn notify(&self, change: MembershipChange) {
        // Snapshot so listeners may subscribe or write back without a double borrow.
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(&change);
        }
    }
}

impl MembershipStore for InMemoryMembershipStore {
    fn get(&self, entity_id: &EntityId) -> Option<MembershipState> {
        self.entries.borrow().get(entity_id).copied()
    }

    fn set(&self, entity_id: &EntityId, state: MembershipState) {
        let previous = self.entries.borrow_mut().insert(entity_id.clone(), state);
        if previous != Some(state) {
            self.notify(MembershipChange {
                entity_id: entity_id.clone(),
                previous,
                current: Some(state),
            });
        }
    }

    fn remove(&self, entity_id: &EntityId) {
        let previous = self.entries.borrow_mut().remove(entity_id);
        if previous.is_some() {
            self.notify(MembershipChange {
                entity_id: entity_id.clone(),
                previous,
                current: None,
            });
        }
    }

    fn subscribe(&self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.get());
        self.next_subscription.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, listener));
        id
    }

    fn unsubscribe(&self, subscription: SubscriptionId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(id, _)| *id != subscription);
        listeners.len() != before
    }
}
