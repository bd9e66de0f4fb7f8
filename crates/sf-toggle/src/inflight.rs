use sf_api_types::EntityId;
use std::cell::RefCell;
use std::collections::HashSet;

/// Ids with a mutation currently outstanding.
#[derive(Debug, Default)]
pub struct InFlightGuard {
    ids: RefCell<HashSet<EntityId>>,
}

impl InFlightGuard {
    /// Claim `entity_id`, or `None` if it is already claimed. The id is
    /// released when the returned ticket is dropped.
    pub fn try_acquire(&self, entity_id: &EntityId) -> Option<InFlightTicket<'_>> {
        if !self.ids.borrow_mut().insert(entity_id.clone()) {
            return None;
        }
        Some(InFlightTicket {
            guard: self,
            entity_id: entity_id.clone(),
        })
    }

    pub fn contains(&self, entity_id: &EntityId) -> bool {
        self.ids.borrow().contains(entity_id)
    }

    pub fn len(&self) -> usize {
        self.ids.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.borrow().is_empty()
    }
}

#[derive(Debug)]
pub struct InFlightTicket<'a> {
    guard: &'a InFlightGuard,
    entity_id: EntityId,
}

impl Drop for InFlightTicket<'_> {
    fn drop(&mut self) {
        self.guard.ids.borrow_mut().remove(&self.entity_id);
    }
}
