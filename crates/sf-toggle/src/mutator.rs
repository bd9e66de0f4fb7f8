use anyhow::Result;
use async_trait::async_trait;
use futures::future::{self, Either};
use serde::Serialize;
use sf_api_types::{EntityId, MembershipState, MutationOutcome};
use std::future::Future;
use std::pin::pin;
use tracing::{debug, warn};

use crate::inflight::InFlightGuard;
use crate::store::MembershipStore;

/// The persistence call behind a toggle, supplied by the caller.
///
/// `Ok` with `success: false` is a rejection; `Err` is a transport or
/// handler failure. Both roll the optimistic write back.
#[async_trait(?Send)]
pub trait MembershipMutation {
    async fn mutate(&self, entity_id: &EntityId) -> Result<MutationOutcome>;
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BulkItem {
    pub entity_id: EntityId,
    pub outcome: MutationOutcome,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct BulkToggleReport {
    pub items: Vec<BulkItem>,
    pub succeeded: usize,
    pub failed: usize,
}

impl FromIterator<(EntityId, MutationOutcome)> for BulkToggleReport {
    fn from_iter<I: IntoIterator<Item = (EntityId, MutationOutcome)>>(iter: I) -> Self {
        let mut report = BulkToggleReport::default();
        for (entity_id, outcome) in iter {
            if outcome.success {
                report.succeeded += 1;
            } else {
                report.failed += 1;
            }
            report.items.push(BulkItem { entity_id, outcome });
        }
        report
    }
}

pub struct ToggleMutator<S> {
    store: S,
    in_flight: InFlightGuard,
}

impl<S> ToggleMutator<S>
where
    S: MembershipStore,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            in_flight: InFlightGuard::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_member(&self, entity_id: &EntityId) -> Option<bool> {
        self.store.get(entity_id).map(|state| state.is_member)
    }

    pub fn is_pending(&self, entity_id: &EntityId) -> bool {
        self.store.get(entity_id).is_some_and(|state| state.pending)
    }

    pub fn is_in_flight(&self, entity_id: &EntityId) -> bool {
        self.in_flight.contains(entity_id)
    }

    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Record the server's view of an entity as it enters the visible set.
    /// Ignored while a toggle for the id is outstanding.
    pub fn seed(&self, entity_id: &EntityId, is_member: bool) -> bool {
        if self.in_flight.contains(entity_id) {
            return false;
        }
        self.store.set(
            entity_id,
            MembershipState {
                is_member,
                pending: false,
            },
        );
        true
    }

    /// Drop cached state for an entity that left the visible set. A toggle
    /// still in flight for it settles without recreating the entry.
    pub fn evict(&self, entity_id: &EntityId) {
        self.store.remove(entity_id);
    }

    /// Flip membership optimistically and reconcile with `mutation`.
    ///
    /// Never fails: rejections, errors and duplicate clicks all come back as
    /// a `MutationOutcome` with `success: false`.
    pub async fn toggle<M>(&self, entity_id: &EntityId, current_member: bool, mutation: &M) -> MutationOutcome
    where
        M: MembershipMutation + ?Sized,
    {
        self.run(entity_id, current_member, mutation, future::pending::<()>())
            .await
    }

    /// Like `toggle`, but gives up when `deadline` completes first. The
    /// abandoned mutation is dropped and the optimistic write reverted.
    pub async fn toggle_with_deadline<M, D>(
        &self,
        entity_id: &EntityId,
        current_member: bool,
        mutation: &M,
        deadline: D,
    ) -> MutationOutcome
    where
        M: MembershipMutation + ?Sized,
        D: Future<Output = ()>,
    {
        self.run(entity_id, current_member, mutation, deadline).await
    }

    /// Toggle each `(id, current_member)` pair independently and concurrently.
    /// There is no atomicity across items.
    pub async fn toggle_many<M>(&self, items: &[(EntityId, bool)], mutation: &M) -> BulkToggleReport
    where
        M: MembershipMutation + ?Sized,
    {
        let outcomes = future::join_all(
            items
                .iter()
                .map(|(entity_id, current_member)| self.toggle(entity_id, *current_member, mutation)),
        )
        .await;

        items
            .iter()
            .map(|(entity_id, _)| entity_id.clone())
            .zip(outcomes)
            .collect()
    }

    async fn run<M, D>(&self, entity_id: &EntityId, current_member: bool, mutation: &M, deadline: D) -> MutationOutcome
    where
        M: MembershipMutation + ?Sized,
        D: Future<Output = ()>,
    {
        let Some(_ticket) = self.in_flight.try_acquire(entity_id) else {
            debug!("toggle for {} ignored: mutation already in flight", entity_id);
            return MutationOutcome::already_in_progress();
        };

        let write = OptimisticWrite::apply(&self.store, entity_id, current_member);

        let outcome = match future::select(mutation.mutate(entity_id), pin!(deadline)).await {
            Either::Left((Ok(outcome), _)) => outcome,
            Either::Left((Err(err), _)) => {
                warn!("membership mutation for {} failed: {}", entity_id, err);
                MutationOutcome::failed(err.to_string())
            }
            Either::Right(((), _)) => {
                warn!("membership mutation for {} timed out", entity_id);
                MutationOutcome::timed_out()
            }
        };

        if !outcome.success {
            debug!("rolling back {} to is_member={}: {}", entity_id, current_member, outcome.message);
        }
        write.settle(outcome.success);
        outcome
    }
}

/// An optimistic write that must be settled. Dropping it unsettled (the
/// toggle future was cancelled) restores the pre-toggle value.
struct OptimisticWrite<'a, S: MembershipStore> {
    store: &'a S,
    entity_id: &'a EntityId,
    previous: bool,
    settled: bool,
}

impl<'a, S: MembershipStore> OptimisticWrite<'a, S> {
    fn apply(store: &'a S, entity_id: &'a EntityId, previous: bool) -> Self {
        store.set(
            entity_id,
            MembershipState {
                is_member: !previous,
                pending: true,
            },
        );
        Self {
            store,
            entity_id,
            previous,
            settled: false,
        }
    }

    fn settle(mut self, confirmed: bool) {
        let is_member = if confirmed { !self.previous } else { self.previous };
        self.finish(is_member);
    }

    fn finish(&mut self, is_member: bool) {
        self.settled = true;
        if self.store.get(self.entity_id).is_none() {
            return;
        }
        self.store.set(
            self.entity_id,
            MembershipState {
                is_member,
                pending: false,
            },
        );
    }
}

impl<S: MembershipStore> Drop for OptimisticWrite<'_, S> {
    fn drop(&mut self) {
        if !self.settled {
            let previous = self.previous;
            self.finish(previous);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryMembershipStore, MembershipChange};
    use anyhow::anyhow;
    use futures::channel::oneshot;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    struct Respond {
        outcome: MutationOutcome,
        calls: Cell<usize>,
    }

    impl Respond {
        fn new(outcome: MutationOutcome) -> Self {
            Self {
                outcome,
                calls: Cell::new(0),
            }
        }
    }

    #[async_trait(?Send)]
    impl MembershipMutation for Respond {
        async fn mutate(&self, _entity_id: &EntityId) -> Result<MutationOutcome> {
            self.calls.set(self.calls.get() + 1);
            Ok(self.outcome.clone())
        }
    }

    struct Fails;

    #[async_trait(?Send)]
    impl MembershipMutation for Fails {
        async fn mutate(&self, _entity_id: &EntityId) -> Result<MutationOutcome> {
            Err(anyhow!("network unreachable"))
        }
    }

    /// Suspends until the test sends the outcome.
    struct Gate {
        release: RefCell<Option<oneshot::Receiver<MutationOutcome>>>,
        calls: Cell<usize>,
    }

    impl Gate {
        fn new() -> (Self, oneshot::Sender<MutationOutcome>) {
            let (tx, rx) = oneshot::channel();
            let gate = Self {
                release: RefCell::new(Some(rx)),
                calls: Cell::new(0),
            };
            (gate, tx)
        }
    }

    #[async_trait(?Send)]
    impl MembershipMutation for Gate {
        async fn mutate(&self, _entity_id: &EntityId) -> Result<MutationOutcome> {
            self.calls.set(self.calls.get() + 1);
            let release = self
                .release
                .borrow_mut()
                .take()
                .ok_or_else(|| anyhow!("gate already used"))?;
            Ok(release.await?)
        }
    }

    fn mutator() -> ToggleMutator<InMemoryMembershipStore> {
        ToggleMutator::new(InMemoryMembershipStore::default())
    }

    #[tokio::test]
    async fn confirmed_toggle_keeps_the_new_value() {
        let mutator = mutator();
        let id = EntityId::from("p1");
        let backend = Respond::new(MutationOutcome::ok("added to wishlist"));

        let outcome = mutator.toggle(&id, false, &backend).await;

        assert_eq!(outcome, MutationOutcome::ok("added to wishlist"));
        assert_eq!(mutator.is_member(&id), Some(true));
        assert!(!mutator.is_pending(&id));
        assert!(!mutator.is_in_flight(&id));
        assert_eq!(backend.calls.get(), 1);
    }

    #[tokio::test]
    async fn rejected_toggle_restores_the_previous_value() {
        let mutator = mutator();
        let backend = Respond::new(MutationOutcome::failed("out of stock"));

        for previous in [false, true] {
            let id = EntityId::new(format!("p-{previous}"));
            let outcome = mutator.toggle(&id, previous, &backend).await;

            assert!(!outcome.success);
            assert_eq!(outcome.message, "out of stock");
            assert_eq!(mutator.is_member(&id), Some(previous));
            assert!(!mutator.is_in_flight(&id));
        }
    }

    #[tokio::test]
    async fn mutation_error_is_reported_not_raised() {
        let mutator = mutator();
        let id = EntityId::from("p1");
        mutator.seed(&id, true);

        let outcome = mutator.toggle(&id, true, &Fails).await;

        assert_eq!(outcome, MutationOutcome::failed("network unreachable"));
        assert_eq!(mutator.is_member(&id), Some(true));
        assert!(!mutator.is_pending(&id));
        assert_eq!(mutator.in_flight_count(), 0);
    }

    #[tokio::test]
    async fn optimistic_write_lands_before_the_mutation_settles() -> anyhow::Result<()> {
        let mutator = mutator();
        let id = EntityId::from("p1");
        let (gate, release) = Gate::new();

        let mut pending = pin!(mutator.toggle(&id, false, &gate));
        assert!(futures::poll!(pending.as_mut()).is_pending());

        assert_eq!(mutator.is_member(&id), Some(true));
        assert!(mutator.is_pending(&id));
        assert!(mutator.is_in_flight(&id));

        release
            .send(MutationOutcome::failed("session expired"))
            .map_err(|_| anyhow!("toggle dropped the gate"))?;
        let outcome = pending.await;

        assert!(!outcome.success);
        assert_eq!(mutator.is_member(&id), Some(false));
        assert!(!mutator.is_in_flight(&id));
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_toggle_while_in_flight_is_dropped() -> anyhow::Result<()> {
        let mutator = mutator();
        let id = EntityId::from("p1");
        let (gate, release) = Gate::new();

        let mut first = pin!(mutator.toggle(&id, false, &gate));
        assert!(futures::poll!(first.as_mut()).is_pending());

        let second = mutator.toggle(&id, false, &gate).await;
        assert_eq!(second, MutationOutcome::failed("already in progress"));
        assert!(second.is_already_in_progress());
        assert_eq!(gate.calls.get(), 1);
        assert_eq!(mutator.is_member(&id), Some(true));

        release
            .send(MutationOutcome::ok("saved"))
            .map_err(|_| anyhow!("toggle dropped the gate"))?;
        assert!(first.await.success);
        assert_eq!(mutator.is_member(&id), Some(true));
        assert_eq!(gate.calls.get(), 1);

        let again = mutator.toggle(&id, true, &Respond::new(MutationOutcome::ok(""))).await;
        assert!(again.success, "id is released once the first toggle settles");
        assert_eq!(mutator.is_member(&id), Some(false));
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_toggle_does_not_touch_the_store() {
        let mutator = mutator();
        let id = EntityId::from("p1");
        let (gate, _release) = Gate::new();

        let mut first = pin!(mutator.toggle(&id, false, &gate));
        assert!(futures::poll!(first.as_mut()).is_pending());

        let writes = Rc::new(Cell::new(0));
        let counter = writes.clone();
        mutator.store().subscribe(Rc::new(move |_: &MembershipChange| {
            counter.set(counter.get() + 1);
        }));

        let second = mutator.toggle(&id, true, &gate).await;
        assert!(second.is_already_in_progress());
        assert_eq!(writes.get(), 0);
    }

    #[tokio::test]
    async fn deadline_rolls_back_and_releases() {
        let mutator = mutator();
        let id = EntityId::from("p1");
        let (gate, _release) = Gate::new();

        let outcome = mutator
            .toggle_with_deadline(&id, true, &gate, future::ready(()))
            .await;

        assert_eq!(outcome, MutationOutcome::timed_out());
        assert_eq!(mutator.is_member(&id), Some(true));
        assert!(!mutator.is_pending(&id));
        assert!(!mutator.is_in_flight(&id));
    }

    #[tokio::test]
    async fn mutation_that_beats_the_deadline_wins() {
        let mutator = mutator();
        let id = EntityId::from("p1");
        let backend = Respond::new(MutationOutcome::ok("in cart"));

        let outcome = mutator
            .toggle_with_deadline(&id, false, &backend, future::pending())
            .await;

        assert!(outcome.success);
        assert_eq!(mutator.is_member(&id), Some(true));
    }

    #[tokio::test]
    async fn dropped_toggle_rolls_back_and_releases() {
        let mutator = mutator();
        let id = EntityId::from("p1");
        let (gate, _release) = Gate::new();

        let mut abandoned = Box::pin(mutator.toggle(&id, false, &gate));
        assert!(futures::poll!(abandoned.as_mut()).is_pending());
        assert_eq!(mutator.is_member(&id), Some(true));

        drop(abandoned);

        assert_eq!(mutator.is_member(&id), Some(false));
        assert!(!mutator.is_pending(&id));
        assert!(!mutator.is_in_flight(&id));
    }

    #[tokio::test]
    async fn evicted_entity_is_not_recreated_on_settle() -> anyhow::Result<()> {
        let mutator = mutator();
        let id = EntityId::from("p1");
        let (gate, release) = Gate::new();

        let mut pending = pin!(mutator.toggle(&id, false, &gate));
        assert!(futures::poll!(pending.as_mut()).is_pending());
        assert!(!mutator.seed(&id, false), "seed is ignored while in flight");

        mutator.evict(&id);
        release
            .send(MutationOutcome::ok(""))
            .map_err(|_| anyhow!("toggle dropped the gate"))?;
        pending.await;

        assert_eq!(mutator.is_member(&id), None);
        assert!(!mutator.is_in_flight(&id));
        Ok(())
    }

    struct RejectOdd;

    #[async_trait(?Send)]
    impl MembershipMutation for RejectOdd {
        async fn mutate(&self, entity_id: &EntityId) -> Result<MutationOutcome> {
            match entity_id.as_str() {
                "p1" | "p3" => Ok(MutationOutcome::failed("unavailable")),
                "p4" => Err(anyhow!("timeout contacting inventory")),
                _ => Ok(MutationOutcome::ok("ok")),
            }
        }
    }

    #[tokio::test]
    async fn bulk_toggle_reports_each_item() {
        let mutator = mutator();
        let items: Vec<(EntityId, bool)> = vec![
            (EntityId::from("p1"), false),
            (EntityId::from("p2"), false),
            (EntityId::from("p3"), true),
            (EntityId::from("p4"), false),
            (EntityId::from("p5"), true),
        ];

        let report = mutator.toggle_many(&items, &RejectOdd).await;

        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 3);
        let ids: Vec<&str> = report.items.iter().map(|item| item.entity_id.as_str()).collect();
        assert_eq!(ids, ["p1", "p2", "p3", "p4", "p5"]);
        assert_eq!(report.items[3].outcome.message, "timeout contacting inventory");

        assert_eq!(mutator.is_member(&EntityId::from("p1")), Some(false));
        assert_eq!(mutator.is_member(&EntityId::from("p2")), Some(true));
        assert_eq!(mutator.is_member(&EntityId::from("p3")), Some(true));
        assert_eq!(mutator.is_member(&EntityId::from("p5")), Some(false));
        assert_eq!(mutator.in_flight_count(), 0);
    }

    #[tokio::test]
    async fn bulk_toggle_rejects_repeated_ids_in_one_batch() -> anyhow::Result<()> {
        let mutator = mutator();
        let id = EntityId::from("p1");
        let (gate, release) = Gate::new();
        let items = vec![(id.clone(), false), (id.clone(), false)];

        let mut batch = pin!(mutator.toggle_many(&items, &gate));
        assert!(futures::poll!(batch.as_mut()).is_pending());
        release
            .send(MutationOutcome::ok(""))
            .map_err(|_| anyhow!("toggle dropped the gate"))?;
        let report = batch.await;

        assert_eq!(report.succeeded, 1);
        assert!(report.items[1].outcome.is_already_in_progress());
        assert_eq!(gate.calls.get(), 1);
        Ok(())
    }
}
