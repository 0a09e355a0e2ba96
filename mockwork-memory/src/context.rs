//! In-memory implementation of the context backend contract.
//!
//! This module provides the fake persistence context: a registry of
//! [`SetStore`]s keyed by set name, coordinated by one
//! [`TransactionController`]. Everything lives behind a single read-write
//! lock, so the handle can be cloned and shared by `&self` like a real
//! context would be.

use std::{collections::BTreeMap, sync::Arc};

use bson::Bson;
use parking_lot::RwLock;
use tracing::{debug, trace};

use mockwork_core::{
    backend::{ContextBackend, ContextBackendBuilder, IsolationLevel},
    error::{ContextError, ContextResult},
};

use crate::{store::SetStore, transaction::TransactionController};

#[derive(Debug, Default)]
struct Inner {
    /// Registered stores by set name. Ordered so saves and transaction
    /// broadcasts are deterministic.
    sets: BTreeMap<String, SetStore>,
    controller: TransactionController,
}

/// In-memory context backend emulating unit-of-work and transaction semantics.
///
/// `InMemoryContext` is cloneable and uses an `Arc`-wrapped internal state:
/// clones of the same instance share the same registered sets and the same
/// single transaction. It is intended for one test at a time: the internal
/// lock keeps the `&self` API sound but concurrent tests must not share one
/// instance.
///
/// The fidelity boundary is deliberate: CRUD and transaction semantics are
/// emulated, while raw SQL, bulk update/delete, isolation levels, and
/// savepoints fail fast with [`ContextError::Unsupported`].
///
/// # Example
///
/// ```ignore
/// use mockwork_memory::InMemoryContext;
/// use mockwork_core::backend::ContextBackend;
/// use bson::{Bson, doc};
///
/// let ctx = InMemoryContext::new();
/// ctx.register_set("users", vec![])?;
/// ctx.queue_add(vec![Bson::Document(doc! { "id": 1, "name": "Alice" })], "users")?;
/// assert_eq!(ctx.save_changes()?, 1);
/// # mockwork_core::error::ContextResult::Ok(())
/// ```
#[derive(Debug, Default, Clone)]
pub struct InMemoryContext {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryContext {
    /// Creates a new empty in-memory context with no registered sets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder for constructing an `InMemoryContext` with
    /// pre-registered entity sets.
    pub fn builder() -> InMemoryContextBuilder {
        InMemoryContextBuilder::default()
    }
}

impl ContextBackend for InMemoryContext {
    fn register_set(&self, set: &str, initial: Vec<Bson>) -> ContextResult<()> {
        let mut inner = self.inner.write();

        debug!(set, seeded = initial.len(), "registering entity set");

        let mut store = SetStore::seeded(initial);

        // A set registered while the shared transaction is open joins it,
        // keeping every store's mirror flag consistent with the controller.
        if inner.controller.is_open() {
            store.begin();
        }

        // Re-registration replaces the set so tests can re-seed in place.
        inner.sets.insert(set.to_string(), store);

        Ok(())
    }

    fn queue_add(&self, entities: Vec<Bson>, set: &str) -> ContextResult<()> {
        let mut inner = self.inner.write();

        trace!(set, count = entities.len(), "queueing adds");

        match inner.sets.get_mut(set) {
            Some(store) => {
                store.queue_add(entities);
                Ok(())
            }
            None => Err(ContextError::SetNotRegistered(set.to_string())),
        }
    }

    fn queue_remove(&self, entities: Vec<Bson>, set: &str) -> ContextResult<()> {
        let mut inner = self.inner.write();

        trace!(set, count = entities.len(), "queueing removes");

        match inner.sets.get_mut(set) {
            Some(store) => {
                store.queue_remove(entities);
                Ok(())
            }
            None => Err(ContextError::SetNotRegistered(set.to_string())),
        }
    }

    fn committed(&self, set: &str) -> ContextResult<Vec<Bson>> {
        let inner = self.inner.read();

        // Unregistered sets read as empty, matching a query against a table
        // the test never seeded.
        Ok(inner
            .sets
            .get(set)
            .map(SetStore::committed)
            .unwrap_or_default())
    }

    fn save_changes(&self) -> ContextResult<u64> {
        let mut inner = self.inner.write();
        let mut count = 0u64;

        // A failure in one set does not undo sets already saved in this
        // call; the error carries out of the loop as is.
        for (name, store) in inner.sets.iter_mut() {
            count += store.save_changes(name)?;
        }

        debug!(mutations = count, "saved changes");

        Ok(count)
    }

    fn begin_transaction(&self) -> ContextResult<()> {
        let mut inner = self.inner.write();

        inner.controller.begin()?;

        for store in inner.sets.values_mut() {
            store.begin();
        }

        debug!("transaction opened");

        Ok(())
    }

    fn commit_transaction(&self) -> ContextResult<()> {
        let mut inner = self.inner.write();

        inner.controller.commit()?;

        for store in inner.sets.values_mut() {
            store.commit();
        }

        debug!("transaction committed");

        Ok(())
    }

    fn rollback_transaction(&self, no_throw: bool) -> ContextResult<()> {
        let mut inner = self.inner.write();

        if !inner.controller.rollback(no_throw)? {
            return Ok(());
        }

        for store in inner.sets.values_mut() {
            store.rollback();
        }

        debug!("transaction rolled back");

        Ok(())
    }

    fn begin_transaction_with(&self, _isolation: IsolationLevel) -> ContextResult<()> {
        Err(ContextError::Unsupported("isolation-level transactions"))
    }

    fn create_savepoint(&self, _name: &str) -> ContextResult<()> {
        Err(ContextError::Unsupported("savepoints"))
    }

    fn rollback_to_savepoint(&self, _name: &str) -> ContextResult<()> {
        Err(ContextError::Unsupported("savepoints"))
    }

    fn execute_raw(&self, _statement: &str) -> ContextResult<u64> {
        Err(ContextError::Unsupported("raw SQL execution"))
    }

    fn execute_update(&self, _set: &str) -> ContextResult<u64> {
        Err(ContextError::Unsupported("bulk update"))
    }

    fn execute_delete(&self, _set: &str) -> ContextResult<u64> {
        Err(ContextError::Unsupported("bulk delete"))
    }

    fn clear(&self) -> ContextResult<()> {
        let mut inner = self.inner.write();

        debug!(sets = inner.sets.len(), "clearing context");

        inner.sets.clear();
        inner.controller.reset();

        Ok(())
    }
}

/// Builder for constructing [`InMemoryContext`] instances with
/// pre-registered entity sets.
///
/// # Example
///
/// ```ignore
/// use mockwork_memory::InMemoryContext;
/// use mockwork_core::backend::ContextBackendBuilder;
///
/// let ctx = InMemoryContext::builder()
///     .with_set("users", vec![])
///     .build()?;
/// # mockwork_core::error::ContextResult::Ok(())
/// ```
#[derive(Debug, Default)]
pub struct InMemoryContextBuilder {
    sets: Vec<(String, Vec<Bson>)>,
}

impl InMemoryContextBuilder {
    /// Pre-registers an entity set, optionally seeded with committed values.
    pub fn with_set(mut self, name: impl Into<String>, initial: Vec<Bson>) -> Self {
        self.sets.push((name.into(), initial));
        self
    }
}

impl ContextBackendBuilder for InMemoryContextBuilder {
    type Backend = InMemoryContext;

    fn build(self) -> ContextResult<Self::Backend> {
        let ctx = InMemoryContext::new();

        for (name, initial) in self.sets {
            ctx.register_set(&name, initial)?;
        }

        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use proptest::prelude::*;

    fn entity(id: i32) -> Bson {
        Bson::Document(doc! { "id": id })
    }

    fn ctx_with(set: &str, initial: Vec<Bson>) -> InMemoryContext {
        let ctx = InMemoryContext::new();
        ctx.register_set(set, initial).unwrap();
        ctx
    }

    #[test]
    fn save_counts_mutations_across_all_sets() {
        let ctx = InMemoryContext::new();
        ctx.register_set("a", vec![]).unwrap();
        ctx.register_set("b", vec![entity(9)]).unwrap();

        ctx.queue_add(vec![entity(1), entity(2)], "a").unwrap();
        ctx.queue_remove(vec![entity(9)], "b").unwrap();

        assert_eq!(ctx.save_changes().unwrap(), 3);
        assert_eq!(ctx.committed("a").unwrap().len(), 2);
        assert!(ctx.committed("b").unwrap().is_empty());
    }

    #[test]
    fn failed_save_does_not_undo_sets_saved_earlier_in_the_call() {
        let ctx = InMemoryContext::new();
        // BTreeMap order: "a" saves before "b".
        ctx.register_set("a", vec![]).unwrap();
        ctx.register_set("b", vec![]).unwrap();

        ctx.queue_add(vec![entity(1)], "a").unwrap();
        ctx.queue_remove(vec![entity(2)], "b").unwrap();

        assert!(matches!(
            ctx.save_changes(),
            Err(ContextError::MissingEntity(_, _)),
        ));
        assert_eq!(ctx.committed("a").unwrap(), vec![entity(1)]);
    }

    #[test]
    fn mutating_an_unregistered_set_fails_but_reading_it_is_empty() {
        let ctx = InMemoryContext::new();

        assert!(matches!(
            ctx.queue_add(vec![entity(1)], "ghosts"),
            Err(ContextError::SetNotRegistered(_)),
        ));
        assert!(ctx.committed("ghosts").unwrap().is_empty());
    }

    #[test]
    fn transaction_broadcasts_to_every_registered_set() {
        let ctx = InMemoryContext::new();
        ctx.register_set("a", vec![entity(1)]).unwrap();
        ctx.register_set("b", vec![entity(2)]).unwrap();

        ctx.begin_transaction().unwrap();
        ctx.queue_remove(vec![entity(1)], "a").unwrap();
        ctx.queue_add(vec![entity(3)], "b").unwrap();
        ctx.save_changes().unwrap();
        ctx.rollback_transaction(false).unwrap();

        assert_eq!(ctx.committed("a").unwrap(), vec![entity(1)]);
        assert_eq!(ctx.committed("b").unwrap(), vec![entity(2)]);
    }

    #[test]
    fn set_registered_mid_transaction_joins_it_and_rolls_back() {
        let ctx = InMemoryContext::new();

        ctx.begin_transaction().unwrap();
        ctx.register_set("late", vec![]).unwrap();
        ctx.queue_add(vec![entity(1)], "late").unwrap();
        ctx.save_changes().unwrap();
        ctx.rollback_transaction(false).unwrap();

        assert!(ctx.committed("late").unwrap().is_empty());
    }

    #[test]
    fn set_registered_mid_transaction_survives_commit() {
        let ctx = InMemoryContext::new();

        ctx.begin_transaction().unwrap();
        ctx.register_set("late", vec![]).unwrap();
        ctx.queue_add(vec![entity(1)], "late").unwrap();
        ctx.save_changes().unwrap();
        ctx.commit_transaction().unwrap();

        assert_eq!(ctx.committed("late").unwrap(), vec![entity(1)]);
    }

    #[test]
    fn commit_makes_saves_inside_the_transaction_final() {
        let ctx = ctx_with("items", vec![]);

        ctx.begin_transaction().unwrap();
        ctx.queue_add(vec![entity(1)], "items").unwrap();
        ctx.save_changes().unwrap();
        ctx.commit_transaction().unwrap();

        assert_eq!(ctx.committed("items").unwrap(), vec![entity(1)]);
    }

    #[test]
    fn transaction_state_machine_misuse_is_an_error() {
        let ctx = ctx_with("items", vec![]);

        ctx.begin_transaction().unwrap();
        assert!(matches!(
            ctx.begin_transaction(),
            Err(ContextError::TransactionAlreadyOpen),
        ));

        ctx.commit_transaction().unwrap();
        assert!(matches!(
            ctx.commit_transaction(),
            Err(ContextError::NoOpenTransaction),
        ));
        assert!(matches!(
            ctx.rollback_transaction(false),
            Err(ContextError::NoOpenTransaction),
        ));
        // The no-throw path is the one silent exception.
        ctx.rollback_transaction(true).unwrap();
    }

    #[test]
    fn unsupported_capabilities_fail_fast() {
        let ctx = ctx_with("items", vec![]);

        assert!(matches!(
            ctx.execute_raw("DELETE FROM items"),
            Err(ContextError::Unsupported(_)),
        ));
        assert!(matches!(
            ctx.execute_update("items"),
            Err(ContextError::Unsupported(_)),
        ));
        assert!(matches!(
            ctx.execute_delete("items"),
            Err(ContextError::Unsupported(_)),
        ));
        assert!(matches!(
            ctx.begin_transaction_with(IsolationLevel::Serializable),
            Err(ContextError::Unsupported(_)),
        ));
        assert!(matches!(
            ctx.create_savepoint("sp1"),
            Err(ContextError::Unsupported(_)),
        ));
        assert!(matches!(
            ctx.rollback_to_savepoint("sp1"),
            Err(ContextError::Unsupported(_)),
        ));
    }

    #[test]
    fn clear_drops_sets_and_closes_the_transaction() {
        let ctx = ctx_with("items", vec![entity(1)]);

        ctx.begin_transaction().unwrap();
        ctx.clear().unwrap();

        assert!(ctx.committed("items").unwrap().is_empty());
        // The transaction was force-closed, so a fresh begin works.
        ctx.begin_transaction().unwrap();
        ctx.rollback_transaction(false).unwrap();
    }

    #[test]
    fn builder_preregisters_sets() {
        let ctx = InMemoryContext::builder()
            .with_set("users", vec![entity(1)])
            .with_set("orders", vec![])
            .build()
            .unwrap();

        assert_eq!(ctx.committed("users").unwrap(), vec![entity(1)]);
        assert!(ctx.committed("orders").unwrap().is_empty());
        assert!(matches!(
            ctx.queue_add(vec![entity(2)], "ghosts"),
            Err(ContextError::SetNotRegistered(_)),
        ));
    }

    #[test]
    fn clones_share_the_same_state() {
        let ctx = ctx_with("items", vec![]);
        let other = ctx.clone();

        other.queue_add(vec![entity(1)], "items").unwrap();
        ctx.save_changes().unwrap();

        assert_eq!(other.committed("items").unwrap(), vec![entity(1)]);
    }

    proptest! {
        /// For distinct adds A and removes R drawn from the committed seed,
        /// a save yields committed' = (committed ∪ A) \ R and returns |A| + |R|.
        #[test]
        fn save_is_union_of_adds_minus_removes(
            seed in proptest::collection::btree_set(0i32..50, 0..10),
            adds in proptest::collection::btree_set(50i32..100, 0..10),
            remove_mask in proptest::collection::vec(any::<bool>(), 10),
        ) {
            let seed: Vec<i32> = seed.into_iter().collect();
            let adds: Vec<i32> = adds.into_iter().collect();
            let removes: Vec<i32> = seed
                .iter()
                .zip(remove_mask.iter())
                .filter(|(_, keep)| **keep)
                .map(|(id, _)| *id)
                .collect();

            let ctx = ctx_with("items", seed.iter().map(|id| entity(*id)).collect());

            ctx.queue_add(adds.iter().map(|id| entity(*id)).collect(), "items").unwrap();
            ctx.queue_remove(removes.iter().map(|id| entity(*id)).collect(), "items").unwrap();

            let count = ctx.save_changes().unwrap();
            prop_assert_eq!(count, (adds.len() + removes.len()) as u64);

            let expected: Vec<Bson> = seed
                .iter()
                .filter(|id| !removes.contains(*id))
                .chain(adds.iter())
                .map(|id| entity(*id))
                .collect();
            prop_assert_eq!(ctx.committed("items").unwrap(), expected);
        }
    }
}
