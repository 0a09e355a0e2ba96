//! Per-set buffered storage with transactional undo.
//!
//! A [`SetStore`] is the unit-of-work state machine behind one entity set:
//! an ordered committed list, pending add/remove queues, and a rollback
//! snapshot captured at save time while a transaction is open. Transaction
//! state-machine errors are raised by the owning
//! [`TransactionController`](crate::transaction::TransactionController); the
//! store's `transaction_active` flag only mirrors that shared state.

use bson::Bson;

use mockwork_core::error::{ContextError, ContextResult};

/// Buffered storage for one entity set.
///
/// Mutations queue into `pending_adds`/`pending_removes` and only touch
/// `committed` when [`save_changes`](Self::save_changes) runs. While a
/// transaction is open, each save first snapshots `committed`, so a rollback
/// restores the state as of the last save in the transaction.
///
/// Entities are compared by BSON value equality: no two value-equal entities
/// may be committed at once, and removing a value with no committed match
/// fails.
#[derive(Debug, Default)]
pub struct SetStore {
    /// The entities considered persisted, in insertion order.
    committed: Vec<Bson>,
    /// Entities queued for insertion at the next save.
    pending_adds: Vec<Bson>,
    /// Entities queued for removal at the next save.
    pending_removes: Vec<Bson>,
    /// Committed state as of the last save inside the open transaction.
    /// `None` when no save has happened since the transaction opened.
    snapshot: Option<Vec<Bson>>,
    /// Mirror of the controller's open/closed flag.
    transaction_active: bool,
}

impl SetStore {
    /// Creates a store seeded with already-committed entities.
    pub fn seeded(initial: Vec<Bson>) -> Self {
        Self { committed: initial, ..Self::default() }
    }

    /// Queues entities for insertion. No validation happens here.
    pub fn queue_add(&mut self, entities: Vec<Bson>) {
        self.pending_adds.extend(entities);
    }

    /// Queues entities for removal. No validation happens here.
    pub fn queue_remove(&mut self, entities: Vec<Bson>) {
        self.pending_removes.extend(entities);
    }

    /// Returns a copy of the committed entities, in order.
    ///
    /// Pending changes are invisible here until saved.
    pub fn committed(&self) -> Vec<Bson> {
        self.committed.clone()
    }

    /// Returns the number of queued adds plus queued removes.
    pub fn pending_count(&self) -> usize {
        self.pending_adds.len() + self.pending_removes.len()
    }

    /// Applies pending adds, then pending removes, to committed state.
    ///
    /// While a transaction is open, the current committed state is first
    /// snapshotted, replacing any earlier snapshot: only the state since the
    /// last save within the transaction is restorable.
    ///
    /// Returns the mutation count (queued adds plus queued removes). On
    /// failure, mutations already applied in this call stay applied and both
    /// pending queues are left intact; partial application is deliberate,
    /// matching the behavior tests are written against.
    ///
    /// # Errors
    ///
    /// * [`ContextError::DuplicateEntity`] - a queued add is value-equal to a
    ///   committed entity (including one applied earlier in this same save).
    /// * [`ContextError::MissingEntity`] - a queued remove has no value-equal
    ///   committed match.
    pub fn save_changes(&mut self, set: &str) -> ContextResult<u64> {
        if self.transaction_active {
            self.snapshot = Some(self.committed.clone());
        }

        let count = self.pending_count() as u64;

        for add in &self.pending_adds {
            if self.committed.contains(add) {
                return Err(ContextError::DuplicateEntity(add.to_string(), set.to_string()));
            }

            self.committed.push(add.clone());
        }

        for remove in &self.pending_removes {
            match self.committed.iter().position(|c| c == remove) {
                Some(index) => {
                    self.committed.remove(index);
                }
                None => {
                    return Err(ContextError::MissingEntity(
                        remove.to_string(),
                        set.to_string(),
                    ));
                }
            }
        }

        self.pending_adds.clear();
        self.pending_removes.clear();

        Ok(count)
    }

    /// Marks the store as inside the shared transaction.
    pub fn begin(&mut self) {
        self.transaction_active = true;
    }

    /// Leaves the transaction, keeping committed state as is.
    ///
    /// The pending queues should already be empty after a successful save;
    /// clearing them here drops anything queued but never saved.
    pub fn commit(&mut self) {
        self.transaction_active = false;
        self.snapshot = None;
        self.pending_adds.clear();
        self.pending_removes.clear();
    }

    /// Leaves the transaction, restoring the last pre-save snapshot.
    ///
    /// If no save ran while the transaction was open there is no snapshot,
    /// and committed state is left untouched.
    pub fn rollback(&mut self) {
        self.transaction_active = false;
        self.pending_adds.clear();
        self.pending_removes.clear();

        if let Some(snapshot) = self.snapshot.take() {
            self.committed = snapshot;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    fn entity(id: i32, name: &str) -> Bson {
        Bson::Document(doc! { "id": id, "name": name })
    }

    #[test]
    fn save_applies_adds_then_removes_in_order() {
        let mut store = SetStore::seeded(vec![entity(1, "A"), entity(2, "B")]);

        store.queue_add(vec![entity(3, "C")]);
        store.queue_remove(vec![entity(1, "A")]);

        assert_eq!(store.save_changes("items").unwrap(), 2);
        assert_eq!(store.committed(), vec![entity(2, "B"), entity(3, "C")]);
        assert_eq!(store.pending_count(), 0);
    }

    #[test]
    fn pending_changes_are_invisible_until_saved() {
        let mut store = SetStore::default();

        store.queue_add(vec![entity(1, "A")]);

        assert!(store.committed().is_empty());

        store.save_changes("items").unwrap();

        assert_eq!(store.committed(), vec![entity(1, "A")]);
    }

    #[test]
    fn duplicate_add_fails_and_leaves_prior_adds_applied() {
        let mut store = SetStore::default();

        store.queue_add(vec![entity(1, "A"), entity(1, "A")]);

        assert!(matches!(
            store.save_changes("items"),
            Err(ContextError::DuplicateEntity(_, _)),
        ));
        // Partial application: the first copy landed before the failure.
        assert_eq!(store.committed(), vec![entity(1, "A")]);
        // The queues survive a failed save.
        assert_eq!(store.pending_count(), 2);
    }

    #[test]
    fn duplicate_against_already_committed_entity_fails() {
        let mut store = SetStore::seeded(vec![entity(1, "A")]);

        store.queue_add(vec![entity(1, "A")]);

        assert!(matches!(
            store.save_changes("items"),
            Err(ContextError::DuplicateEntity(_, _)),
        ));
    }

    #[test]
    fn removing_an_absent_entity_fails() {
        let mut store = SetStore::seeded(vec![entity(1, "A")]);

        store.queue_remove(vec![entity(2, "B")]);

        assert!(matches!(
            store.save_changes("items"),
            Err(ContextError::MissingEntity(_, _)),
        ));
        assert_eq!(store.committed(), vec![entity(1, "A")]);
    }

    #[test]
    fn remove_takes_the_first_value_equal_match() {
        let mut store = SetStore::seeded(vec![entity(1, "A"), entity(2, "B")]);

        store.queue_remove(vec![entity(1, "A")]);
        store.save_changes("items").unwrap();

        assert_eq!(store.committed(), vec![entity(2, "B")]);
    }

    #[test]
    fn rollback_restores_the_last_pre_save_snapshot() {
        let mut store = SetStore::seeded(vec![entity(1, "A")]);

        store.begin();
        store.queue_add(vec![entity(2, "B")]);
        store.save_changes("items").unwrap();

        assert_eq!(store.committed().len(), 2);

        store.rollback();

        assert_eq!(store.committed(), vec![entity(1, "A")]);
    }

    #[test]
    fn each_save_in_a_transaction_replaces_the_snapshot() {
        let mut store = SetStore::default();

        store.begin();
        store.queue_add(vec![entity(1, "A")]);
        store.save_changes("items").unwrap();
        store.queue_add(vec![entity(2, "B")]);
        store.save_changes("items").unwrap();

        store.rollback();

        // Only the state since the last save is restorable.
        assert_eq!(store.committed(), vec![entity(1, "A")]);
    }

    #[test]
    fn rollback_without_a_save_leaves_committed_untouched() {
        let mut store = SetStore::seeded(vec![entity(1, "A")]);

        store.begin();
        store.queue_add(vec![entity(2, "B")]);
        store.rollback();

        assert_eq!(store.committed(), vec![entity(1, "A")]);
        assert_eq!(store.pending_count(), 0);
    }

    #[test]
    fn commit_clears_the_snapshot_so_later_rollback_cannot_resurrect_it() {
        let mut store = SetStore::default();

        store.begin();
        store.queue_add(vec![entity(1, "A")]);
        store.save_changes("items").unwrap();
        store.commit();

        store.begin();
        store.rollback();

        assert_eq!(store.committed(), vec![entity(1, "A")]);
    }

    #[test]
    fn saves_outside_a_transaction_take_no_snapshot() {
        let mut store = SetStore::default();

        store.queue_add(vec![entity(1, "A")]);
        store.save_changes("items").unwrap();

        store.begin();
        store.rollback();

        assert_eq!(store.committed(), vec![entity(1, "A")]);
    }
}
