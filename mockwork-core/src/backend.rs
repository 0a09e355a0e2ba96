//! Context backend abstraction for the test double.
//!
//! This module defines the trait that abstracts over the persistence context
//! being faked. The trait is the contract a real ORM context satisfies; the
//! in-memory backend implements the same contract by hand instead of relying
//! on runtime interception, so test code can swap one for the other without
//! caring which it got.
//!
//! # Overview
//!
//! The [`ContextBackend`] trait is type-erased: entities cross this boundary
//! as [`Bson`] values keyed by their set name, and the typed layer above
//! ([`crate::set::EntitySet`]) handles serde conversion. This keeps the trait
//! object-safe, so `Box<dyn ContextBackend>` works where runtime backend
//! selection is needed.
//!
//! All operations are synchronous: the test double has no suspension points
//! and completes every call on the calling thread.

use bson::Bson;
use std::fmt::Debug;

use crate::error::ContextResult;

/// Transaction isolation levels accepted by real persistence contexts.
///
/// The in-memory backend rejects isolation-level transactions outright
/// (there is nothing meaningful to isolate), but the contract carries the
/// enum so real backends and call sites can share a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

/// Abstract interface for persistence-context backends.
///
/// Implementers provide the unit-of-work semantics the typed layer builds on:
/// buffered adds and removes per entity set, a save step that applies the
/// buffers, and a single shared transaction across all registered sets.
///
/// # Error Handling
///
/// Operations return [`ContextResult<T>`](crate::error::ContextResult).
/// State-machine misuse (begin while open, commit/rollback while closed) is a
/// programmer error surfaced immediately, never silently ignored. The one
/// exception is the `no_throw` rollback path used for drop-time cleanup.
pub trait ContextBackend: Send + Sync + Debug {
    /// Registers an entity set, seeding it with `initial` committed values.
    ///
    /// Must be called before mutations on the set are meaningful.
    /// Re-registering an existing set replaces its contents, so a test can
    /// re-seed without tearing the whole context down.
    fn register_set(&self, set: &str, initial: Vec<Bson>) -> ContextResult<()>;

    /// Queues entities for insertion into a set.
    ///
    /// No validation happens here and committed state is untouched until
    /// [`save_changes`](Self::save_changes).
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::SetNotRegistered`](crate::error::ContextError::SetNotRegistered)
    /// if the set was never registered.
    fn queue_add(&self, entities: Vec<Bson>, set: &str) -> ContextResult<()>;

    /// Queues entities for removal from a set.
    ///
    /// No validation happens here and committed state is untouched until
    /// [`save_changes`](Self::save_changes).
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::SetNotRegistered`](crate::error::ContextError::SetNotRegistered)
    /// if the set was never registered.
    fn queue_remove(&self, entities: Vec<Bson>, set: &str) -> ContextResult<()>;

    /// Returns the committed entities of a set, in order.
    ///
    /// Pending adds and removes are invisible here until saved, mirroring the
    /// no-autoflush semantics of a real change tracker. Querying a set that
    /// was never registered yields an empty vector rather than an error.
    fn committed(&self, set: &str) -> ContextResult<Vec<Bson>>;

    /// Applies every set's pending adds and removes to committed state.
    ///
    /// Returns the total mutation count (queued adds plus queued removes)
    /// across all sets. A failure in one set does not undo sets already
    /// saved in the same call, nor mutations already applied within the
    /// failing set.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::DuplicateEntity`](crate::error::ContextError::DuplicateEntity)
    /// or [`ContextError::MissingEntity`](crate::error::ContextError::MissingEntity)
    /// on the first invalid queued operation.
    fn save_changes(&self) -> ContextResult<u64>;

    /// Opens the single shared transaction across all registered sets.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::TransactionAlreadyOpen`](crate::error::ContextError::TransactionAlreadyOpen)
    /// if a transaction is already open.
    fn begin_transaction(&self) -> ContextResult<()>;

    /// Commits the open transaction, making saves since `begin_transaction` final.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::NoOpenTransaction`](crate::error::ContextError::NoOpenTransaction)
    /// if no transaction is open.
    fn commit_transaction(&self) -> ContextResult<()>;

    /// Rolls back the open transaction, restoring each set's committed state
    /// to its last pre-save snapshot.
    ///
    /// With `no_throw` set, rolling back when no transaction is open is a
    /// silent no-op; this is the drop-time cleanup path.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::NoOpenTransaction`](crate::error::ContextError::NoOpenTransaction)
    /// if no transaction is open and `no_throw` is false.
    fn rollback_transaction(&self, no_throw: bool) -> ContextResult<()>;

    /// Opens a transaction at an explicit isolation level.
    ///
    /// The in-memory backend rejects this with
    /// [`ContextError::Unsupported`](crate::error::ContextError::Unsupported).
    fn begin_transaction_with(&self, isolation: IsolationLevel) -> ContextResult<()>;

    /// Creates a named savepoint within the open transaction.
    ///
    /// The in-memory backend rejects this with
    /// [`ContextError::Unsupported`](crate::error::ContextError::Unsupported).
    fn create_savepoint(&self, name: &str) -> ContextResult<()>;

    /// Rolls back to a named savepoint within the open transaction.
    ///
    /// The in-memory backend rejects this with
    /// [`ContextError::Unsupported`](crate::error::ContextError::Unsupported).
    fn rollback_to_savepoint(&self, name: &str) -> ContextResult<()>;

    /// Executes a raw SQL statement, returning the affected-row count.
    ///
    /// The in-memory backend rejects this with
    /// [`ContextError::Unsupported`](crate::error::ContextError::Unsupported).
    fn execute_raw(&self, statement: &str) -> ContextResult<u64>;

    /// Executes a bulk update against a set, returning the affected-row count.
    ///
    /// The in-memory backend rejects this with
    /// [`ContextError::Unsupported`](crate::error::ContextError::Unsupported).
    fn execute_update(&self, set: &str) -> ContextResult<u64>;

    /// Executes a bulk delete against a set, returning the affected-row count.
    ///
    /// The in-memory backend rejects this with
    /// [`ContextError::Unsupported`](crate::error::ContextError::Unsupported).
    fn execute_delete(&self, set: &str) -> ContextResult<u64>;

    /// Drops every registered set and closes any open transaction.
    ///
    /// After `clear` the backend is indistinguishable from a freshly built
    /// one, so a subsequent test starts clean.
    fn clear(&self) -> ContextResult<()>;
}

impl<B> ContextBackend for &B
where
    B: ContextBackend + ?Sized,
{
    fn register_set(&self, set: &str, initial: Vec<Bson>) -> ContextResult<()> {
        (**self).register_set(set, initial)
    }

    fn queue_add(&self, entities: Vec<Bson>, set: &str) -> ContextResult<()> {
        (**self).queue_add(entities, set)
    }

    fn queue_remove(&self, entities: Vec<Bson>, set: &str) -> ContextResult<()> {
        (**self).queue_remove(entities, set)
    }

    fn committed(&self, set: &str) -> ContextResult<Vec<Bson>> {
        (**self).committed(set)
    }

    fn save_changes(&self) -> ContextResult<u64> {
        (**self).save_changes()
    }

    fn begin_transaction(&self) -> ContextResult<()> {
        (**self).begin_transaction()
    }

    fn commit_transaction(&self) -> ContextResult<()> {
        (**self).commit_transaction()
    }

    fn rollback_transaction(&self, no_throw: bool) -> ContextResult<()> {
        (**self).rollback_transaction(no_throw)
    }

    fn begin_transaction_with(&self, isolation: IsolationLevel) -> ContextResult<()> {
        (**self).begin_transaction_with(isolation)
    }

    fn create_savepoint(&self, name: &str) -> ContextResult<()> {
        (**self).create_savepoint(name)
    }

    fn rollback_to_savepoint(&self, name: &str) -> ContextResult<()> {
        (**self).rollback_to_savepoint(name)
    }

    fn execute_raw(&self, statement: &str) -> ContextResult<u64> {
        (**self).execute_raw(statement)
    }

    fn execute_update(&self, set: &str) -> ContextResult<u64> {
        (**self).execute_update(set)
    }

    fn execute_delete(&self, set: &str) -> ContextResult<u64> {
        (**self).execute_delete(set)
    }

    fn clear(&self) -> ContextResult<()> {
        (**self).clear()
    }
}

impl<B> ContextBackend for Box<B>
where
    B: ContextBackend + ?Sized,
{
    fn register_set(&self, set: &str, initial: Vec<Bson>) -> ContextResult<()> {
        (**self).register_set(set, initial)
    }

    fn queue_add(&self, entities: Vec<Bson>, set: &str) -> ContextResult<()> {
        (**self).queue_add(entities, set)
    }

    fn queue_remove(&self, entities: Vec<Bson>, set: &str) -> ContextResult<()> {
        (**self).queue_remove(entities, set)
    }

    fn committed(&self, set: &str) -> ContextResult<Vec<Bson>> {
        (**self).committed(set)
    }

    fn save_changes(&self) -> ContextResult<u64> {
        (**self).save_changes()
    }

    fn begin_transaction(&self) -> ContextResult<()> {
        (**self).begin_transaction()
    }

    fn commit_transaction(&self) -> ContextResult<()> {
        (**self).commit_transaction()
    }

    fn rollback_transaction(&self, no_throw: bool) -> ContextResult<()> {
        (**self).rollback_transaction(no_throw)
    }

    fn begin_transaction_with(&self, isolation: IsolationLevel) -> ContextResult<()> {
        (**self).begin_transaction_with(isolation)
    }

    fn create_savepoint(&self, name: &str) -> ContextResult<()> {
        (**self).create_savepoint(name)
    }

    fn rollback_to_savepoint(&self, name: &str) -> ContextResult<()> {
        (**self).rollback_to_savepoint(name)
    }

    fn execute_raw(&self, statement: &str) -> ContextResult<u64> {
        (**self).execute_raw(statement)
    }

    fn execute_update(&self, set: &str) -> ContextResult<u64> {
        (**self).execute_update(set)
    }

    fn execute_delete(&self, set: &str) -> ContextResult<u64> {
        (**self).execute_delete(set)
    }

    fn clear(&self) -> ContextResult<()> {
        (**self).clear()
    }
}

/// Factory trait for creating backend instances.
pub trait ContextBackendBuilder {
    type Backend: ContextBackend;

    fn build(self) -> ContextResult<Self::Backend>;
}
