//! The test context facade and its transaction guard.
//!
//! [`TestContext`] is the single entry point handed to test code. It routes
//! typed operations to the entity set registered for each type and exposes
//! transaction control over the backend's single shared transaction.
//!
//! The context is constructor-injected: each test builds (or receives) its
//! own instance and drops it on exit. There is no process-wide singleton, so
//! nothing leaks between tests.
//!
//! # Example
//!
//! ```ignore
//! use mockwork::{prelude::*, memory::InMemoryContext};
//!
//! let ctx = TestContext::new(InMemoryContext::new());
//! ctx.register::<User>()?;
//!
//! ctx.set::<User>().add(User { id: 1, name: "Alice".to_string() })?;
//! assert_eq!(ctx.save_changes()?, 1);
//!
//! let tx = ctx.begin_transaction()?;
//! ctx.set::<User>().remove(User { id: 1, name: "Alice".to_string() })?;
//! ctx.save_changes()?;
//! tx.rollback()?;
//!
//! assert_eq!(ctx.set::<User>().all()?.len(), 1);
//! # mockwork::error::ContextResult::Ok(())
//! ```

use crate::{
    backend::{ContextBackend, IsolationLevel},
    entity::{Entity, EntityExt},
    error::ContextResult,
    set::EntitySet,
};

/// The external-facing context object multiplexing typed operations across
/// entity sets.
///
/// # Type Parameters
///
/// * `B` - The backend implementation type
#[derive(Debug)]
pub struct TestContext<B: ContextBackend> {
    backend: B,
}

impl<B: ContextBackend> TestContext<B> {
    /// Creates a new context over the given backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Returns a reference to the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Consumes the context, returning the underlying backend.
    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Registers support for an entity type with an empty committed set.
    ///
    /// Must be called before mutations on `E` are meaningful. Queries on an
    /// unregistered type simply read as empty.
    pub fn register<E: Entity>(&self) -> ContextResult<()> {
        self.backend.register_set(E::set_name(), Vec::new())
    }

    /// Registers support for an entity type, seeding its committed set.
    ///
    /// Re-registering an already-registered type replaces its contents, so a
    /// test can re-seed without rebuilding the context.
    ///
    /// # Errors
    ///
    /// Returns a [`ContextError`](crate::error::ContextError) if serialization fails.
    pub fn register_with<E: Entity>(&self, initial: Vec<E>) -> ContextResult<()> {
        self.backend.register_set(
            E::set_name(),
            initial
                .iter()
                .map(EntityExt::to_bson)
                .collect::<ContextResult<Vec<_>>>()?,
        )
    }

    /// Returns the typed view of the entity set for `E`.
    pub fn set<E: Entity>(&self) -> EntitySet<'_, B, E> {
        EntitySet::new(E::set_name().to_string(), &self.backend)
    }

    /// Applies every set's pending adds and removes, returning the total
    /// mutation count.
    ///
    /// # Errors
    ///
    /// Returns the first [`ContextError`](crate::error::ContextError) raised
    /// by a set's save; sets saved earlier in the same call stay saved.
    pub fn save_changes(&self) -> ContextResult<u64> {
        self.backend.save_changes()
    }

    /// Opens the shared transaction and returns a guard for it.
    ///
    /// The guard rolls the transaction back when dropped unless
    /// [`commit`](ContextTransaction::commit) or
    /// [`rollback`](ContextTransaction::rollback) ran first.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::TransactionAlreadyOpen`](crate::error::ContextError::TransactionAlreadyOpen)
    /// if a transaction is already open.
    pub fn begin_transaction(&self) -> ContextResult<ContextTransaction<'_, B>> {
        self.backend.begin_transaction()?;

        Ok(ContextTransaction { backend: &self.backend, completed: false })
    }

    /// Commits the open transaction without going through a guard.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::NoOpenTransaction`](crate::error::ContextError::NoOpenTransaction)
    /// if no transaction is open.
    pub fn commit_transaction(&self) -> ContextResult<()> {
        self.backend.commit_transaction()
    }

    /// Rolls back the open transaction without going through a guard.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::NoOpenTransaction`](crate::error::ContextError::NoOpenTransaction)
    /// if no transaction is open.
    pub fn rollback_transaction(&self) -> ContextResult<()> {
        self.backend.rollback_transaction(false)
    }

    /// Opens a transaction at an explicit isolation level.
    ///
    /// The in-memory backend rejects this with
    /// [`ContextError::Unsupported`](crate::error::ContextError::Unsupported).
    pub fn begin_transaction_with(&self, isolation: IsolationLevel) -> ContextResult<()> {
        self.backend.begin_transaction_with(isolation)
    }

    /// Creates a named savepoint within the open transaction.
    ///
    /// The in-memory backend rejects this with
    /// [`ContextError::Unsupported`](crate::error::ContextError::Unsupported).
    pub fn create_savepoint(&self, name: &str) -> ContextResult<()> {
        self.backend.create_savepoint(name)
    }

    /// Rolls back to a named savepoint within the open transaction.
    ///
    /// The in-memory backend rejects this with
    /// [`ContextError::Unsupported`](crate::error::ContextError::Unsupported).
    pub fn rollback_to_savepoint(&self, name: &str) -> ContextResult<()> {
        self.backend.rollback_to_savepoint(name)
    }

    /// Executes a raw SQL statement.
    ///
    /// The in-memory backend rejects this with
    /// [`ContextError::Unsupported`](crate::error::ContextError::Unsupported).
    pub fn execute_raw(&self, statement: &str) -> ContextResult<u64> {
        self.backend.execute_raw(statement)
    }

    /// Executes a bulk update against the set for `E`.
    ///
    /// The in-memory backend rejects this with
    /// [`ContextError::Unsupported`](crate::error::ContextError::Unsupported).
    pub fn execute_update<E: Entity>(&self) -> ContextResult<u64> {
        self.backend.execute_update(E::set_name())
    }

    /// Executes a bulk delete against the set for `E`.
    ///
    /// The in-memory backend rejects this with
    /// [`ContextError::Unsupported`](crate::error::ContextError::Unsupported).
    pub fn execute_delete<E: Entity>(&self) -> ContextResult<u64> {
        self.backend.execute_delete(E::set_name())
    }

    /// Drops every registered set and closes any open transaction.
    pub fn clear(&self) -> ContextResult<()> {
        self.backend.clear()
    }
}

/// RAII guard for the context's single shared transaction.
///
/// Obtained from [`TestContext::begin_transaction`]. If the guard goes out of
/// scope without [`commit`](Self::commit) or [`rollback`](Self::rollback),
/// the transaction is rolled back on a best-effort basis: drop-time rollback
/// uses the no-throw path and never panics, even if the transaction was
/// already closed through the context directly.
#[derive(Debug)]
pub struct ContextTransaction<'a, B: ContextBackend> {
    backend: &'a B,
    completed: bool,
}

impl<'a, B: ContextBackend> ContextTransaction<'a, B> {
    /// Commits the transaction, making saves since `begin_transaction` final.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::NoOpenTransaction`](crate::error::ContextError::NoOpenTransaction)
    /// if the transaction was already closed through the context directly.
    pub fn commit(mut self) -> ContextResult<()> {
        self.completed = true;
        self.backend.commit_transaction()
    }

    /// Rolls the transaction back, restoring each set's last pre-save snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::NoOpenTransaction`](crate::error::ContextError::NoOpenTransaction)
    /// if the transaction was already closed through the context directly.
    pub fn rollback(mut self) -> ContextResult<()> {
        self.completed = true;
        self.backend.rollback_transaction(false)
    }
}

impl<'a, B: ContextBackend> Drop for ContextTransaction<'a, B> {
    fn drop(&mut self) {
        if !self.completed {
            let _ = self.backend.rollback_transaction(true);
        }
    }
}
