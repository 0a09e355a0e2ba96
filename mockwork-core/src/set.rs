//! Typed entity-set views over a context backend.
//!
//! An [`EntitySet`] is the typed face of one entity set: it serializes
//! entities to BSON on the way in and deserializes on the way out, so the
//! backend below only ever sees type-erased values keyed by set name.
//!
//! Mutations here are buffered, not applied: `add` and `remove` queue work
//! that only touches committed state when the owning context's
//! `save_changes` runs.
//!
//! # Example
//!
//! ```ignore
//! use mockwork::prelude::*;
//!
//! # fn example<B: ContextBackend>(ctx: &TestContext<B>) -> ContextResult<()> {
//! let users = ctx.set::<User>();
//! users.add(User { id: 1, name: "Alice".to_string() })?;
//! ctx.save_changes()?;
//! assert_eq!(users.all()?.len(), 1);
//! # Ok(()) }
//! ```

use bson::Bson;
use std::marker::PhantomData;

use crate::{
    backend::ContextBackend,
    entity::{Entity, EntityExt},
    error::ContextResult,
};

/// A typed view of one entity set, borrowed from a context backend.
///
/// # Type Parameters
///
/// * `'a` - Lifetime of the backend reference
/// * `B` - The context backend type
/// * `E` - The entity type stored in this set
#[derive(Debug)]
pub struct EntitySet<'a, B: ContextBackend, E: Entity> {
    name: String,
    backend: &'a B,
    _marker: PhantomData<E>,
}

impl<'a, B: ContextBackend, E: Entity> EntitySet<'a, B, E> {
    pub(crate) fn new(name: String, backend: &'a B) -> Self {
        Self { name, backend, _marker: PhantomData }
    }

    /// Returns the name of this entity set.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queues a single entity for insertion.
    ///
    /// Nothing is validated here; a duplicate only surfaces when
    /// `save_changes` runs.
    ///
    /// # Errors
    ///
    /// Returns a [`ContextError`](crate::error::ContextError) if serialization
    /// fails or the set was never registered.
    pub fn add(&self, entity: E) -> ContextResult<()> {
        self.add_range(vec![entity])
    }

    /// Queues multiple entities for insertion, in order.
    ///
    /// # Errors
    ///
    /// Returns a [`ContextError`](crate::error::ContextError) if serialization
    /// fails or the set was never registered.
    pub fn add_range(&self, entities: Vec<E>) -> ContextResult<()> {
        self.backend.queue_add(
            entities
                .iter()
                .map(EntityExt::to_bson)
                .collect::<ContextResult<Vec<Bson>>>()?,
            &self.name,
        )
    }

    /// Queues a single entity for removal.
    ///
    /// Removal matches by value equality against committed state at save
    /// time, not by identity.
    ///
    /// # Errors
    ///
    /// Returns a [`ContextError`](crate::error::ContextError) if serialization
    /// fails or the set was never registered.
    pub fn remove(&self, entity: E) -> ContextResult<()> {
        self.remove_range(vec![entity])
    }

    /// Queues multiple entities for removal, in order.
    ///
    /// # Errors
    ///
    /// Returns a [`ContextError`](crate::error::ContextError) if serialization
    /// fails or the set was never registered.
    pub fn remove_range(&self, entities: Vec<E>) -> ContextResult<()> {
        self.backend.queue_remove(
            entities
                .iter()
                .map(EntityExt::to_bson)
                .collect::<ContextResult<Vec<Bson>>>()?,
            &self.name,
        )
    }

    /// Returns every committed entity in this set, in order.
    ///
    /// Pending adds and removes are invisible until saved. A set that was
    /// never registered reads as empty rather than failing.
    ///
    /// # Errors
    ///
    /// Returns a [`ContextError`](crate::error::ContextError) if deserialization fails.
    pub fn all(&self) -> ContextResult<Vec<E>> {
        self.backend
            .committed(&self.name)?
            .into_iter()
            .map(E::from_bson)
            .collect()
    }
}
