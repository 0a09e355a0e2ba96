//! Core traits for entity representation and serialization.
//!
//! This module provides the fundamental trait that all entities tracked by a
//! test context must implement, as well as utilities for converting entities
//! between formats (BSON, JSON).
//!
//! Entities are compared **by value**, never by reference identity: two
//! entities are the same row exactly when their serialized forms are equal.
//! This mirrors how the test double decides duplicate-add and missing-remove
//! failures at save time.

use bson::{Bson, de::deserialize_from_bson, ser::serialize_to_bson};
use serde::{Deserialize, Serialize};
use serde_json::{Value, from_value, to_value};

use crate::error::ContextResult;

/// Core trait that all entities tracked by a test context must implement.
///
/// This trait defines the minimal interface required for a type to be used as
/// an entity: it must round-trip through serde, be cloneable, and name the
/// entity set it belongs to. There is no identifier requirement; membership
/// checks use whole-value equality of the serialized entity.
///
/// # Example
///
/// ```ignore
/// use mockwork::entity::Entity;
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// pub struct User {
///     pub id: u32,
///     pub name: String,
/// }
///
/// impl Entity for User {
///     fn set_name() -> &'static str {
///         "users"
///     }
/// }
/// ```
pub trait Entity:
    Serialize + for<'de> Deserialize<'de> + Send + Sync + Clone + PartialEq + std::fmt::Debug + 'static
{
    /// Returns the name of the entity set this type belongs to.
    ///
    /// This should be a static, lowercase identifier (e.g., "users", "orders").
    /// The set must be registered on the context before mutations on it are
    /// meaningful.
    fn set_name() -> &'static str;
}

/// Extension trait providing serialization/deserialization utilities for entities.
///
/// This trait is automatically implemented for all types that implement [`Entity`].
/// It provides convenient methods to convert entities to and from BSON and JSON,
/// which is how the typed layer talks to the type-erased backend.
pub trait EntityExt: Entity {
    /// Converts this entity to a BSON value for storage.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn to_bson(&self) -> ContextResult<Bson>;

    /// Creates an entity from a BSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails or the structure is invalid.
    fn from_bson(bson: Bson) -> ContextResult<Self>;

    /// Converts this entity to a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn to_json(&self) -> ContextResult<Value>;

    /// Creates an entity from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails or the structure is invalid.
    fn from_json(value: Value) -> ContextResult<Self>;
}

impl<E: Entity> EntityExt for E {
    fn to_bson(&self) -> ContextResult<Bson> {
        Ok(serialize_to_bson(self)?)
    }

    fn from_bson(bson: Bson) -> ContextResult<Self> {
        Ok(deserialize_from_bson(bson)?)
    }

    fn to_json(&self) -> ContextResult<Value> {
        Ok(to_value(self)?)
    }

    fn from_json(value: Value) -> ContextResult<Self> {
        Ok(from_value(value)?)
    }
}
