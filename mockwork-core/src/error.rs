//! Error types and result types for test-context operations.
//!
//! This module provides the error taxonomy for everything the test double can
//! reject: duplicate or missing entities at save time, transaction
//! state-machine misuse, mutations against unregistered sets, and capabilities
//! that are deliberately left unemulated. Use [`ContextResult<T>`] as the
//! return type for fallible operations.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when interacting with a test context.
///
/// Every error is raised synchronously at the point of misuse; nothing is
/// retried or swallowed internally, apart from the explicit no-throw rollback
/// path used for drop-time cleanup.
#[derive(Error, Debug)]
pub enum ContextError {
    /// A save tried to insert an entity that is value-equal to one already committed.
    /// The first argument is a rendering of the entity, the second is the set name.
    #[error("Entity {0} already exists in set {1}")]
    DuplicateEntity(String, String),
    /// A save tried to remove an entity with no value-equal match in committed state.
    /// The first argument is a rendering of the entity, the second is the set name.
    #[error("Entity {0} not found in set {1}")]
    MissingEntity(String, String),
    /// `begin_transaction` was called while a transaction was already open.
    #[error("A transaction is already open")]
    TransactionAlreadyOpen,
    /// `commit_transaction` or `rollback_transaction` was called with no open transaction.
    #[error("No transaction is open")]
    NoOpenTransaction,
    /// A mutation targeted an entity set that was never registered.
    #[error("Entity set not registered: {0}")]
    SetNotRegistered(String),
    /// The capability is intentionally not emulated by this test double
    /// (raw SQL, bulk update/delete, isolation levels, savepoints).
    #[error("Not supported by this test double: {0}")]
    Unsupported(&'static str),
    /// Serialization/deserialization error when converting between entity formats (BSON, JSON).
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// A specialized `Result` type for test-context operations.
///
/// This type alias is used throughout the crate to indicate operations that may fail
/// with a [`ContextError`].
pub type ContextResult<T> = Result<T, ContextError>;

impl From<BsonError> for ContextError {
    fn from(err: BsonError) -> Self {
        ContextError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for ContextError {
    fn from(err: SerdeJsonError) -> Self {
        ContextError::Serialization(err.to_string())
    }
}
