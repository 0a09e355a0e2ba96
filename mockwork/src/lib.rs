//! Main mockwork crate: an in-memory transactional test double for entity
//! persistence layers.
//!
//! This crate is the primary entry point for users. It re-exports the core
//! types and the in-memory backend so test code needs a single dependency.
//!
//! # What this is
//!
//! A fake persistence context for unit tests: typed entity sets with
//! unit-of-work buffering (mutations queue until `save_changes`), a single
//! shared transaction with commit/rollback and a drop-rollback guard, and a
//! deliberate fidelity boundary: raw SQL, bulk update/delete, isolation
//! levels, and savepoints fail fast instead of being half-emulated.
//!
//! # Quick Start
//!
//! ```ignore
//! use mockwork::{prelude::*, memory::InMemoryContext};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
//! pub struct User {
//!     pub id: u32,
//!     pub name: String,
//! }
//!
//! impl Entity for User {
//!     fn set_name() -> &'static str { "users" }
//! }
//!
//! fn main() -> ContextResult<()> {
//!     // Each test constructs its own context; dropping it is teardown.
//!     let ctx = TestContext::new(InMemoryContext::new());
//!     ctx.register::<User>()?;
//!
//!     let users = ctx.set::<User>();
//!     users.add(User { id: 1, name: "Alice".to_string() })?;
//!
//!     // Pending changes are invisible until saved.
//!     assert!(users.all()?.is_empty());
//!     assert_eq!(ctx.save_changes()?, 1);
//!     assert_eq!(users.all()?.len(), 1);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Transactions
//!
//! ```ignore
//! use mockwork::{prelude::*, memory::InMemoryContext};
//!
//! # fn example(ctx: &TestContext<InMemoryContext>) -> ContextResult<()> {
//! let tx = ctx.begin_transaction()?;
//! ctx.set::<User>().add(User { id: 2, name: "Bob".to_string() })?;
//! ctx.save_changes()?;
//! tx.rollback()?; // Bob is gone again
//!
//! // Or let the guard fall out of scope: the transaction rolls back on drop.
//! {
//!     let _tx = ctx.begin_transaction()?;
//!     ctx.set::<User>().add(User { id: 3, name: "Carol".to_string() })?;
//!     ctx.save_changes()?;
//! }
//! assert_eq!(ctx.set::<User>().all()?.len(), 1);
//! # Ok(()) }
//! ```

pub mod prelude;

pub use mockwork_core::{backend, context, entity, error, set};

pub use mockwork_core::{
    context::TestContext,
    entity::Entity,
    error::{ContextError, ContextResult},
};

// Re-export BSON types for convenience
pub use bson;

/// In-memory context backend implementations.
pub mod memory {
    pub use mockwork_memory::{InMemoryContext, InMemoryContextBuilder};
}
