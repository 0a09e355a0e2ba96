//! In-memory context backend for mockwork.
//!
//! This crate provides the in-memory implementation of the `ContextBackend`
//! contract: a per-set buffered store, a single shared transaction, and a
//! deliberate fidelity boundary. It is the test double: add/remove/save,
//! begin/commit/rollback, and nothing a real database would be needed for.
//!
//! # Features
//!
//! - **Unit-of-work buffering** - Adds and removes queue per set and apply on save
//! - **Transactional undo** - One shared transaction snapshots each set at save time
//! - **Fail-fast boundary** - Raw SQL, bulk ops, isolation levels, and savepoints are rejected
//! - **Clone-shared handle** - `Arc`-backed state behind one lock, like a real context handle
//!
//! # Quick Start
//!
//! ```ignore
//! use mockwork::{Entity, TestContext, memory::InMemoryContext};
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
//! fn main() -> mockwork::error::ContextResult<()> {
//!     let ctx = TestContext::new(InMemoryContext::new());
//!     ctx.register::<User>()?;
//!
//!     ctx.set::<User>().add(User { id: 1, name: "Alice".to_string() })?;
//!     assert_eq!(ctx.save_changes()?, 1);
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as mockwork_memory;

pub mod context;
pub mod store;
pub mod transaction;

pub use context::{InMemoryContext, InMemoryContextBuilder};
