//! Convenient re-exports of commonly used types from mockwork.
//!
//! Import this prelude module to quickly access the most frequently used
//! types and traits without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use mockwork::prelude::*;
//! ```

pub use mockwork_core::{
    backend::{ContextBackend, ContextBackendBuilder, IsolationLevel},
    context::{ContextTransaction, TestContext},
    entity::{Entity, EntityExt},
    error::{ContextError, ContextResult},
    set::EntitySet,
};

pub use mockwork_memory::{InMemoryContext, InMemoryContextBuilder};
