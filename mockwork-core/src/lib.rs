//! Core traits and types for faking an entity persistence layer in tests.
//!
//! This crate is the core of the mockwork project and provides:
//!
//! - **Entity traits** ([`entity`]) - Core traits for defining and serializing entities
//! - **Context backend abstraction** ([`backend`]) - The contract shared by real contexts and the fake
//! - **Typed entity sets** ([`set`]) - Buffered, typed views over one entity set
//! - **Test context facade** ([`context`]) - The entry point handed to test code, with transaction guard
//! - **Error handling** ([`error`]) - The error taxonomy and result type
//!
//! # Example
//!
//! ```ignore
//! use mockwork::{Entity, TestContext};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
//! pub struct User {
//!     pub id: u32,
//!     pub name: String,
//! }
//!
//! impl Entity for User {
//!     fn set_name() -> &'static str {
//!         "users"
//!     }
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as mockwork_core;

pub mod backend;
pub mod context;
pub mod entity;
pub mod error;
pub mod set;
