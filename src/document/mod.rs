//! Document module - Path-addressed editing of YAML/JSON documents.
//!
//! The free functions (`get_entry`, `add_entry`, `remove_entry`) walk a
//! [`Value`](crate::value::Value) tree directly; [`Yedit`] wraps a document
//! with copy-on-write edits and file persistence.

mod error;
mod input;
mod navigate;
mod store;


pub use error::*;
pub use input::*;
pub use navigate::*;
pub use store::*;
