//! Value module - In-memory representation of YAML/JSON documents.
//!
//! This module provides the document model edited by paths and compared by
//! the reconciler.

mod value;

pub use value::*;
