//! Field path module - Addresses locations inside nested documents.
//!
//! A path is written as separator-delimited field names with inline
//! `[N]` sequence indexes, e.g. `spec.to.name` or `items[0].metadata`.

mod parser;
mod path;

pub use parser::*;
pub use path::*;
