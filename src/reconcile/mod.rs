//! Reconcile module - Decides whether an observed object matches a desired one.

mod equal;

pub use equal::*;
