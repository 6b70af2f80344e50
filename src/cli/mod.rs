//! CLI module - Running the `oc` client and capturing its results.
//!
//! [`CommandRunner`] is the seam to the outside world: [`OpenShiftCli`]
//! builds argument lists and interprets output, while the runner only
//! executes them.

mod error;
mod executor;
mod openshift;
mod result;

#[cfg(test)]
pub(crate) mod testing;

pub use error::*;
pub use executor::*;
pub use openshift::*;
pub use result::*;
