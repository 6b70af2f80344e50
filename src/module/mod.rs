//! Module module - Idempotent drivers behind the `oc-yedit` subcommands.
//!
//! Each driver takes its parameters and a check-mode flag and returns a
//! [`ModuleResult`]. Failures, including non-zero exits of `oc`, are
//! reported inside the result rather than as errors.

mod edit;
mod policy_user;
mod result;
mod route;
mod state;


pub use edit::*;
pub use policy_user::*;
pub use result::*;
pub use route::*;
pub use state::*;
