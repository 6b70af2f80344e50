//! Resource module - Typed views over the cluster objects the drivers manage.

mod options;
mod policy_user;
mod route;
mod scc;

pub use options::*;
pub use policy_user::*;
pub use route::*;
pub use scc::*;
