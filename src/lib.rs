//! # OpenShift Yedit
//!
//! Path-addressed editing of YAML/JSON documents and idempotent
//! reconciliation of OpenShift objects through the `oc` client.
//!
//! A document is addressed with separator-delimited keys such as
//! `spec.template.spec.containers[0].args`. [`Yedit`] applies edits to a
//! document held in memory or backed by a file; the drivers in [`module`]
//! compare a desired object against the one observed on the cluster and
//! create, replace or delete it only when they differ.
//!
//! ## Modules
//!
//! - [`value`] - In-memory representation of YAML/JSON documents
//! - [`fieldpath`] - Key paths and their parser
//! - [`document`] - Path navigation and the [`Yedit`] store
//! - [`reconcile`] - Desired versus observed document comparison
//! - [`cli`] - Running `oc` and capturing its results
//! - [`resource`] - Typed views over routes, SCCs and policy bindings
//! - [`module`] - Edit, route and policy user drivers
//! - [`logging`] - Subscriber setup for the binary

pub mod cli;
pub mod document;
pub mod fieldpath;
pub mod logging;
pub mod module;
pub mod reconcile;
pub mod resource;
pub mod value;

pub use cli::{ApiResult, CommandRunner, OpenShiftCli, ProcessRunner};
pub use document::{Edit, Yedit, YeditBuilder, YeditError};
pub use fieldpath::{Path, PathElement};
pub use module::{run_edit, run_policy_user, run_route, ModuleResult};
pub use reconcile::check_def_equal;
pub use value::{Map, Value};
