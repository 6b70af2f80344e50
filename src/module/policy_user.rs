//! Policy user driver: grants or revokes a role, cluster role or SCC.

use std::path::PathBuf;

use serde::Deserialize;

use super::result::ModuleResult;
use super::state::DesiredState;
use crate::cli::{CommandRunner, DEFAULT_KUBECONFIG};
use crate::resource::{PolicyUser, PolicyUserConfig, ResourceKind};

fn default_kubeconfig() -> PathBuf {
    PathBuf::from(DEFAULT_KUBECONFIG)
}

fn default_namespace() -> String {
    "default".to_string()
}

/// Parameters of the policy user module.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyUserParams {
    #[serde(default = "default_kubeconfig")]
    pub kubeconfig: PathBuf,
    #[serde(default)]
    pub state: DesiredState,
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    pub user: String,
    pub resource_kind: ResourceKind,
    pub resource_name: String,
}

impl PolicyUserParams {
    pub fn new(user: impl Into<String>, resource_kind: ResourceKind, resource_name: impl Into<String>) -> Self {
        PolicyUserParams {
            kubeconfig: default_kubeconfig(),
            state: DesiredState::default(),
            debug: false,
            namespace: default_namespace(),
            user: user.into(),
            resource_kind,
            resource_name: resource_name.into(),
        }
    }
}

/// Runs the policy user module.
pub fn run_policy_user(params: &PolicyUserParams, check_mode: bool, runner: &dyn CommandRunner) -> ModuleResult {
    let grant = match params.state {
        DesiredState::Present => true,
        DesiredState::Absent => false,
        DesiredState::List => {
            return ModuleResult::failed(format!("Unknown state passed. {}", params.state));
        }
    };

    let config = PolicyUserConfig::new(
        Some(params.namespace.clone()),
        &params.kubeconfig,
        params.resource_kind.action(grant),
        &params.user,
        params.resource_kind,
        &params.resource_name,
    );
    let policy = match PolicyUser::new(config, runner, params.debug) {
        Ok(policy) => policy,
        Err(e) => return ModuleResult::failed(e.to_string()),
    };

    let exists = match policy.exists() {
        Ok(exists) => exists,
        Err(e) => return ModuleResult::failed(e.to_string()).with_state(params.state),
    };

    // Present wants the grant to exist, absent wants it gone.
    if exists == grant {
        return ModuleResult::unchanged().with_state(params.state);
    }

    if check_mode {
        let verb = if grant { "create" } else { "delete" };
        return ModuleResult::changed().with_msg(format!("CHECK_MODE: would have performed a {}.", verb));
    }

    let performed = policy.perform();
    if !performed.success() {
        return ModuleResult::failed(performed).with_state(params.state);
    }
    ModuleResult::changed()
        .with_results(performed)
        .with_state(params.state)
}
