//! Binding of a role, cluster role or SCC to a user.

use std::path::PathBuf;

use once_cell::unsync::OnceCell;
use serde::Deserialize;
use tracing::debug;

use super::options::CliOptions;
use super::scc::SecurityContextConstraints;
use crate::cli::{ApiResult, CliError, CommandRunner, OpenShiftCli, OutputFormat, Result};
use crate::document::get_entry;
use crate::value::Value;

/// Kind of resource granted to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    Role,
    ClusterRole,
    Scc,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Role => "role",
            ResourceKind::ClusterRole => "cluster-role",
            ResourceKind::Scc => "scc",
        }
    }

    /// The object kind that records the grant.
    pub fn binding_kind(self) -> &'static str {
        match self {
            ResourceKind::Role => "rolebinding",
            ResourceKind::ClusterRole => "clusterrolebinding",
            ResourceKind::Scc => "scc",
        }
    }

    /// The `oc adm policy` verb that grants or revokes this kind.
    pub fn action(self, grant: bool) -> String {
        if grant {
            format!("add-{}-to-user", self.as_str())
        } else {
            format!("remove-{}-from-user", self.as_str())
        }
    }
}

/// PolicyUserConfig describes one user grant.
#[derive(Debug, Clone)]
pub struct PolicyUserConfig {
    pub namespace: Option<String>,
    pub kubeconfig: PathBuf,
    resource_kind: ResourceKind,
    options: CliOptions,
}

impl PolicyUserConfig {
    pub fn new(
        namespace: Option<String>,
        kubeconfig: impl Into<PathBuf>,
        action: impl Into<String>,
        user: impl Into<String>,
        resource_kind: ResourceKind,
        resource_name: impl Into<String>,
    ) -> Self {
        let options = CliOptions::new()
            .with("action", Value::String(action.into()), false)
            .with("user", Value::String(user.into()), false)
            .with("resource_kind", resource_kind.as_str(), false)
            .with("name", Value::String(resource_name.into()), false);
        PolicyUserConfig {
            namespace,
            kubeconfig: kubeconfig.into(),
            resource_kind,
            options,
        }
    }

    pub fn action(&self) -> &str {
        self.options.get_str("action")
    }

    pub fn user(&self) -> &str {
        self.options.get_str("user")
    }

    /// Name of the role, cluster role or SCC.
    pub fn name(&self) -> &str {
        self.options.get_str("name")
    }

    pub fn resource_kind(&self) -> ResourceKind {
        self.resource_kind
    }

    pub fn kind(&self) -> &'static str {
        self.resource_kind.binding_kind()
    }

    pub fn options(&self) -> &CliOptions {
        &self.options
    }
}

/// PolicyUser answers whether a grant is in place and applies it.
///
/// Binding lists and the SCC are fetched on first use and kept for the
/// lifetime of the value.
pub struct PolicyUser<'r> {
    config: PolicyUserConfig,
    cli: OpenShiftCli<'r>,
    policy_bindings: OnceCell<Value>,
    cluster_policy_bindings: OnceCell<Value>,
    scc: OnceCell<SecurityContextConstraints>,
}

impl<'r> PolicyUser<'r> {
    pub fn new(config: PolicyUserConfig, runner: &'r dyn CommandRunner, verbose: bool) -> Result<Self> {
        let cli = OpenShiftCli::new(config.namespace.clone(), &config.kubeconfig, runner)?.verbose(verbose);
        Ok(PolicyUser::with_cli(config, cli))
    }

    pub fn with_cli(config: PolicyUserConfig, cli: OpenShiftCli<'r>) -> Self {
        PolicyUser {
            config,
            cli,
            policy_bindings: OnceCell::new(),
            cluster_policy_bindings: OnceCell::new(),
            scc: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &PolicyUserConfig {
        &self.config
    }

    /// Namespaced policy bindings.
    pub fn policy_bindings(&self) -> Result<&Value> {
        self.policy_bindings
            .get_or_try_init(|| self.fetch_bindings("policybindings"))
    }

    /// Cluster-wide policy bindings.
    pub fn cluster_policy_bindings(&self) -> Result<&Value> {
        self.cluster_policy_bindings
            .get_or_try_init(|| self.fetch_bindings("clusterpolicybindings"))
    }

    fn fetch_bindings(&self, kind: &str) -> Result<Value> {
        let result = self.cli.get(kind, None, None);
        if !result.success() {
            return Err(CliError::query(format!(
                "Could not retrieve {}: {}",
                kind,
                result.stderr().trim()
            )));
        }
        result
            .items()
            .first()
            .and_then(|list| get_entry(list, "items[0]", '.'))
            .cloned()
            .ok_or_else(|| CliError::query(format!("Could not retrieve {}", kind)))
    }

    /// Fetches the SCC named in the config.
    pub fn get(&self) -> ApiResult {
        let mut name = self.config.name().to_string();
        if name == "cluster-reader" {
            name.push('s');
        }
        self.cli.get(self.config.kind(), Some(&name), None)
    }

    /// Returns the role binding that grants the role to the user.
    pub fn role_binding(&self) -> Result<Option<&Value>> {
        let bindings = match self.config.resource_kind() {
            ResourceKind::ClusterRole => self.cluster_policy_bindings()?,
            _ => self.policy_bindings()?,
        };

        let role_bindings = bindings
            .as_map()
            .and_then(|m| m.get("roleBindings"))
            .and_then(Value::as_list)
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        let user = Value::from(self.config.user());
        Ok(role_bindings.iter().find(|binding| {
            let role_ref = get_entry(binding, "roleBinding.roleRef.name", '.').and_then(Value::as_str);
            let users = get_entry(binding, "roleBinding.userNames", '.').and_then(Value::as_list);
            role_ref == Some(self.config.name()) && users.is_some_and(|u| u.contains(&user))
        }))
    }

    pub fn exists_role_binding(&self) -> Result<bool> {
        Ok(self.role_binding()?.is_some())
    }

    /// Returns the SCC named in the config.
    pub fn security_context_constraint(&self) -> Result<&SecurityContextConstraints> {
        self.scc.get_or_try_init(|| {
            let result = self.get();
            if !result.success() {
                return Err(CliError::query(format!(
                    "Could not retrieve scc {}: {}",
                    self.config.name(),
                    result.stderr().trim()
                )));
            }
            let document = result.items().first().cloned().unwrap_or_default();
            Ok(SecurityContextConstraints::new(document))
        })
    }

    pub fn exists_scc(&self) -> Result<bool> {
        Ok(self
            .security_context_constraint()?
            .find_user(self.config.user())
            .is_some())
    }

    /// Reports whether the user currently holds the grant.
    pub fn exists(&self) -> Result<bool> {
        let exists = match self.config.resource_kind() {
            ResourceKind::Role | ResourceKind::ClusterRole => self.exists_role_binding()?,
            ResourceKind::Scc => self.exists_scc()?,
        };
        debug!(
            kind = self.config.kind(),
            name = self.config.name(),
            user = self.config.user(),
            exists,
            "checked user policy"
        );
        Ok(exists)
    }

    /// Runs `oc adm policy <action> <name> <user>`.
    pub fn perform(&self) -> ApiResult {
        self.cli.openshift_cmd(
            [
                "policy",
                self.config.action(),
                self.config.name(),
                self.config.user(),
            ],
            true,
            OutputFormat::Discard,
            None,
        )
    }
}
