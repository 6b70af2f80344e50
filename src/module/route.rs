//! Route driver: keeps a route in the requested state.

use std::fs;
use std::path::{Path as FsPath, PathBuf};

use serde::Deserialize;
use tracing::debug;

use super::result::ModuleResult;
use super::state::{DesiredState, ResourceState};
use crate::cli::{ApiResult, CommandRunner, OpenShiftCli, Result, DEFAULT_KUBECONFIG};
use crate::fieldpath::DEFAULT_SEPARATOR;
use crate::reconcile::check_def_equal;
use crate::resource::{Route, RouteConfig, TargetPort, TlsMaterial, PASSTHROUGH, REENCRYPT};
use crate::value::{Map, Value};

fn default_kubeconfig() -> PathBuf {
    PathBuf::from(DEFAULT_KUBECONFIG)
}

/// Parameters of the route module.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteParams {
    #[serde(default = "default_kubeconfig")]
    pub kubeconfig: PathBuf,
    #[serde(default)]
    pub state: DesiredState,
    #[serde(default)]
    pub debug: bool,
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub tls_termination: Option<String>,
    #[serde(default)]
    pub dest_cacert_path: Option<PathBuf>,
    #[serde(default)]
    pub cacert_path: Option<PathBuf>,
    #[serde(default)]
    pub cert_path: Option<PathBuf>,
    #[serde(default)]
    pub key_path: Option<PathBuf>,
    #[serde(default)]
    pub dest_cacert_content: Option<String>,
    #[serde(default)]
    pub cacert_content: Option<String>,
    #[serde(default)]
    pub cert_content: Option<String>,
    #[serde(default)]
    pub key_content: Option<String>,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub wildcard_policy: Option<String>,
    #[serde(default)]
    pub weight: Option<i64>,
    #[serde(default)]
    pub port: Option<TargetPort>,
}

impl RouteParams {
    /// Creates parameters for `name` in `namespace` with every option unset.
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        RouteParams {
            kubeconfig: default_kubeconfig(),
            state: DesiredState::default(),
            debug: false,
            name: name.into(),
            namespace: namespace.into(),
            tls_termination: None,
            dest_cacert_path: None,
            cacert_path: None,
            cert_path: None,
            key_path: None,
            dest_cacert_content: None,
            cacert_content: None,
            cert_content: None,
            key_content: None,
            service_name: None,
            host: None,
            wildcard_policy: None,
            weight: None,
            port: None,
        }
    }

    /// Checks argument combinations that cannot be expressed in the types.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let exclusive = [
            ("dest_cacert_path", self.dest_cacert_path.is_some(), "dest_cacert_content", self.dest_cacert_content.is_some()),
            ("cacert_path", self.cacert_path.is_some(), "cacert_content", self.cacert_content.is_some()),
            ("cert_path", self.cert_path.is_some(), "cert_content", self.cert_content.is_some()),
            ("key_path", self.key_path.is_some(), "key_content", self.key_content.is_some()),
        ];
        for (path, has_path, content, has_content) in exclusive {
            if has_path && has_content {
                return Err(format!("parameters are mutually exclusive: {}|{}", path, content));
            }
        }
        Ok(())
    }

    /// Resolves certificate material for non-passthrough terminations.
    pub fn tls_material(&self) -> std::result::Result<TlsMaterial, String> {
        let mut material = TlsMaterial::default();
        let Some(termination) = self
            .tls_termination
            .as_deref()
            .filter(|t| !t.is_empty() && !t.eq_ignore_ascii_case(PASSTHROUGH))
        else {
            return Ok(material);
        };

        let required = |name: &str, path: &Option<PathBuf>, content: &Option<String>| {
            get_cert_data(path.as_deref(), content.as_deref())
                .ok_or_else(|| format!("Verify that you pass a value for {}", name))
        };

        if termination == REENCRYPT {
            material.destcacert = Some(required("destcacert", &self.dest_cacert_path, &self.dest_cacert_content)?);
        }
        material.cacert = Some(required("cacert", &self.cacert_path, &self.cacert_content)?);
        material.cert = Some(required("cert", &self.cert_path, &self.cert_content)?);
        material.key = Some(required("key", &self.key_path, &self.key_content)?);
        Ok(material)
    }
}

/// Reads certificate data from `path` when it is readable, else falls back
/// to `content`. Empty data counts as missing.
pub fn get_cert_data(path: Option<&FsPath>, content: Option<&str>) -> Option<String> {
    let from_file = path.and_then(|p| fs::read_to_string(p).ok());
    from_file
        .or_else(|| content.map(str::to_string))
        .filter(|data| !data.is_empty())
}

/// OcRoute pairs the desired route with its observed counterpart.
pub struct OcRoute<'r> {
    config: RouteConfig,
    cli: OpenShiftCli<'r>,
    route: Option<Route>,
    state: ResourceState,
}

impl<'r> OcRoute<'r> {
    pub fn new(config: RouteConfig, cli: OpenShiftCli<'r>) -> Self {
        OcRoute {
            config,
            cli,
            route: None,
            state: ResourceState::Unknown,
        }
    }

    fn resource(&self) -> String {
        format!("{}/{}", Route::KIND, self.config.name)
    }

    fn transition(&mut self, next: ResourceState) {
        let resource = self.resource();
        self.state.transition(&resource, next);
    }

    pub fn state(&self) -> ResourceState {
        self.state
    }

    /// The observed route, if one was found by the last [`OcRoute::get`].
    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    pub fn exists(&self) -> bool {
        self.route.is_some()
    }

    /// Fetches the route. A "not found" answer is a successful empty result.
    pub fn get(&mut self) -> ApiResult {
        let mut result = self.cli.get(Route::KIND, Some(&self.config.name), None);
        if result.success() {
            let observed = result.items().first().cloned().unwrap_or_default();
            self.route = Some(Route::new(observed));
            self.transition(ResourceState::Present);
        } else if result
            .stderr()
            .contains(&format!("routes \"{}\" not found", self.config.name))
        {
            result.returncode = 0;
            result.results = Value::List(vec![Value::Map(Map::new())]);
            self.route = None;
            self.transition(ResourceState::Absent);
        }
        result
    }

    pub fn delete(&mut self) -> ApiResult {
        let result = self.cli.delete(Route::KIND, &self.config.name, None);
        if result.success() {
            self.route = None;
            self.transition(ResourceState::Absent);
        }
        result
    }

    pub fn create(&mut self) -> Result<ApiResult> {
        self.cli.create_from_content(&self.config.name, self.config.data())
    }

    /// Replaces the route with the desired content, forcing recreation when
    /// the host changes.
    pub fn update(&mut self) -> Result<ApiResult> {
        self.transition(ResourceState::Updating);
        let force = self.config.host.as_deref() != self.route.as_ref().and_then(Route::host);
        let content = self.config.data().as_map().cloned().unwrap_or_default();
        self.cli
            .replace_content(Route::KIND, &self.config.name, &content, force, DEFAULT_SEPARATOR)
    }

    /// Reports whether the observed route differs from the desired one.
    pub fn needs_update(&self) -> bool {
        match &self.route {
            Some(route) => !check_def_equal(self.config.data(), route.document(), &[], self.cli.is_verbose()),
            None => true,
        }
    }

    /// Drives the route towards `desired`. In check mode mutations are
    /// reported but not performed.
    pub fn run(&mut self, desired: DesiredState, check_mode: bool) -> ModuleResult {
        let current = self.get();

        match desired {
            DesiredState::List => ModuleResult::unchanged()
                .with_results(current.results)
                .with_state(DesiredState::List),

            DesiredState::Absent => {
                if !self.exists() {
                    return ModuleResult::unchanged().with_state(DesiredState::Absent);
                }
                if check_mode {
                    return ModuleResult::changed().with_msg("CHECK_MODE: Would have performed a delete.");
                }
                let deleted = self.delete();
                if !deleted.success() {
                    return ModuleResult::failed(deleted).with_state(DesiredState::Absent);
                }
                ModuleResult::changed()
                    .with_results(deleted)
                    .with_state(DesiredState::Absent)
            }

            DesiredState::Present => {
                if !self.exists() {
                    if check_mode {
                        return ModuleResult::changed().with_msg("CHECK_MODE: Would have performed a create.");
                    }
                    return self.apply(Self::create);
                }

                if self.needs_update() {
                    if check_mode {
                        return ModuleResult::changed().with_msg("CHECK_MODE: Would have performed an update.");
                    }
                    return self.apply(Self::update);
                }

                debug!(route = %self.config.name, "route is up to date");
                ModuleResult::unchanged()
                    .with_results(current)
                    .with_state(DesiredState::Present)
            }
        }
    }

    fn apply(&mut self, action: fn(&mut Self) -> Result<ApiResult>) -> ModuleResult {
        let applied = match action(self) {
            Ok(result) => result,
            Err(e) => return ModuleResult::failed(e.to_string()).with_state(DesiredState::Present),
        };
        if !applied.success() {
            return ModuleResult::failed(applied).with_state(DesiredState::Present);
        }

        let refreshed = self.get();
        if !refreshed.success() {
            return ModuleResult::failed(refreshed).with_state(DesiredState::Present);
        }
        ModuleResult::changed()
            .with_results(refreshed)
            .with_state(DesiredState::Present)
    }
}

/// Runs the route module.
pub fn run_route(params: &RouteParams, check_mode: bool, runner: &dyn CommandRunner) -> ModuleResult {
    if let Err(msg) = params.validate() {
        return ModuleResult::failed(msg);
    }
    let tls = match params.tls_material() {
        Ok(tls) => tls,
        Err(msg) => return ModuleResult::failed(msg),
    };

    let config = RouteConfig::builder(&params.name, &params.namespace)
        .host(params.host.clone())
        .tls_termination(params.tls_termination.clone())
        .tls(tls)
        .service_name(params.service_name.clone())
        .wildcard_policy(params.wildcard_policy.clone())
        .weight(params.weight)
        .port(params.port.clone())
        .build();

    let cli = match OpenShiftCli::new(Some(params.namespace.clone()), &params.kubeconfig, runner) {
        Ok(cli) => cli.verbose(params.debug),
        Err(e) => return ModuleResult::failed(e.to_string()),
    };

    OcRoute::new(config, cli).run(params.state, check_mode)
}
