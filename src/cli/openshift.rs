//! Wrapper around the `oc` command line client.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path as FsPath, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::error::{CliError, Result};
use super::executor::{CommandOutput, CommandRunner};
use super::result::ApiResult;
use crate::document::{Content, Yedit};
use crate::value::{self, Map, Value};

/// Kubeconfig used when none is configured.
pub const DEFAULT_KUBECONFIG: &str = "/etc/origin/master/admin.kubeconfig";

const OC_BINARY: &str = "oc";

/// Namespace values that mean "do not pass `-n`".
const NO_NAMESPACE: [&str; 2] = ["none", "emtpy"];

/// Finds the `oc` binary on `PATH`, `/usr/local/bin` or `~/bin`, falling back
/// to the bare name.
pub fn locate_oc_binary() -> PathBuf {
    let mut paths: Vec<PathBuf> = env::var_os("PATH")
        .map(|p| env::split_paths(&p).collect())
        .unwrap_or_default();
    paths.push(PathBuf::from("/usr/local/bin"));
    if let Some(home) = env::var_os("HOME") {
        paths.push(PathBuf::from(home).join("bin"));
    }
    locate_binary_in(OC_BINARY, &paths)
}

/// Returns the first `dir/name` that is a file, or `name` itself.
pub fn locate_binary_in(name: &str, paths: &[PathBuf]) -> PathBuf {
    paths
        .iter()
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
        .unwrap_or_else(|| PathBuf::from(name))
}

/// How the stdout of a successful command is turned into `results`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Output is not captured into `results`.
    Discard,
    Json,
    Raw,
}

/// OpenShiftCli builds and runs `oc` commands against one namespace.
///
/// The kubeconfig is copied to a private temporary file at construction and
/// exported through `KUBECONFIG`; the copy is removed when the wrapper is
/// dropped.
pub struct OpenShiftCli<'r> {
    runner: &'r dyn CommandRunner,
    namespace: Option<String>,
    all_namespaces: bool,
    verbose: bool,
    oc_binary: PathBuf,
    kubeconfig: NamedTempFile,
}

impl<'r> OpenShiftCli<'r> {
    /// Creates a wrapper, copying `kubeconfig` aside.
    pub fn new(
        namespace: Option<String>,
        kubeconfig: impl AsRef<FsPath>,
        runner: &'r dyn CommandRunner,
    ) -> Result<Self> {
        let kubeconfig = copy_to_tempfile(kubeconfig.as_ref(), "lib_openshift-")?;
        Ok(OpenShiftCli {
            runner,
            namespace,
            all_namespaces: false,
            verbose: false,
            oc_binary: locate_oc_binary(),
            kubeconfig,
        })
    }

    /// Logs command output in addition to command lines.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Targets every namespace instead of the configured one.
    pub fn all_namespaces(mut self, all_namespaces: bool) -> Self {
        self.all_namespaces = all_namespaces;
        self
    }

    /// Overrides the located `oc` binary.
    pub fn oc_binary(mut self, oc_binary: impl Into<PathBuf>) -> Self {
        self.oc_binary = oc_binary.into();
        self
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Path of the private kubeconfig copy.
    pub fn kubeconfig_path(&self) -> &FsPath {
        self.kubeconfig.path()
    }

    /// Runs `oc [adm] <cmd> [-n <namespace> | --all-namespaces]`.
    pub fn openshift_cmd<I, S>(
        &self,
        cmd: I,
        oadm: bool,
        output: OutputFormat,
        input: Option<&[u8]>,
    ) -> ApiResult
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args = vec![self.oc_binary.to_string_lossy().into_owned()];
        if oadm {
            args.push("adm".to_string());
        }
        args.extend(cmd.into_iter().map(Into::into));

        if self.all_namespaces {
            args.push("--all-namespaces".to_string());
        } else if let Some(namespace) = self
            .namespace
            .as_deref()
            .filter(|ns| !NO_NAMESPACE.contains(&ns.to_lowercase().as_str()))
        {
            args.push("-n".to_string());
            args.push(namespace.to_string());
        }

        let command_line = args.join(" ");
        debug!(cmd = %command_line, "running oc");

        let env = [(
            "KUBECONFIG".to_string(),
            self.kubeconfig.path().to_string_lossy().into_owned(),
        )];
        let out = match self.runner.run(&args, input, &env) {
            Ok(out) => out,
            Err(e) => {
                warn!(error = %e, "external command could not be started");
                CommandOutput::new(1, "", e.to_string())
            }
        };

        let mut result = ApiResult {
            returncode: out.code,
            results: Value::String(String::new()),
            cmd: Some(command_line),
            stdout: None,
            stderr: None,
            err: None,
            updated: None,
        };

        if !out.success() {
            debug!(code = out.code, output = %out.failure_summary(), "oc exited non-zero");
            result.results = Value::Map(Map::new());
            result.stdout = Some(out.stdout);
            result.stderr = Some(out.stderr);
            return result;
        }

        if self.verbose {
            debug!(stdout = %out.stdout, stderr = %out.stderr, "oc output");
        }

        match output {
            OutputFormat::Json => match value::from_json(&out.stdout) {
                Ok(parsed) => result.results = parsed,
                Err(e) => {
                    warn!(error = %e, "oc output is not valid json");
                    result.err = Some(e.to_string());
                    result.stdout = Some(out.stdout);
                    result.stderr = Some(out.stderr);
                }
            },
            OutputFormat::Raw => result.results = Value::String(out.stdout),
            OutputFormat::Discard => {}
        }
        result
    }

    /// Runs `oc get <kind> [<name> | --selector=<selector>] -o json`. The
    /// results are always a list.
    pub fn get(&self, kind: &str, name: Option<&str>, selector: Option<&str>) -> ApiResult {
        let mut cmd = vec!["get".to_string(), kind.to_string()];
        if let Some(selector) = selector {
            cmd.push(format!("--selector={}", selector));
        } else if let Some(name) = name {
            cmd.push(name.to_string());
        }
        cmd.push("-o".to_string());
        cmd.push("json".to_string());

        let mut result = self.openshift_cmd(cmd, false, OutputFormat::Json, None);
        if !result.results.is_list() {
            let single = std::mem::replace(&mut result.results, Value::Null);
            result.results = Value::List(vec![single]);
        }
        result
    }

    /// Runs `oc delete <kind> <name> [--selector=<selector>]`.
    pub fn delete(&self, kind: &str, name: &str, selector: Option<&str>) -> ApiResult {
        let mut cmd = vec!["delete".to_string(), kind.to_string(), name.to_string()];
        if let Some(selector) = selector {
            cmd.push(format!("--selector={}", selector));
        }
        self.openshift_cmd(cmd, false, OutputFormat::Discard, None)
    }

    /// Runs `oc create -f <file>`.
    pub fn create(&self, file: &FsPath) -> ApiResult {
        self.openshift_cmd(
            ["create".to_string(), "-f".to_string(), file.to_string_lossy().into_owned()],
            false,
            OutputFormat::Discard,
            None,
        )
    }

    /// Runs `oc replace -f <file> [--force]`.
    pub fn replace(&self, file: &FsPath, force: bool) -> ApiResult {
        let mut cmd = vec!["replace".to_string(), "-f".to_string(), file.to_string_lossy().into_owned()];
        if force {
            cmd.push("--force".to_string());
        }
        self.openshift_cmd(cmd, false, OutputFormat::Discard, None)
    }

    /// Writes `document` to a temporary file and creates it.
    pub fn create_from_content(&self, name: &str, document: &Value) -> Result<ApiResult> {
        let file = write_tempfile(name, document.clone(), crate::fieldpath::DEFAULT_SEPARATOR)?;
        let result = self.create(file.path());
        close_tempfile(file);
        Ok(result)
    }

    /// Fetches `<kind>/<name>`, sets every top-level key of `content` on it
    /// and replaces the object when that changed anything.
    pub fn replace_content(
        &self,
        kind: &str,
        name: &str,
        content: &Map,
        force: bool,
        separator: char,
    ) -> Result<ApiResult> {
        let current = self.get(kind, Some(name), None);
        if !current.success() {
            return Ok(current);
        }
        let Some(object) = current.items().first() else {
            return Ok(current);
        };

        let file = tempfile_for(name)?;
        let mut store = Yedit::builder()
            .filename(file.path())
            .content(Content::Document(object.clone()))
            .separator(separator)
            .build()?;

        let mut changed = false;
        for (key, value) in content.iter() {
            changed |= store.put(key, value.clone())?.is_changed();
        }
        if !changed {
            close_tempfile(file);
            return Ok(ApiResult::not_updated());
        }

        store.write()?;
        let result = self.replace(file.path(), force);
        close_tempfile(file);
        Ok(result)
    }

    /// Runs `oc process`, either on a named template or on `template_data`
    /// fed through stdin, and creates the processed objects when `create`.
    pub fn process(
        &self,
        template_name: &str,
        create: bool,
        params: &BTreeMap<String, String>,
        template_data: Option<&str>,
    ) -> Result<ApiResult> {
        let mut cmd = vec!["process".to_string()];
        match template_data {
            Some(_) => {
                cmd.push("-f".to_string());
                cmd.push("-".to_string());
            }
            None => cmd.push(template_name.to_string()),
        }
        if !params.is_empty() {
            cmd.push("-v".to_string());
            cmd.extend(params.iter().map(|(k, v)| format!("{}={}", k, v)));
        }

        let result = self.openshift_cmd(
            cmd,
            false,
            OutputFormat::Json,
            template_data.map(str::as_bytes),
        );
        if !result.success() || !create {
            return Ok(result);
        }

        let file = write_tempfile(template_name, result.results, crate::fieldpath::DEFAULT_SEPARATOR)?;
        let created = self.create(file.path());
        close_tempfile(file);
        Ok(created)
    }

    /// Runs `oc version`, keeping the raw output.
    pub fn version(&self) -> ApiResult {
        self.openshift_cmd(["version"], false, OutputFormat::Raw, None)
    }
}

fn tempfile_for(name: &str) -> Result<NamedTempFile> {
    tempfile::Builder::new()
        .prefix(&format!("{}-", name))
        .tempfile()
        .map_err(|e| CliError::io(env::temp_dir(), e))
}

fn copy_to_tempfile(source: &FsPath, prefix: &str) -> Result<NamedTempFile> {
    let file = tempfile::Builder::new()
        .prefix(prefix)
        .tempfile()
        .map_err(|e| CliError::io(env::temp_dir(), e))?;
    fs::copy(source, file.path()).map_err(|e| CliError::io(source, e))?;
    Ok(file)
}

fn write_tempfile(name: &str, document: Value, separator: char) -> Result<NamedTempFile> {
    let file = tempfile_for(name)?;
    Yedit::builder()
        .filename(file.path())
        .content(Content::Document(document))
        .separator(separator)
        .build()?
        .write()?;
    Ok(file)
}

fn close_tempfile(file: NamedTempFile) {
    let path = file.path().to_path_buf();
    if let Err(e) = file.close() {
        warn!(path = %path.display(), error = %e, "failed to remove temporary file");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::testing::{kubeconfig, ScriptedRunner};
    use crate::value::from_yaml;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::TempDir;

    fn strs(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_locate_binary_in() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing");
        assert_eq!(locate_binary_in("oc", &[missing.clone()]), PathBuf::from("oc"));

        fs::File::create(dir.path().join("oc")).unwrap().write_all(b"").unwrap();
        assert_eq!(
            locate_binary_in("oc", &[missing, dir.path().to_path_buf()]),
            dir.path().join("oc")
        );
    }

    #[test]
    fn test_kubeconfig_is_copied_and_exported() {
        let source = kubeconfig();
        let runner = ScriptedRunner::new().ok("");
        let cli = OpenShiftCli::new(Some("default".into()), source.path(), &runner).unwrap();

        assert_ne!(cli.kubeconfig_path(), source.path());
        assert_eq!(
            fs::read_to_string(cli.kubeconfig_path()).unwrap(),
            fs::read_to_string(source.path()).unwrap()
        );

        cli.version();
        let copy = cli.kubeconfig_path().to_path_buf();
        assert_eq!(runner.calls()[0].kubeconfig.as_deref(), Some(copy.to_str().unwrap()));

        drop(cli);
        assert!(!copy.exists());
    }

    #[test]
    fn test_missing_kubeconfig_is_error() {
        let runner = ScriptedRunner::new();
        let err = OpenShiftCli::new(None, "/nonexistent/kubeconfig", &runner).err().unwrap();
        assert!(matches!(err, CliError::Io { .. }));
    }

    #[test]
    fn test_namespace_arguments() {
        let source = kubeconfig();
        let runner = ScriptedRunner::new().ok("").ok("").ok("").ok("");

        let cli = OpenShiftCli::new(Some("web".into()), source.path(), &runner).unwrap();
        cli.openshift_cmd(["status"], false, OutputFormat::Discard, None);
        let cli = cli.all_namespaces(true);
        cli.openshift_cmd(["status"], true, OutputFormat::Discard, None);

        let cli = OpenShiftCli::new(Some("None".into()), source.path(), &runner).unwrap();
        cli.openshift_cmd(["status"], false, OutputFormat::Discard, None);
        let cli = OpenShiftCli::new(None, source.path(), &runner).unwrap();
        cli.openshift_cmd(["status"], false, OutputFormat::Discard, None);

        let calls = runner.calls();
        assert_eq!(calls[0].args, strs(&["status", "-n", "web"]));
        assert_eq!(calls[1].args, strs(&["adm", "status", "--all-namespaces"]));
        assert_eq!(calls[2].args, strs(&["status"]));
        assert_eq!(calls[3].args, strs(&["status"]));
    }

    #[test]
    fn test_json_output_parsed() {
        let source = kubeconfig();
        let runner = ScriptedRunner::new().ok(r#"{"kind": "Route", "metadata": {"name": "web"}}"#);
        let cli = OpenShiftCli::new(Some("web".into()), source.path(), &runner)
            .unwrap()
            .oc_binary("/usr/bin/oc");

        let result = cli.get("route", Some("web"), None);
        assert!(result.success());
        assert_eq!(
            result.results,
            from_yaml("- kind: Route\n  metadata: {name: web}\n").unwrap()
        );
        assert_eq!(result.cmd.as_deref(), Some("/usr/bin/oc get route web -o json -n web"));
        assert_eq!(result.err, None);
    }

    #[test]
    fn test_selector_takes_precedence_over_name() {
        let source = kubeconfig();
        let runner = ScriptedRunner::new().ok(r#"[]"#);
        let cli = OpenShiftCli::new(None, source.path(), &runner).unwrap();

        let result = cli.get("route", Some("web"), Some("app=web"));
        assert_eq!(result.results, Value::List(vec![]));
        assert_eq!(runner.calls()[0].args, strs(&["get", "route", "--selector=app=web", "-o", "json"]));
    }

    #[test]
    fn test_invalid_json_is_a_warning() {
        let source = kubeconfig();
        let runner = ScriptedRunner::new().ok("not json");
        let cli = OpenShiftCli::new(None, source.path(), &runner).unwrap();

        let result = cli.openshift_cmd(["get", "route"], false, OutputFormat::Json, None);
        assert_eq!(result.returncode, 0);
        assert!(result.err.is_some());
        assert_eq!(result.stdout.as_deref(), Some("not json"));
    }

    #[test]
    fn test_failure_is_captured() {
        let source = kubeconfig();
        let runner = ScriptedRunner::new().fail(1, "Error from server (NotFound)");
        let cli = OpenShiftCli::new(None, source.path(), &runner).unwrap();

        let result = cli.delete("route", "web", None);
        assert_eq!(result.returncode, 1);
        assert_eq!(result.results, Value::Map(Map::new()));
        assert_eq!(result.stderr(), "Error from server (NotFound)");
    }

    #[test]
    fn test_spawn_failure_becomes_result() {
        let source = kubeconfig();
        let runner = ScriptedRunner::new().spawn_error();
        let cli = OpenShiftCli::new(None, source.path(), &runner).unwrap();

        let result = cli.version();
        assert_eq!(result.returncode, 1);
        assert!(result.stderr().starts_with("failed to execute"), "{}", result.stderr());
    }

    #[test]
    fn test_create_from_content_writes_document() {
        let source = kubeconfig();
        let runner = ScriptedRunner::new().ok("");
        let cli = OpenShiftCli::new(None, source.path(), &runner).unwrap();
        let document = from_yaml("kind: Route\nmetadata: {name: web}\n").unwrap();

        let result = cli.create_from_content("web", &document).unwrap();
        assert!(result.success());

        let calls = runner.calls();
        assert_eq!(&calls[0].args[..2], &strs(&["create", "-f"])[..]);
        assert_eq!(calls[0].file.as_ref(), Some(&document));
        assert!(!FsPath::new(&calls[0].args[2]).exists());
    }

    #[test]
    fn test_replace_content_only_when_changed() {
        let source = kubeconfig();
        let observed = r#"{"kind": "Route", "metadata": {"name": "web"}, "spec": {"host": "a"}}"#;
        let runner = ScriptedRunner::new().ok(observed).ok(observed).ok("");
        let cli = OpenShiftCli::new(None, source.path(), &runner).unwrap();

        let same = from_yaml("spec: {host: a}\n").unwrap();
        let result = cli
            .replace_content("route", "web", same.as_map().unwrap(), false, '.')
            .unwrap();
        assert_eq!(result, ApiResult::not_updated());

        let different = from_yaml("spec: {host: b}\n").unwrap();
        let result = cli
            .replace_content("route", "web", different.as_map().unwrap(), true, '.')
            .unwrap();
        assert!(result.success());

        let calls = runner.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[2].args[0], "replace");
        assert_eq!(calls[2].args.last().map(String::as_str), Some("--force"));
        assert_eq!(
            calls[2].file.as_ref(),
            Some(&from_yaml("kind: Route\nmetadata: {name: web}\nspec: {host: b}\n").unwrap())
        );
    }

    #[test]
    fn test_replace_content_missing_object() {
        let source = kubeconfig();
        let runner = ScriptedRunner::new().fail(1, "routes \"web\" not found");
        let cli = OpenShiftCli::new(None, source.path(), &runner).unwrap();

        let result = cli.replace_content("route", "web", &Map::new(), false, '.').unwrap();
        assert_eq!(result.returncode, 1);
        assert_eq!(runner.calls().len(), 1);
    }

    #[test]
    fn test_process_template() {
        let source = kubeconfig();
        let processed = r#"{"kind": "List", "items": []}"#;
        let runner = ScriptedRunner::new().ok(processed).ok(processed).ok("");
        let cli = OpenShiftCli::new(None, source.path(), &runner).unwrap();

        let mut params = BTreeMap::new();
        params.insert("NAME".to_string(), "web".to_string());
        let result = cli.process("web-template", false, &params, None).unwrap();
        assert_eq!(result.results, value::from_json(processed).unwrap());

        cli.process("web-template", true, &BTreeMap::new(), Some("kind: Template\n"))
            .unwrap();

        let calls = runner.calls();
        assert_eq!(calls[0].args, strs(&["process", "web-template", "-v", "NAME=web"]));
        assert_eq!(calls[1].args, strs(&["process", "-f", "-"]));
        assert_eq!(calls[1].input.as_deref(), Some("kind: Template\n"));
        assert_eq!(calls[2].file.as_ref(), Some(&value::from_json(processed).unwrap()));
    }
}
