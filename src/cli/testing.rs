//! Scripted command runner for driving `oc` interactions in tests.

use std::cell::{Ref, RefCell};
use std::collections::VecDeque;
use std::fs;
use std::io::Write;

use tempfile::NamedTempFile;

use super::error::{CliError, Result};
use super::executor::{CommandOutput, CommandRunner};
use crate::value::{from_yaml, Value};

/// One recorded invocation.
#[derive(Debug, Clone)]
pub struct Call {
    /// Arguments after the program name.
    pub args: Vec<String>,
    pub input: Option<String>,
    /// Parsed contents of the `-f <file>` argument at call time.
    pub file: Option<Value>,
    pub kubeconfig: Option<String>,
}

/// ScriptedRunner answers calls from a queue of canned responses, in order.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    responses: RefCell<VecDeque<Option<CommandOutput>>>,
    calls: RefCell<Vec<Call>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        ScriptedRunner::default()
    }

    /// Queues a successful exit with `stdout`.
    pub fn ok(self, stdout: &str) -> Self {
        self.respond(CommandOutput::new(0, stdout, ""))
    }

    /// Queues a failing exit with `stderr`.
    pub fn fail(self, code: i32, stderr: &str) -> Self {
        self.respond(CommandOutput::new(code, "", stderr))
    }

    pub fn respond(self, output: CommandOutput) -> Self {
        self.responses.borrow_mut().push_back(Some(output));
        self
    }

    /// Queues a failure to spawn the process.
    pub fn spawn_error(self) -> Self {
        self.responses.borrow_mut().push_back(None);
        self
    }

    pub fn calls(&self) -> Ref<'_, Vec<Call>> {
        self.calls.borrow()
    }

    /// Returns the argument lists of every call so far.
    pub fn commands(&self) -> Vec<Vec<String>> {
        self.calls.borrow().iter().map(|c| c.args.clone()).collect()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, args: &[String], input: Option<&[u8]>, env: &[(String, String)]) -> Result<CommandOutput> {
        let file = args
            .iter()
            .position(|a| a == "-f")
            .and_then(|i| args.get(i + 1))
            .filter(|f| f.as_str() != "-")
            .map(|f| from_yaml(&fs::read_to_string(f).unwrap()).unwrap());

        self.calls.borrow_mut().push(Call {
            args: args[1..].to_vec(),
            input: input.map(|i| String::from_utf8_lossy(i).into_owned()),
            file,
            kubeconfig: env
                .iter()
                .find(|(k, _)| k == "KUBECONFIG")
                .map(|(_, v)| v.clone()),
        });

        match self.responses.borrow_mut().pop_front() {
            Some(Some(output)) => Ok(output),
            Some(None) => Err(CliError::external_command(
                args.join(" "),
                std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory"),
            )),
            None => panic!("unexpected command: {}", args.join(" ")),
        }
    }
}

/// Creates a throwaway kubeconfig file.
pub fn kubeconfig() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"apiVersion: v1\nkind: Config\nclusters: []\n").unwrap();
    file
}
