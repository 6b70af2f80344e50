//! Blocking execution of external commands.

use std::io::{self, Write};
use std::process::{Command, Stdio};
use std::thread;

use super::error::{CliError, Result};

/// Exit status and captured output of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn new(code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        CommandOutput {
            code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// Condenses the captured streams into a single diagnostic line.
    pub fn failure_summary(&self) -> String {
        let stderr = self.stderr.trim();
        let stdout = self.stdout.trim();
        match (stderr.is_empty(), stdout.is_empty()) {
            (true, true) => format!("command failed with exit code {}", self.code),
            (true, false) => stdout.to_string(),
            (false, true) => stderr.to_string(),
            (false, false) => format!("{}\n{}", stderr, stdout),
        }
    }
}

/// CommandRunner runs an argument list to completion.
///
/// `args[0]` is the program. `input` is fed to stdin, `env` is added on top
/// of the inherited environment. Only a failure to spawn is an `Err`; a
/// non-zero exit is a regular [`CommandOutput`].
pub trait CommandRunner {
    fn run(&self, args: &[String], input: Option<&[u8]>, env: &[(String, String)]) -> Result<CommandOutput>;
}

/// ProcessRunner spawns real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, args: &[String], input: Option<&[u8]>, env: &[(String, String)]) -> Result<CommandOutput> {
        let command_line = args.join(" ");
        let (program, rest) = args.split_first().ok_or_else(|| {
            CliError::external_command(
                command_line.clone(),
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
            )
        })?;

        let mut child = Command::new(program)
            .args(rest)
            .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(if input.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CliError::external_command(command_line.clone(), e))?;

        // stdin is fed from its own thread so a child that writes before it
        // reads cannot block on a full pipe.
        let stdin = child.stdin.take();
        let (written, output) = thread::scope(|scope| {
            let writer = scope.spawn(move || match (input, stdin) {
                (Some(data), Some(mut stdin)) => stdin.write_all(data),
                _ => Ok(()),
            });
            let output = child.wait_with_output();
            let written = writer
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("stdin writer panicked")));
            (written, output)
        });

        let output = output.map_err(|e| CliError::external_command(command_line.clone(), e))?;
        match written {
            Err(e) if e.kind() != io::ErrorKind::BrokenPipe => {
                return Err(CliError::external_command(command_line, e));
            }
            _ => {}
        }

        Ok(CommandOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
