//! Errors raised while driving the cluster CLI.
//!
//! A command that runs and exits non-zero is not an error: it is reported
//! through [`ApiResult`](super::ApiResult). These variants cover the cases
//! where no result can be produced at all.

use std::path::PathBuf;
use thiserror::Error;

use crate::document::YeditError;

/// Errors that can occur around an external command invocation.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to execute {command}: {source}")]
    ExternalCommand {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Query(String),

    #[error(transparent)]
    Document(#[from] YeditError),
}

impl CliError {
    /// Creates an error for a command that could not be spawned.
    pub fn external_command(command: impl Into<String>, source: std::io::Error) -> Self {
        CliError::ExternalCommand {
            command: command.into(),
            source,
        }
    }

    /// Creates an I/O error bound to a file.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CliError::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an error for a lookup whose answer could not be obtained.
    pub fn query(message: impl Into<String>) -> Self {
        CliError::Query(message.into())
    }
}

/// Result type for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;
