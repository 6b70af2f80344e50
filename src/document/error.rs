//! Document editing errors.

use crate::fieldpath::PathError;
use std::path::PathBuf;
use thiserror::Error;

use super::ContentType;

/// YeditError represents a failure while editing or persisting a document.
#[derive(Debug, Error)]
pub enum YeditError {
    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("{path}: type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("problem loading {format} document: {message}")]
    DocumentParse { format: ContentType, message: String },

    #[error("no filename configured for write")]
    MissingFilename,

    #[error("{message}")]
    InvalidValue { message: String },

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl YeditError {
    /// Creates an invalid path error.
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        YeditError::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a type mismatch error.
    pub fn type_mismatch(
        path: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        YeditError::TypeMismatch {
            path: path.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Creates a document parse error.
    pub fn document_parse(format: ContentType, message: impl Into<String>) -> Self {
        YeditError::DocumentParse {
            format,
            message: message.into(),
        }
    }

    /// Creates an invalid value error.
    pub fn invalid_value(message: impl Into<String>) -> Self {
        YeditError::InvalidValue {
            message: message.into(),
        }
    }

    /// Creates an I/O error bound to a file.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        YeditError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<PathError> for YeditError {
    fn from(err: PathError) -> Self {
        let path = match &err {
            PathError::InvalidSeparator(_) => String::new(),
            PathError::UnexpectedChar { key, .. }
            | PathError::EmptySegment { key, .. }
            | PathError::MalformedIndex { key, .. }
            | PathError::DanglingEscape { key, .. } => key.clone(),
        };
        YeditError::invalid_path(path, err.to_string())
    }
}

/// Result type for document operations.
pub type Result<T> = std::result::Result<T, YeditError>;
