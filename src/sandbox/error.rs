use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable classification of a [`SandboxError`], serialised into tool results
/// so callers can tell a rejected request from a failed tool run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Precondition,
    Execution,
    TimedOut,
    NotFound,
    Directory,
    Transfer,
    Io,
}

#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("sandbox not specified")]
    NotSpecified,

    #[error("command not permitted")]
    CommandNotPermitted,

    #[error("sandbox does not exist")]
    DoesNotExist(PathBuf),

    #[error("path escapes sandbox: {0}")]
    PathEscape(String),

    #[error("invalid object url: {0}")]
    InvalidObjectUrl(String),

    /// The tool ran and exited non-zero. `stderr` is the captured error text.
    #[error("command exited with status {status}")]
    Execution { status: i32, stderr: String },

    #[error("command timed out after {0:?}")]
    TimedOut(Duration),

    #[error("failed to create sandbox directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("file not found: {0}")]
    NotFound(PathBuf),

    #[error("transfer failed: {0}")]
    Transfer(String),

    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to spawn command: {0}")]
    Spawn(#[source] std::io::Error),
}

impl SandboxError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotSpecified
            | Self::CommandNotPermitted
            | Self::DoesNotExist(_)
            | Self::PathEscape(_)
            | Self::InvalidObjectUrl(_) => ErrorKind::Precondition,
            Self::Execution { .. } | Self::Spawn(_) => ErrorKind::Execution,
            Self::TimedOut(_) => ErrorKind::TimedOut,
            Self::Directory { .. } => ErrorKind::Directory,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Transfer(_) => ErrorKind::Transfer,
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    /// Text surfaced to the caller. For a failed tool run this is exactly the
    /// captured standard error.
    pub fn caller_message(&self) -> String {
        match self {
            Self::Execution { stderr, .. } => stderr.clone(),
            other => other.to_string(),
        }
    }

    /// Map a read/remove failure, turning `NotFound` into its own variant.
    pub(crate) fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(path)
        } else {
            Self::Io { path, source }
        }
    }
}

impl From<reqwest::Error> for SandboxError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transfer(e.to_string())
    }
}
