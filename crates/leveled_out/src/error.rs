//! Error types for registry configuration and output.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::flags::Target;
use crate::level::Level;

/// Errors returned by [`Registry`](crate::Registry) operations.
#[derive(Error, Debug)]
pub enum OutError {
    /// A concrete level was required but `All` or `Discard` was given, or a
    /// threshold was set to `All`.
    #[error("invalid level {0} for this operation")]
    InvalidLevel(Level),

    /// A single target (or at least one target) was required.
    #[error("invalid output target {0:?}")]
    InvalidTarget(Target),

    /// Zero is reserved as the "unset" error code.
    #[error("invalid default error code {0}: zero means unset")]
    InvalidCode(i32),

    /// Writing to a target failed. `exit` is the exit code of a
    /// terminating call, which still has to terminate.
    #[error("{level} output to {} failed: {source}", target.name())]
    Write {
        level: Level,
        target: Target,
        exit: Option<i32>,
        #[source]
        source: io::Error,
    },

    /// A log file could not be opened, created or rotated.
    #[error("log file {}: {source}", path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// JSON input could not be parsed for pretty printing.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized [`Result`] type for this crate.
pub type Result<T> = std::result::Result<T, OutError>;

impl OutError {
    /// Builds a [`OutError::LogFile`] for `path`.
    pub(crate) fn log_file(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::LogFile {
            path: path.into(),
            source,
        }
    }

    /// Exit code of the terminating call whose write failed.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Write { exit, .. } => *exit,
            _ => None,
        }
    }

    /// Attaches the exit code of a terminating call to a write failure.
    pub(crate) fn with_exit(mut self, code: Option<i32>) -> Self {
        if let Self::Write { exit, .. } = &mut self {
            *exit = code;
        }
        self
    }

    /// True for configuration mistakes, as opposed to I/O failures.
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::InvalidLevel(_) | Self::InvalidTarget(_) | Self::InvalidCode(_)
        )
    }
}
