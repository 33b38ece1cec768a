//! Error types for the buildpack
//!
//! All modules use `CondaEnvResult<T>` as their return type. Every error is
//! fatal to the phase that raised it; nothing here is retried.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for buildpack operations
pub type CondaEnvResult<T> = Result<T, CondaEnvError>;

/// All errors that can occur during detect or build
#[derive(Error, Debug)]
pub enum CondaEnvError {
    // Filesystem errors
    #[error("failed trying to stat {}: {source}", path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Process errors
    #[error("failed to launch {command}: {source}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to run conda command: {reason}: {output}")]
    CondaCommand { reason: String, output: String },

    // Lifecycle file errors
    #[error("invalid layer metadata at {}: {reason}", path.display())]
    LayerInvalid { path: PathBuf, reason: String },

    #[error("invalid buildpack plan at {}: {reason}", path.display())]
    PlanInvalid { path: PathBuf, reason: String },

    #[error("invalid buildpack descriptor at {}: {reason}", path.display())]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl CondaEnvError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a stat error for a path
    pub fn stat(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Stat {
            path: path.into(),
            source,
        }
    }

    /// Create a command failed error (process could not be spawned or awaited)
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a conda command error from an exit reason and captured output
    pub fn conda_command(reason: impl Into<String>, output: impl Into<String>) -> Self {
        Self::CondaCommand {
            reason: reason.into(),
            output: output.into(),
        }
    }
}
