//! Unified error model
//!
//! Top-level error type for the deploy library. Precondition failures are
//! kept as dedicated variants so the binary can abort before any system
//! file is touched.

use std::path::PathBuf;
use thiserror::Error;

/// Deploy library error enum
#[derive(Debug, Error)]
pub enum Error {
    // ========== Preconditions ==========
    /// Process is not running with an effective uid of 0
    #[error("administrative privileges required (effective uid {euid}); re-run with sudo")]
    PermissionDenied { euid: u32 },

    /// The proxy artifact to deploy could not be found
    #[error("install artifact not found: {}", path.display())]
    ArtifactMissing { path: PathBuf },

    // ========== Filesystem ==========
    /// I/O failure on a specific path
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Atomic rename of a staged file failed
    #[error("failed to persist {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: tempfile::PersistError,
    },

    // ========== External commands ==========
    /// A command could not be spawned or exited non-zero
    #[error("command `{command}` failed: {message}")]
    Command { command: String, message: String },

    // ========== Configuration ==========
    /// Configuration file could not be parsed
    #[error("configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    // ========== Interaction ==========
    /// Terminal prompt failed (closed stdin, interrupted)
    #[error("prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),
}

/// Crate-wide result type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a command failure
    pub fn command(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Command {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Create a configuration validation failure
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Whether this error is a fatal precondition that must stop the run
    /// before any mutation
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied { .. } | Self::ArtifactMissing { .. }
        )
    }
}
