//! Installation state probe

use std::fmt;
use std::path::{Path, PathBuf};

/// Installation state, always derived from the filesystem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallationState {
    Installed,
    NotInstalled,
}

impl fmt::Display for InstallationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Installed => write!(f, "installed"),
            Self::NotInstalled => write!(f, "not installed"),
        }
    }
}

/// Answers "is the service installed?" by looking for the deployed
/// executable. Nothing is cached between calls.
pub struct StateProbe {
    executable: PathBuf,
}

impl StateProbe {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn is_installed(&self) -> bool {
        self.executable.is_file()
    }

    pub fn state(&self) -> InstallationState {
        if self.is_installed() {
            InstallationState::Installed
        } else {
            InstallationState::NotInstalled
        }
    }
}
