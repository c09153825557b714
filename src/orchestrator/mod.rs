//! Install, reinstall and uninstall flows
//!
//! [`Orchestrator`] sequences the system components. The init variant is
//! detected once when it is created; every other decision is derived from
//! the filesystem at the moment it is needed.

mod install;
mod status;
mod uninstall;

use std::path::PathBuf;
use tracing::debug;

use crate::config::DeployConfig;
use crate::error::{Error, Result};
use crate::prompt::Prompter;
use crate::service::{InitVariant, ServiceSupervisor, detect_init_variant, supervisor_for};
use crate::system::{CommandRunner, InstallationState, StateProbe};

pub use install::InstallReport;
pub use status::StatusReport;
pub use uninstall::{UninstallOutcome, UninstallReport};

/// Drives the lifecycle flows against one host
pub struct Orchestrator<'a> {
    config: &'a DeployConfig,
    runner: &'a dyn CommandRunner,
    prompter: &'a dyn Prompter,
    variant: InitVariant,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        config: &'a DeployConfig,
        runner: &'a dyn CommandRunner,
        prompter: &'a dyn Prompter,
    ) -> Self {
        let variant = detect_init_variant(&config.systemd_runtime_dir);
        debug!(%variant, "init system detected");
        Self {
            config,
            runner,
            prompter,
            variant,
        }
    }

    pub fn config(&self) -> &DeployConfig {
        self.config
    }

    pub fn variant(&self) -> InitVariant {
        self.variant
    }

    pub fn probe(&self) -> StateProbe {
        StateProbe::new(self.config.binary_path())
    }

    pub fn state(&self) -> InstallationState {
        self.probe().state()
    }

    fn supervisor(&self) -> Box<dyn ServiceSupervisor + 'a> {
        supervisor_for(self.variant, self.config, self.runner)
    }

    /// First existing artifact source
    fn locate_artifact(&self) -> Result<PathBuf> {
        let candidates = self.config.artifact_candidates();
        if let Some(found) = candidates.iter().find(|path| path.is_file()) {
            return Ok(found.clone());
        }

        let path = candidates
            .into_iter()
            .next()
            .unwrap_or_else(|| PathBuf::from(&self.config.artifact_name));
        Err(Error::ArtifactMissing { path })
    }
}
