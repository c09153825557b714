//! Service supervision over systemd or SysVInit
//!
//! Both init systems sit behind [`ServiceSupervisor`]. The variant is
//! detected once per run with [`detect_init_variant`]; callers never branch
//! on it afterwards.
//!
//! Per service the lifecycle is `Absent -> Defined -> Enabled -> Running`:
//! `write_artifact` defines, `register` enables, `start` runs, `stop`
//! returns to enabled, `disable` returns to defined and `remove` goes back
//! to absent from any state. `install` is `write_artifact` followed by
//! `register` and always rewrites the artifact.

mod systemd;
mod sysvinit;

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::DeployConfig;
use crate::error::Result;
use crate::system::CommandRunner;

pub use systemd::SystemdSupervisor;
pub use sysvinit::SysVInitSupervisor;

/// Init system flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitVariant {
    Systemd,
    SysVInit,
}

impl fmt::Display for InitVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Systemd => write!(f, "systemd"),
            Self::SysVInit => write!(f, "SysVInit"),
        }
    }
}

/// Systemd iff its runtime directory exists
pub fn detect_init_variant(systemd_runtime_dir: &Path) -> InitVariant {
    if systemd_runtime_dir.is_dir() {
        InitVariant::Systemd
    } else {
        InitVariant::SysVInit
    }
}

/// Restart policy of the supervised process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartPolicy {
    Always,
}

impl RestartPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Always => "always",
        }
    }
}

/// Logical description of the supervised process
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDefinition {
    pub name: String,
    pub description: String,
    pub executable: PathBuf,
    pub interpreter: PathBuf,
    pub working_dir: PathBuf,
    pub restart: RestartPolicy,
    pub user: String,
    pub pid_file: PathBuf,
    pub log_file: PathBuf,
    pub variant: InitVariant,
}

impl ServiceDefinition {
    pub fn from_config(config: &DeployConfig, variant: InitVariant) -> Self {
        Self {
            name: config.service_name.clone(),
            description: config.description.clone(),
            executable: config.binary_path(),
            interpreter: config.interpreter.clone(),
            working_dir: config.data_dir.clone(),
            restart: RestartPolicy::Always,
            user: "root".to_string(),
            pid_file: config.pid_file.clone(),
            log_file: config.log_file.clone(),
            variant,
        }
    }
}

/// Service status
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceStatus {
    /// Service is running
    Running,
    /// Service is defined but not running
    Stopped,
    /// Status could not be determined
    Unknown,
    /// No service artifact exists
    NotFound,
    /// Init system reports a failure
    Failed(String),
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
            Self::Unknown => write!(f, "unknown"),
            Self::NotFound => write!(f, "not installed"),
            Self::Failed(reason) => write!(f, "failed ({reason})"),
        }
    }
}

/// Uniform contract over init systems
pub trait ServiceSupervisor {
    fn variant(&self) -> InitVariant;

    /// Path of the unit file or init script
    fn artifact_path(&self) -> &Path;

    /// Render and write the unit file or init script
    fn write_artifact(&self, definition: &ServiceDefinition) -> Result<()>;

    /// Register the written artifact with the init system for boot
    fn register(&self) -> Result<()>;

    /// Write the artifact and register it with the init system
    fn install(&self, definition: &ServiceDefinition) -> Result<()> {
        self.write_artifact(definition)?;
        self.register()
    }

    fn start(&self) -> Result<()>;

    fn stop(&self) -> Result<()>;

    fn restart(&self) -> Result<()>;

    /// Deregister from boot; the artifact stays
    fn disable(&self) -> Result<()>;

    /// Deregister and delete the artifact; succeeds when already absent
    fn remove(&self) -> Result<()>;

    fn status(&self) -> Result<ServiceStatus>;

    fn is_defined(&self) -> bool {
        self.artifact_path().is_file()
    }

    /// Commands an operator can use to inspect the service
    fn inspection_hints(&self) -> Vec<String>;
}

/// Build the supervisor for `variant`
pub fn supervisor_for<'a>(
    variant: InitVariant,
    config: &DeployConfig,
    runner: &'a dyn CommandRunner,
) -> Box<dyn ServiceSupervisor + 'a> {
    match variant {
        InitVariant::Systemd => Box::new(SystemdSupervisor::new(
            &config.service_name,
            config.systemd_unit_path(),
            runner,
        )),
        InitVariant::SysVInit => Box::new(SysVInitSupervisor::new(
            &config.service_name,
            config.init_script_path(),
            config.log_file.clone(),
            runner,
        )),
    }
}
