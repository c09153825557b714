//! Runtime dependency provisioning
//!
//! Installs the interpreter through the host package manager and the
//! proxy's libraries through pip. Nothing here aborts an installation:
//! failures are collected and reported as [`ProvisionOutcome::PartiallyFailed`].

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::runner::{CommandRunner, command_line};
use crate::config::DeployConfig;

/// pip marker for PEP 668 managed interpreters
const EXTERNALLY_MANAGED: &str = "externally-managed-environment";

/// Packages the proxy needs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequirementsManifest {
    pub system_packages: Vec<String>,
    pub python_packages: Vec<String>,
}

impl RequirementsManifest {
    /// Manifest from configuration, extended by a `requirements.txt`
    /// sitting next to the artifact source
    pub fn from_config(config: &DeployConfig, artifact_source: &Path) -> Self {
        let mut manifest = Self {
            system_packages: config.system_packages.clone(),
            python_packages: config.python_packages.clone(),
        };

        if let Some(dir) = artifact_source.parent() {
            let requirements = dir.join("requirements.txt");
            if let Ok(content) = fs::read_to_string(&requirements) {
                debug!(path = %requirements.display(), "reading requirements file");
                for package in parse_requirements(&content) {
                    if !manifest.python_packages.contains(&package) {
                        manifest.python_packages.push(package);
                    }
                }
            }
        }

        manifest
    }
}

/// Non-comment, non-option lines of a pip requirements file
fn parse_requirements(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter(|line| !line.is_empty() && !line.starts_with('-'))
        .map(str::to_string)
        .collect()
}

/// Outcome of [`DependencyProvisioner::ensure`]
#[derive(Debug, Clone, PartialEq)]
pub enum ProvisionOutcome {
    Satisfied,
    PartiallyFailed(String),
}

/// Supported system package managers, in detection order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Apt,
    Dnf,
    Yum,
    Pacman,
    Apk,
    Zypper,
}

impl PackageManager {
    const ALL: [PackageManager; 6] = [
        Self::Apt,
        Self::Dnf,
        Self::Yum,
        Self::Pacman,
        Self::Apk,
        Self::Zypper,
    ];

    /// First package manager found on PATH
    pub fn detect(runner: &dyn CommandRunner) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|pm| runner.command_exists(pm.program()))
    }

    pub fn program(&self) -> &'static str {
        match self {
            Self::Apt => "apt-get",
            Self::Dnf => "dnf",
            Self::Yum => "yum",
            Self::Pacman => "pacman",
            Self::Apk => "apk",
            Self::Zypper => "zypper",
        }
    }

    /// Index refresh to run before installing, if the manager needs one
    fn refresh_args(&self) -> Option<&'static [&'static str]> {
        match self {
            Self::Apt => Some(&["update"]),
            _ => None,
        }
    }

    fn install_args(&self) -> &'static [&'static str] {
        match self {
            Self::Apt | Self::Dnf | Self::Yum => &["install", "-y"],
            Self::Pacman => &["-S", "--noconfirm", "--needed"],
            Self::Apk => &["add"],
            Self::Zypper => &["--non-interactive", "install"],
        }
    }
}

/// Installs the manifest through the host's tools
pub struct DependencyProvisioner<'a> {
    runner: &'a dyn CommandRunner,
    interpreter: PathBuf,
}

impl<'a> DependencyProvisioner<'a> {
    pub fn new(runner: &'a dyn CommandRunner, interpreter: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            interpreter: interpreter.into(),
        }
    }

    /// Install everything in `manifest`, collecting failures instead of
    /// stopping at the first one
    pub fn ensure(&self, manifest: &RequirementsManifest) -> ProvisionOutcome {
        let mut failures = Vec::new();

        if let Err(detail) = self.install_system_packages(&manifest.system_packages) {
            warn!(%detail, "system package installation failed");
            failures.push(detail);
        }
        if let Err(detail) = self.install_python_packages(&manifest.python_packages) {
            warn!(%detail, "python package installation failed");
            failures.push(detail);
        }

        if failures.is_empty() {
            info!("runtime dependencies satisfied");
            ProvisionOutcome::Satisfied
        } else {
            ProvisionOutcome::PartiallyFailed(failures.join("; "))
        }
    }

    fn install_system_packages(&self, packages: &[String]) -> Result<(), String> {
        if packages.is_empty() {
            return Ok(());
        }

        let Some(manager) = PackageManager::detect(self.runner) else {
            return Err("no supported system package manager found".to_string());
        };
        println!(
            "🔄 Installing system packages with {}: {}",
            manager.program(),
            packages.join(", ")
        );

        if let Some(refresh) = manager.refresh_args() {
            // A stale index only matters if the install below fails
            if let Err(e) = self.runner.run_checked(manager.program(), refresh) {
                warn!(error = %e, "package index refresh failed");
            }
        }

        let mut args: Vec<&str> = manager.install_args().to_vec();
        args.extend(packages.iter().map(String::as_str));
        self.runner
            .run_checked(manager.program(), &args)
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    fn install_python_packages(&self, packages: &[String]) -> Result<(), String> {
        if packages.is_empty() {
            return Ok(());
        }
        println!("🔄 Installing Python packages: {}", packages.join(", "));

        let interpreter = self.interpreter.to_string_lossy();
        let mut args = vec!["-m", "pip", "install"];
        args.extend(packages.iter().map(String::as_str));

        let mut last_error = match self.runner.run(&interpreter, &args) {
            Ok(output) if output.success => return Ok(()),
            Ok(output) => {
                if output.combined().contains(EXTERNALLY_MANAGED) {
                    info!("pip reports an externally managed environment, retrying with override");
                    let mut override_args = args.clone();
                    override_args.insert(3, "--break-system-packages");
                    match self.runner.run(&interpreter, &override_args) {
                        Ok(retry) if retry.success => return Ok(()),
                        Ok(retry) => format!(
                            "{}: {}",
                            command_line(&interpreter, &override_args),
                            retry.failure_message()
                        ),
                        Err(e) => e.to_string(),
                    }
                } else {
                    format!(
                        "{}: {}",
                        command_line(&interpreter, &args),
                        output.failure_message()
                    )
                }
            }
            Err(e) => e.to_string(),
        };

        if self.runner.command_exists("pip3") {
            let mut plain = vec!["install"];
            plain.extend(packages.iter().map(String::as_str));
            match self.runner.run_checked("pip3", &plain) {
                Ok(_) => return Ok(()),
                Err(e) => last_error = e.to_string(),
            }
        }

        Err(last_error)
    }
}
