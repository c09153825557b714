//! Install and reinstall flow

use colored::Colorize;
use std::path::PathBuf;
use tracing::{info, warn};

use super::Orchestrator;
use crate::error::{Error, Result};
use crate::network::{DirectiveOutcome, NetworkConfigMutator};
use crate::service::{InitVariant, ServiceDefinition};
use crate::system::files;
use crate::system::{
    BackupOutcome, ConfigBackupStore, DependencyProvisioner, ProvisionOutcome,
    RequirementsManifest,
};

const PRIVATE_DIR_MODE: u32 = 0o700;
const EXECUTABLE_MODE: u32 = 0o755;

/// What an install run did
#[derive(Debug, Clone, PartialEq)]
pub struct InstallReport {
    /// The service was already installed when the run started
    pub reinstall: bool,
    pub variant: InitVariant,
    pub artifact_source: PathBuf,
    pub executable: PathBuf,
    pub resolv_backup: BackupOutcome,
    pub dhclient_backup: BackupOutcome,
    pub dependencies: ProvisionOutcome,
    pub directive: DirectiveOutcome,
    pub service_artifact: PathBuf,
    pub service_started: bool,
    /// Steps that failed without aborting the run
    pub warnings: Vec<String>,
    pub hints: Vec<String>,
}

impl InstallReport {
    pub fn print(&self) {
        let title = if self.reinstall {
            "Reinstallation complete"
        } else {
            "Installation complete"
        };
        println!();
        println!("{}", format!("🎉 {title}").bright_green().bold());
        println!("  Executable: {}", self.executable.display());
        println!(
            "  Service ({}): {}",
            self.variant,
            self.service_artifact.display()
        );
        if !self.service_started {
            println!("  {}", "Service is not running yet".yellow());
        }
        if let ProvisionOutcome::PartiallyFailed(detail) = &self.dependencies {
            println!("  {} {detail}", "Dependencies incomplete:".yellow());
        }
        for warning in &self.warnings {
            println!("  {} {warning}", "Warning:".yellow());
        }
        for hint in &self.hints {
            println!("  {hint}");
        }
    }
}

impl Orchestrator<'_> {
    /// Install the proxy, or refresh an existing installation
    pub fn install(&self) -> Result<InstallReport> {
        let config = self.config;
        let reinstall = self.probe().is_installed();

        // Nothing may be touched when there is nothing to deploy
        let artifact_source = self.locate_artifact()?;
        info!(source = %artifact_source.display(), reinstall, "starting installation");
        println!("🔍 Artifact source: {}", artifact_source.display());

        files::create_dir_with_mode(&config.data_dir, PRIVATE_DIR_MODE)?;
        let backups = ConfigBackupStore::new(config.backup_dir());
        backups.ensure_dir()?;
        println!("✅ Data directory ready: {}", config.data_dir.display());

        let resolv_backup =
            backups.backup_if_absent(&config.resolv_conf, &config.resolv_backup_path())?;
        print_backup("resolver", &config.resolv_conf, resolv_backup);
        let dhclient_backup =
            backups.backup_if_absent(&config.dhclient_conf, &config.dhclient_backup_path())?;
        print_backup("DHCP client", &config.dhclient_conf, dhclient_backup);

        let manifest = RequirementsManifest::from_config(config, &artifact_source);
        let dependencies =
            DependencyProvisioner::new(self.runner, &config.interpreter).ensure(&manifest);
        match &dependencies {
            ProvisionOutcome::Satisfied => println!("✅ Runtime dependencies satisfied"),
            ProvisionOutcome::PartiallyFailed(detail) => {
                println!("⚠️  Some dependencies could not be installed: {detail}");
            }
        }

        let executable = config.binary_path();
        std::fs::create_dir_all(&config.install_dir)
            .map_err(|e| Error::io(&config.install_dir, e))?;
        files::copy_atomic(&artifact_source, &executable, Some(EXECUTABLE_MODE))?;
        println!("✅ Proxy deployed to {}", executable.display());

        let network = NetworkConfigMutator::new(config);
        network.point_resolver_to_local_proxy()?;
        println!(
            "✅ {} now points to {}",
            config.resolv_conf.display(),
            config.local_nameserver
        );
        let directive = network.add_persistence_directive()?;
        match directive {
            DirectiveOutcome::Added => {
                println!("✅ DHCP directive added to {}", config.dhclient_conf.display())
            }
            DirectiveOutcome::AlreadyPresent => println!("ℹ️  DHCP directive already present"),
            DirectiveOutcome::Skipped => println!(
                "ℹ️  {} not found, DHCP persistence skipped",
                config.dhcp_dir().display()
            ),
        }

        let mut warnings = Vec::new();
        let supervisor = self.supervisor();
        // Only a failed artifact write is fatal; DNS already points at the
        // proxy, so it must still get its start attempt
        supervisor.write_artifact(&ServiceDefinition::from_config(config, self.variant))?;
        if let Err(e) = supervisor.register() {
            warn!(error = %e, "registering the service with the init system failed");
            println!("⚠️  Service '{}' not registered for boot: {e}", config.service_name);
            warnings.push(format!("boot registration failed: {e}"));
        }

        let started = if reinstall {
            supervisor.restart()
        } else {
            supervisor.start()
        };
        let service_started = match started {
            Ok(()) => {
                println!("✅ Service '{}' started", config.service_name);
                true
            }
            Err(e) => {
                warn!(error = %e, "service did not start");
                println!("⚠️  Service '{}' failed to start: {e}", config.service_name);
                warnings.push(format!("service did not start: {e}"));
                false
            }
        };

        info!(service = %config.service_name, "installation finished");
        Ok(InstallReport {
            reinstall,
            variant: self.variant,
            artifact_source,
            executable,
            resolv_backup,
            dhclient_backup,
            dependencies,
            directive,
            service_artifact: supervisor.artifact_path().to_path_buf(),
            service_started,
            warnings,
            hints: supervisor.inspection_hints(),
        })
    }
}

fn print_backup(label: &str, source: &std::path::Path, outcome: BackupOutcome) {
    match outcome {
        BackupOutcome::Created => println!("✅ Backed up {label} config {}", source.display()),
        BackupOutcome::AlreadyExists => {
            println!("ℹ️  Existing {label} backup kept")
        }
        BackupOutcome::SourceMissing => {
            println!("ℹ️  No {label} config at {}, nothing to back up", source.display())
        }
    }
}
