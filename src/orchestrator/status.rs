//! Read-only status report

use colored::Colorize;
use std::path::PathBuf;

use super::Orchestrator;
use crate::error::Result;
use crate::network::NetworkConfigMutator;
use crate::service::{InitVariant, ServiceStatus};
use crate::system::{BackupRecord, InstallationState};

/// Snapshot of the installation on this host
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub state: InstallationState,
    pub variant: InitVariant,
    pub executable: PathBuf,
    pub service: ServiceStatus,
    pub backups: Vec<BackupRecord>,
    pub directive_present: bool,
}

impl StatusReport {
    pub fn print(&self) {
        println!("{}", "Resilient DNS status".bold());
        let state = match self.state {
            InstallationState::Installed => self.state.to_string().green(),
            InstallationState::NotInstalled => self.state.to_string().yellow(),
        };
        println!("  Installation:  {state} ({})", self.executable.display());
        println!("  Init system:   {}", self.variant);
        let service = match &self.service {
            ServiceStatus::Running => self.service.to_string().green(),
            ServiceStatus::Failed(_) => self.service.to_string().red(),
            _ => self.service.to_string().yellow(),
        };
        println!("  Service:       {service}");
        for record in &self.backups {
            let marker = if record.exists() { "✅" } else { "➖" };
            println!(
                "  Backup:        {marker} {} -> {}",
                record.source.display(),
                record.backup.display()
            );
        }
        println!(
            "  DHCP directive: {}",
            if self.directive_present { "present" } else { "absent" }
        );
    }
}

impl Orchestrator<'_> {
    /// Collect the current state without changing anything
    pub fn status(&self) -> Result<StatusReport> {
        let config = self.config;
        let probe = self.probe();
        Ok(StatusReport {
            state: probe.state(),
            variant: self.variant,
            executable: probe.executable().to_path_buf(),
            service: self.supervisor().status()?,
            backups: vec![
                BackupRecord::new(&config.resolv_conf, config.resolv_backup_path()),
                BackupRecord::new(&config.dhclient_conf, config.dhclient_backup_path()),
            ],
            directive_present: NetworkConfigMutator::new(config).has_persistence_directive(),
        })
    }
}
