//! Uninstall flow

use colored::Colorize;
use tracing::{info, warn};

use super::Orchestrator;
use crate::error::Result;
use crate::network::{DhcpRestore, NetworkConfigMutator, ResolverRestore, refresh_network_stack};
use crate::system::ConfigBackupStore;
use crate::system::files;

/// What an uninstall run did
#[derive(Debug, Clone, PartialEq)]
pub struct UninstallReport {
    pub resolver: ResolverRestore,
    pub dhcp: DhcpRestore,
    pub data_purged: bool,
    /// Command that refreshed networking, if any succeeded
    pub network_refresh: Option<String>,
    /// Non-fatal failures encountered on the way
    pub warnings: Vec<String>,
}

impl UninstallReport {
    pub fn print(&self) {
        println!();
        println!("{}", "🧹 Uninstallation complete".bright_green().bold());
        if self.resolver == ResolverRestore::Defaulted {
            println!(
                "  {}",
                "No resolver backup existed; a public fallback resolver was written".yellow()
            );
        }
        if !self.data_purged {
            println!("  Stored data and backups were kept");
        }
        if self.network_refresh.is_none() {
            println!("  Restart networking manually to apply the restored resolver");
        }
        for warning in &self.warnings {
            println!("  {} {warning}", "warning:".yellow());
        }
    }
}

/// Result of [`Orchestrator::uninstall`]
#[derive(Debug, Clone, PartialEq)]
pub enum UninstallOutcome {
    /// The service was not installed; nothing was touched
    NothingToRemove,
    Removed(UninstallReport),
}

impl Orchestrator<'_> {
    /// Remove the service and put the host's DNS settings back
    pub fn uninstall(&self) -> Result<UninstallOutcome> {
        let config = self.config;
        if !self.probe().is_installed() {
            println!("ℹ️  {} is not installed, nothing to remove", config.service_name);
            return Ok(UninstallOutcome::NothingToRemove);
        }
        info!(service = %config.service_name, "starting uninstallation");
        let mut warnings = Vec::new();

        let supervisor = self.supervisor();
        match supervisor.stop() {
            Ok(()) => println!("✅ Service '{}' stopped", config.service_name),
            Err(e) => {
                warn!(error = %e, "stopping service failed");
                println!("⚠️  Could not stop '{}': {e}", config.service_name);
                warnings.push(format!("stop failed: {e}"));
            }
        }
        // remove() deregisters from boot before deleting the artifact.
        // The resolver is restored even when that fails.
        match supervisor.remove() {
            Ok(()) => println!(
                "✅ Service definition removed: {}",
                supervisor.artifact_path().display()
            ),
            Err(e) => {
                warn!(error = %e, "removing the service definition failed");
                println!("⚠️  Could not remove the service definition: {e}");
                warnings.push(format!("service definition not removed: {e}"));
            }
        }

        let network = NetworkConfigMutator::new(config);
        let resolver = network.restore_resolver_or_default()?;
        match resolver {
            ResolverRestore::FromBackup => {
                println!("✅ {} restored from backup", config.resolv_conf.display())
            }
            ResolverRestore::Defaulted => println!(
                "⚠️  No backup of {} found, wrote nameserver {}",
                config.resolv_conf.display(),
                config.fallback_nameserver
            ),
        }

        let dhcp = network.restore_dhcp_or_remove_directive()?;
        match dhcp {
            DhcpRestore::FromBackup => {
                println!("✅ {} restored from backup", config.dhclient_conf.display())
            }
            DhcpRestore::DirectiveRemoved { lines: 0, .. } => {
                println!("ℹ️  No DHCP directive to remove")
            }
            DhcpRestore::DirectiveRemoved { file_removed, .. } => {
                println!("✅ DHCP directive removed");
                if file_removed {
                    println!("✅ Empty {} removed", config.dhclient_conf.display());
                }
            }
            DhcpRestore::Skipped => println!("ℹ️  No DHCP client config, skipped"),
        }

        let executable = config.binary_path();
        files::remove_file_if_exists(&executable)?;
        println!("✅ Removed {}", executable.display());

        let data_purged = self.purge_data_if_confirmed()?;

        let network_refresh = refresh_network_stack(self.runner, self.variant);
        match &network_refresh {
            Some(command) => println!("✅ Network refreshed ({command})"),
            None => {
                println!("⚠️  Could not refresh networking");
                warnings.push("network refresh failed".to_string());
            }
        }

        info!(service = %config.service_name, "uninstallation finished");
        Ok(UninstallOutcome::Removed(UninstallReport {
            resolver,
            dhcp,
            data_purged,
            network_refresh,
            warnings,
        }))
    }

    /// Delete the data directory, backups included, after confirmation
    fn purge_data_if_confirmed(&self) -> Result<bool> {
        let data_dir = &self.config.data_dir;
        if !data_dir.exists() {
            return Ok(false);
        }

        let prompt = format!(
            "Delete stored data and configuration backups in {}?",
            data_dir.display()
        );
        if !self.prompter.confirm(&prompt, false)? {
            println!("ℹ️  Kept {}", data_dir.display());
            return Ok(false);
        }

        ConfigBackupStore::new(self.config.backup_dir()).purge()?;
        files::remove_dir_if_exists(data_dir)?;
        println!("✅ Deleted {}", data_dir.display());
        Ok(true)
    }
}
