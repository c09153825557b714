//! Resolver and DHCP client configuration
//!
//! [`NetworkConfigMutator`] is the only writer of the live `resolv.conf`
//! and `dhclient.conf`. Restores go through [`ConfigBackupStore`].

use std::fs;
use tracing::{debug, info, warn};

use crate::config::DeployConfig;
use crate::error::{Error, Result};
use crate::service::InitVariant;
use crate::system::files;
use crate::system::{CommandRunner, ConfigBackupStore, RestoreOutcome};

/// Result of [`NetworkConfigMutator::add_persistence_directive`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveOutcome {
    Added,
    AlreadyPresent,
    /// The host has no DHCP client configuration directory
    Skipped,
}

/// How the resolver file was put back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverRestore {
    FromBackup,
    Defaulted,
}

/// How the DHCP client file was put back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DhcpRestore {
    FromBackup,
    /// No backup; only the directive lines were deleted
    DirectiveRemoved { lines: usize, file_removed: bool },
    /// No DHCP client file on this host
    Skipped,
}

/// Owns the live resolver and DHCP client files
pub struct NetworkConfigMutator<'a> {
    config: &'a DeployConfig,
    backups: ConfigBackupStore,
}

impl<'a> NetworkConfigMutator<'a> {
    pub fn new(config: &'a DeployConfig) -> Self {
        Self {
            config,
            backups: ConfigBackupStore::new(config.backup_dir()),
        }
    }

    /// Replace the whole resolver file with the local proxy entry
    pub fn point_resolver_to_local_proxy(&self) -> Result<()> {
        let path = &self.config.resolv_conf;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        }
        files::write_atomic(path, self.config.resolver_content().as_bytes(), None)?;
        info!(path = %path.display(), "resolver now points at the local proxy");
        Ok(())
    }

    /// Append the supersede directive unless an identical line exists
    pub fn add_persistence_directive(&self) -> Result<DirectiveOutcome> {
        if !self.config.dhcp_dir().is_dir() {
            debug!(dir = %self.config.dhcp_dir().display(), "no DHCP client directory");
            return Ok(DirectiveOutcome::Skipped);
        }

        let path = &self.config.dhclient_conf;
        let directive = self.config.persistence_directive();
        let existing = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(Error::io(path, e)),
        };

        if contains_line(&existing, &directive) {
            return Ok(DirectiveOutcome::AlreadyPresent);
        }

        let mut updated = existing;
        if !updated.is_empty() && !updated.ends_with('\n') {
            updated.push('\n');
        }
        updated.push_str(&directive);
        updated.push('\n');

        files::write_atomic(path, updated.as_bytes(), None)?;
        info!(path = %path.display(), "DHCP persistence directive added");
        Ok(DirectiveOutcome::Added)
    }

    /// Restore the resolver from backup, or write the public fallback
    pub fn restore_resolver_or_default(&self) -> Result<ResolverRestore> {
        let path = &self.config.resolv_conf;
        match self
            .backups
            .restore(&self.config.resolv_backup_path(), path)?
        {
            RestoreOutcome::Restored => Ok(ResolverRestore::FromBackup),
            RestoreOutcome::NoBackupAvailable => {
                warn!(
                    path = %path.display(),
                    "no resolver backup found, writing fallback nameserver"
                );
                self.backups
                    .fallback_restore(path, &self.config.fallback_resolver_content())?;
                Ok(ResolverRestore::Defaulted)
            }
        }
    }

    /// Restore the DHCP client file from backup, or strip the directive
    pub fn restore_dhcp_or_remove_directive(&self) -> Result<DhcpRestore> {
        let path = &self.config.dhclient_conf;
        match self
            .backups
            .restore(&self.config.dhclient_backup_path(), path)?
        {
            RestoreOutcome::Restored => Ok(DhcpRestore::FromBackup),
            RestoreOutcome::NoBackupAvailable if path.is_file() => {
                self.remove_persistence_directive()
            }
            RestoreOutcome::NoBackupAvailable => Ok(DhcpRestore::Skipped),
        }
    }

    /// Delete only lines identical to the directive. A file left with
    /// nothing but whitespace did not exist before installation and is
    /// removed.
    pub fn remove_persistence_directive(&self) -> Result<DhcpRestore> {
        let path = &self.config.dhclient_conf;
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(DhcpRestore::Skipped);
            }
            Err(e) => return Err(Error::io(path, e)),
        };

        let directive = self.config.persistence_directive();
        let (kept, removed) = strip_line(&content, &directive);
        if removed == 0 {
            return Ok(DhcpRestore::DirectiveRemoved {
                lines: 0,
                file_removed: false,
            });
        }

        let file_removed = if kept.trim().is_empty() {
            files::remove_file_if_exists(path)?
        } else {
            files::write_atomic(path, kept.as_bytes(), None)?;
            false
        };
        info!(path = %path.display(), removed, "DHCP persistence directive removed");
        Ok(DhcpRestore::DirectiveRemoved {
            lines: removed,
            file_removed,
        })
    }

    /// Whether the directive is currently present
    pub fn has_persistence_directive(&self) -> bool {
        fs::read_to_string(&self.config.dhclient_conf)
            .map(|content| contains_line(&content, &self.config.persistence_directive()))
            .unwrap_or(false)
    }
}

const SYSTEMD_REFRESH: &[(&str, &[&str])] = &[
    ("systemctl", &["try-restart", "NetworkManager"]),
    ("systemctl", &["try-restart", "networking"]),
    ("systemctl", &["try-restart", "systemd-networkd"]),
];

const SYSVINIT_REFRESH: &[(&str, &[&str])] = &[
    ("service", &["networking", "restart"]),
    ("service", &["network-manager", "restart"]),
];

/// Best-effort restart of host networking so restored resolver settings
/// apply immediately. Returns the command that succeeded, if any.
pub fn refresh_network_stack(runner: &dyn CommandRunner, variant: InitVariant) -> Option<String> {
    let candidates = match variant {
        InitVariant::Systemd => SYSTEMD_REFRESH,
        InitVariant::SysVInit => SYSVINIT_REFRESH,
    };

    for (program, args) in candidates {
        if !runner.command_exists(program) {
            continue;
        }
        match runner.run(program, args) {
            Ok(output) if output.success => {
                let command = crate::system::runner::command_line(program, args);
                info!(%command, "network stack refreshed");
                return Some(command);
            }
            Ok(output) => debug!(
                program,
                ?args,
                failure = %output.failure_message(),
                "refresh candidate failed"
            ),
            Err(e) => debug!(program, ?args, error = %e, "refresh candidate failed"),
        }
    }

    warn!("could not refresh the network stack");
    None
}

fn contains_line(content: &str, line: &str) -> bool {
    content.lines().any(|l| l.trim() == line)
}

/// Remove every line equal to `line`; returns the remaining content and
/// how many lines were dropped
fn strip_line(content: &str, line: &str) -> (String, usize) {
    let mut removed = 0;
    let mut kept = String::with_capacity(content.len());
    for l in content.lines() {
        if l.trim() == line {
            removed += 1;
        } else {
            kept.push_str(l);
            kept.push('\n');
        }
    }
    (kept, removed)
}
