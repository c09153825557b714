//! Command line interface
//!
//! Without a subcommand the interactive menu runs.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Installs and removes the resilient DNS proxy service
#[derive(Parser, Debug)]
#[command(name = "resilient-dns-deploy")]
#[command(version)]
#[command(about = "Install, reinstall or uninstall the resilient DNS proxy service")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Option<Commands>,

    /// TOML file overriding the default paths and names
    #[arg(short, long, global = true)]
    pub(crate) config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub(crate) debug: bool,
}

#[derive(Subcommand, Debug, PartialEq)]
pub(crate) enum Commands {
    /// Install the service, or reinstall it when already present
    Install,
    /// Stop and remove the service and restore DNS settings
    Uninstall {
        /// Also delete stored data and backups without asking
        #[arg(long)]
        purge_data: bool,
    },
    /// Show installation and service status
    Status,
    /// Check what installation needs on this host
    Deps,
    /// Run the interactive menu
    Menu,
}

impl Commands {
    /// Whether the command changes the host and needs root
    pub(crate) fn requires_root(&self) -> bool {
        matches!(self, Self::Install | Self::Uninstall { .. } | Self::Menu)
    }
}
