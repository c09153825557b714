//! System utilities module

pub mod backup;
pub mod dependencies;
pub mod files;
mod privilege;
mod readiness;
pub mod runner;
mod state;

// Public exports
pub use backup::{BackupOutcome, BackupRecord, ConfigBackupStore, RestoreOutcome};
pub use dependencies::{
    DependencyProvisioner, PackageManager, ProvisionOutcome, RequirementsManifest,
};
pub use privilege::PrivilegeGuard;
pub use readiness::{HostCheck, Readiness, ReadinessReport, check_readiness};
pub use runner::{CommandOutput, CommandRunner, SystemRunner};
pub use state::{InstallationState, StateProbe};
