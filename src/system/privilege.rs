//! Administrative privilege precondition

use tracing::debug;

use crate::error::{Error, Result};

/// Verifies the process runs with an effective uid of 0
pub struct PrivilegeGuard;

impl PrivilegeGuard {
    /// Fail with [`Error::PermissionDenied`] unless running as root
    pub fn ensure() -> Result<()> {
        Self::check(effective_uid())
    }

    fn check(euid: u32) -> Result<()> {
        debug!(euid, "checking administrative privileges");
        if euid == 0 {
            Ok(())
        } else {
            Err(Error::PermissionDenied { euid })
        }
    }
}

#[cfg(unix)]
fn effective_uid() -> u32 {
    nix::unistd::Uid::effective().as_raw()
}

#[cfg(not(unix))]
fn effective_uid() -> u32 {
    u32::MAX
}
