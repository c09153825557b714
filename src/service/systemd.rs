//! systemd unit management through `systemctl`

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::{InitVariant, ServiceDefinition, ServiceStatus, ServiceSupervisor};
use crate::error::{Error, Result};
use crate::system::CommandRunner;
use crate::system::files;
use crate::template::render_service_artifact;

const UNIT_FILE_MODE: u32 = 0o644;

/// Supervises the service as a systemd unit
pub struct SystemdSupervisor<'a> {
    service_name: String,
    unit_path: PathBuf,
    runner: &'a dyn CommandRunner,
}

impl<'a> SystemdSupervisor<'a> {
    pub fn new(
        service_name: impl Into<String>,
        unit_path: impl Into<PathBuf>,
        runner: &'a dyn CommandRunner,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            unit_path: unit_path.into(),
            runner,
        }
    }

    fn systemctl(&self, verb: &str) -> Result<()> {
        self.runner
            .run_checked("systemctl", &[verb, self.service_name.as_str()])
            .map(|_| ())
    }

    fn daemon_reload(&self) -> Result<()> {
        self.runner
            .run_checked("systemctl", &["daemon-reload"])
            .map(|_| ())
    }
}

impl ServiceSupervisor for SystemdSupervisor<'_> {
    fn variant(&self) -> InitVariant {
        InitVariant::Systemd
    }

    fn artifact_path(&self) -> &Path {
        &self.unit_path
    }

    fn write_artifact(&self, definition: &ServiceDefinition) -> Result<()> {
        let unit = render_service_artifact(definition)?;
        if let Some(dir) = self.unit_path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        }
        files::write_atomic(&self.unit_path, unit.as_bytes(), Some(UNIT_FILE_MODE))?;
        println!("✅ Service file written: {}", self.unit_path.display());
        Ok(())
    }

    fn register(&self) -> Result<()> {
        self.daemon_reload()?;
        self.systemctl("enable")?;
        info!(service = %self.service_name, "systemd unit installed and enabled");
        println!("✅ Service '{}' enabled", self.service_name);
        Ok(())
    }

    fn start(&self) -> Result<()> {
        self.systemctl("start")
    }

    fn stop(&self) -> Result<()> {
        self.systemctl("stop")
    }

    fn restart(&self) -> Result<()> {
        self.systemctl("restart")
    }

    fn disable(&self) -> Result<()> {
        self.systemctl("disable")
    }

    fn remove(&self) -> Result<()> {
        if self.is_defined() {
            // Left-over enablement symlinks would point at a missing unit
            if let Err(e) = self.systemctl("disable") {
                warn!(error = %e, "disable before removal failed");
            }
        }

        if files::remove_file_if_exists(&self.unit_path)? {
            info!(unit = %self.unit_path.display(), "unit file removed");
        }
        if let Err(e) = self.daemon_reload() {
            warn!(error = %e, "daemon-reload after removal failed");
        }
        Ok(())
    }

    fn status(&self) -> Result<ServiceStatus> {
        if !self.is_defined() {
            return Ok(ServiceStatus::NotFound);
        }

        let output = self
            .runner
            .run("systemctl", &["is-active", self.service_name.as_str()])?;
        let state = output.stdout.trim().to_lowercase();

        Ok(match state.as_str() {
            "active" => ServiceStatus::Running,
            "inactive" | "deactivating" => ServiceStatus::Stopped,
            "failed" => ServiceStatus::Failed(format!(
                "see `journalctl -u {}`",
                self.service_name
            )),
            _ => ServiceStatus::Unknown,
        })
    }

    fn inspection_hints(&self) -> Vec<String> {
        vec![
            format!("Status: systemctl status {}", self.service_name),
            format!("Logs: journalctl -u {} -f", self.service_name),
        ]
    }
}
