//! SysVInit script management through `service` and `update-rc.d`

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::{InitVariant, ServiceDefinition, ServiceStatus, ServiceSupervisor};
use crate::error::{Error, Result};
use crate::system::files;
use crate::system::{CommandOutput, CommandRunner};
use crate::template::render_service_artifact;

const INIT_SCRIPT_MODE: u32 = 0o755;

/// Supervises the service through an init script
pub struct SysVInitSupervisor<'a> {
    service_name: String,
    script_path: PathBuf,
    log_file: PathBuf,
    runner: &'a dyn CommandRunner,
}

impl<'a> SysVInitSupervisor<'a> {
    pub fn new(
        service_name: impl Into<String>,
        script_path: impl Into<PathBuf>,
        log_file: impl Into<PathBuf>,
        runner: &'a dyn CommandRunner,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            script_path: script_path.into(),
            log_file: log_file.into(),
            runner,
        }
    }

    /// Run an init script action, through `service` when available
    fn action(&self, action: &str) -> Result<CommandOutput> {
        if self.runner.command_exists("service") {
            self.runner
                .run("service", &[self.service_name.as_str(), action])
        } else {
            let script = self.script_path.to_string_lossy();
            self.runner.run(&script, &[action])
        }
    }

    fn checked_action(&self, action: &str) -> Result<()> {
        let output = self.action(action)?;
        if output.success {
            Ok(())
        } else {
            Err(Error::command(
                format!("service {} {}", self.service_name, action),
                output.failure_message(),
            ))
        }
    }

    fn update_rc(&self, args: &[&str]) -> Result<()> {
        self.runner.run_checked("update-rc.d", args).map(|_| ())
    }
}

impl ServiceSupervisor for SysVInitSupervisor<'_> {
    fn variant(&self) -> InitVariant {
        InitVariant::SysVInit
    }

    fn artifact_path(&self) -> &Path {
        &self.script_path
    }

    fn write_artifact(&self, definition: &ServiceDefinition) -> Result<()> {
        let script = render_service_artifact(definition)?;
        if let Some(dir) = self.script_path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
        }
        files::write_atomic(&self.script_path, script.as_bytes(), Some(INIT_SCRIPT_MODE))?;
        println!("✅ Init script written: {}", self.script_path.display());
        Ok(())
    }

    fn register(&self) -> Result<()> {
        self.update_rc(&[self.service_name.as_str(), "defaults"])?;
        info!(service = %self.service_name, "init script installed and registered");
        println!("✅ Service '{}' registered for boot", self.service_name);
        Ok(())
    }

    fn start(&self) -> Result<()> {
        self.checked_action("start")
    }

    fn stop(&self) -> Result<()> {
        self.checked_action("stop")
    }

    fn restart(&self) -> Result<()> {
        self.checked_action("restart")
    }

    fn disable(&self) -> Result<()> {
        self.update_rc(&["-f", self.service_name.as_str(), "remove"])
    }

    fn remove(&self) -> Result<()> {
        if self.is_defined() {
            if let Err(e) = self.disable() {
                warn!(error = %e, "deregistering init script failed");
            }
        }

        if files::remove_file_if_exists(&self.script_path)? {
            info!(script = %self.script_path.display(), "init script removed");
        }
        Ok(())
    }

    fn status(&self) -> Result<ServiceStatus> {
        if !self.is_defined() {
            return Ok(ServiceStatus::NotFound);
        }

        let output = self.action("status")?;
        Ok(parse_status(&output.combined()))
    }

    fn inspection_hints(&self) -> Vec<String> {
        vec![
            format!("Status: service {} status", self.service_name),
            format!("Logs: tail -f {}", self.log_file.display()),
        ]
    }
}

/// Map init script `status` output to a [`ServiceStatus`]
fn parse_status(output: &str) -> ServiceStatus {
    let text = output.to_lowercase();
    if text.contains("not running") || text.contains("stopped") {
        ServiceStatus::Stopped
    } else if text.contains("running") {
        ServiceStatus::Running
    } else {
        ServiceStatus::Unknown
    }
}
