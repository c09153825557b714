//! Host readiness report for the `deps` subcommand
//!
//! Each check lands in one of three buckets: present now, provided by the
//! installer itself, or blocking installation.

use colored::*;
use std::fmt;

use super::dependencies::PackageManager;
use super::runner::CommandRunner;
use crate::config::DeployConfig;
use crate::service::InitVariant;

const SYSTEMD_TOOLS: &[&str] = &["systemctl"];
const SYSVINIT_TOOLS: &[&str] = &["update-rc.d", "start-stop-daemon"];

/// How a finding affects a later `install`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Present,
    /// Missing, but installation provisions it or works without it
    Provisioned,
    Blocking,
}

impl Readiness {
    fn icon(self) -> &'static str {
        match self {
            Self::Present => "✅",
            Self::Provisioned => "ℹ️ ",
            Self::Blocking => "❌",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HostCheck {
    pub subject: &'static str,
    pub readiness: Readiness,
    pub detail: String,
}

impl fmt::Display for HostCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:<16} {}",
            self.readiness.icon(),
            self.subject,
            self.detail
        )
    }
}

#[derive(Debug, Default)]
pub struct ReadinessReport {
    pub checks: Vec<HostCheck>,
}

impl ReadinessReport {
    fn record(&mut self, subject: &'static str, readiness: Readiness, detail: impl Into<String>) {
        self.checks.push(HostCheck {
            subject,
            readiness,
            detail: detail.into(),
        });
    }

    pub fn blockers(&self) -> impl Iterator<Item = &HostCheck> {
        self.checks
            .iter()
            .filter(|check| check.readiness == Readiness::Blocking)
    }

    pub fn is_ready(&self) -> bool {
        self.blockers().next().is_none()
    }

    pub fn summary(&self) -> String {
        match self.blockers().count() {
            0 => "🎉 Host is ready for installation".to_string(),
            1 => "❌ 1 problem blocks installation".to_string(),
            n => format!("❌ {n} problems block installation"),
        }
    }

    pub fn print(&self) {
        println!("{}", "Host readiness".bold());
        for check in &self.checks {
            println!("  {check}");
        }
        println!();
        if self.is_ready() {
            println!("{}", self.summary().bright_green().bold());
        } else {
            println!("{}", self.summary().bright_yellow().bold());
        }
    }
}

/// Inspect what installation will need on this host.
///
/// The interpreter, pip, a package manager and the DHCP client directory
/// are never blocking; a missing artifact source or init tooling is.
pub fn check_readiness(
    config: &DeployConfig,
    runner: &dyn CommandRunner,
    variant: InitVariant,
) -> ReadinessReport {
    let mut report = ReadinessReport::default();

    if config.interpreter.is_file() {
        report.record(
            "Interpreter",
            Readiness::Present,
            config.interpreter.display().to_string(),
        );
    } else {
        report.record(
            "Interpreter",
            Readiness::Provisioned,
            format!("{} will be installed", config.interpreter.display()),
        );
    }

    if runner.command_exists("pip3") {
        report.record("pip", Readiness::Present, "pip3");
    } else {
        report.record("pip", Readiness::Provisioned, "pip3 will be installed");
    }

    match PackageManager::detect(runner) {
        Some(manager) => report.record("Package manager", Readiness::Present, manager.program()),
        None => report.record(
            "Package manager",
            Readiness::Provisioned,
            "none found, Python packages must already be present",
        ),
    }

    let init_tools = match variant {
        InitVariant::Systemd => SYSTEMD_TOOLS,
        InitVariant::SysVInit => SYSVINIT_TOOLS,
    };
    for tool in init_tools {
        if runner.command_exists(tool) {
            report.record("Init system", Readiness::Present, format!("{variant} ({tool})"));
        } else {
            report.record(
                "Init system",
                Readiness::Blocking,
                format!("{variant} detected but {tool} is missing"),
            );
        }
    }

    match config
        .artifact_candidates()
        .into_iter()
        .find(|path| path.is_file())
    {
        Some(path) => report.record("Artifact", Readiness::Present, path.display().to_string()),
        None => report.record(
            "Artifact",
            Readiness::Blocking,
            format!("{} not found", config.artifact_name),
        ),
    }

    if config.dhcp_dir().is_dir() {
        report.record(
            "DHCP client",
            Readiness::Present,
            config.dhclient_conf.display().to_string(),
        );
    } else {
        report.record(
            "DHCP client",
            Readiness::Provisioned,
            format!("{} absent, directive skipped", config.dhcp_dir().display()),
        );
    }

    report
}
