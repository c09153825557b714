//! Resilient DNS proxy deploy tool
//!
//! Installs, reinstalls and uninstalls the proxy service on this host

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tracing::debug;

use cli::{Cli, Commands};
use resilient_dns_deploy::DeployConfig;
use resilient_dns_deploy::menu::MenuApplication;
use resilient_dns_deploy::observability::init_observability;
use resilient_dns_deploy::orchestrator::{Orchestrator, UninstallOutcome};
use resilient_dns_deploy::prompt::{FixedAnswer, Prompter, TerminalPrompter};
use resilient_dns_deploy::system::{PrivilegeGuard, SystemRunner, check_readiness};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    let guard =
        init_observability(&config.log, cli.debug).context("failed to initialize logging")?;

    let command = cli.command.unwrap_or(Commands::Menu);
    debug!(?command, log_file = guard.writes_file(), "starting");
    if command.requires_root() {
        PrivilegeGuard::ensure()?;
    }

    let runner = SystemRunner;
    match command {
        Commands::Install => {
            let prompter = TerminalPrompter::new();
            let orchestrator = Orchestrator::new(&config, &runner, &prompter);
            orchestrator.install()?.print();
        }
        Commands::Uninstall { purge_data } => {
            let prompter: Box<dyn Prompter> = if purge_data {
                Box::new(FixedAnswer(true))
            } else {
                Box::new(TerminalPrompter::new())
            };
            let orchestrator = Orchestrator::new(&config, &runner, &*prompter);
            if let UninstallOutcome::Removed(report) = orchestrator.uninstall()? {
                report.print();
            }
        }
        Commands::Status => {
            let prompter = FixedAnswer(false);
            let orchestrator = Orchestrator::new(&config, &runner, &prompter);
            orchestrator.status()?.print();
        }
        Commands::Deps => {
            let prompter = FixedAnswer(false);
            let orchestrator = Orchestrator::new(&config, &runner, &prompter);
            check_readiness(&config, &runner, orchestrator.variant()).print();
        }
        Commands::Menu => {
            let prompter = TerminalPrompter::new();
            let orchestrator = Orchestrator::new(&config, &runner, &prompter);
            MenuApplication::new(&orchestrator).run()?;
        }
    }

    Ok(())
}

/// Defaults, optionally overridden by a TOML file
fn load_config(path: Option<&Path>) -> Result<DeployConfig> {
    match path {
        Some(path) => DeployConfig::load(path)
            .with_context(|| format!("failed to load configuration from {}", path.display())),
        None => Ok(DeployConfig::default()),
    }
}
