//! Interactive menu
//!
//! One screen, one action: the option set follows the installation state
//! and the program exits after the chosen action completes.

use colored::Colorize;
use console::Term;
use dialoguer::Select;
use dialoguer::theme::ColorfulTheme;
use std::fmt;

use crate::error::Result;
use crate::orchestrator::{Orchestrator, UninstallOutcome};
use crate::system::InstallationState;

const TOOL_TITLE: &str = "Resilient DNS Proxy Setup";

/// Entries of the main menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Install,
    Reinstall,
    Uninstall,
    Exit,
}

impl fmt::Display for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Install => write!(f, "Install"),
            Self::Reinstall => write!(f, "Reinstall"),
            Self::Uninstall => write!(f, "Uninstall"),
            Self::Exit => write!(f, "Exit"),
        }
    }
}

/// Options offered for `state`, in display order
pub fn menu_actions(state: InstallationState) -> Vec<MenuAction> {
    match state {
        InstallationState::Installed => {
            vec![MenuAction::Reinstall, MenuAction::Uninstall, MenuAction::Exit]
        }
        InstallationState::NotInstalled => vec![MenuAction::Install, MenuAction::Exit],
    }
}

/// Menu front end over an [`Orchestrator`]
pub struct MenuApplication<'o, 'a> {
    orchestrator: &'o Orchestrator<'a>,
    theme: ColorfulTheme,
}

impl<'o, 'a> MenuApplication<'o, 'a> {
    pub fn new(orchestrator: &'o Orchestrator<'a>) -> Self {
        Self {
            orchestrator,
            theme: ColorfulTheme::default(),
        }
    }

    /// Show the menu, run the selected action and return it
    pub fn run(&self) -> Result<MenuAction> {
        self.render_header();

        let actions = menu_actions(self.orchestrator.state());
        let selection = Select::with_theme(&self.theme)
            .with_prompt("Choose an action")
            .items(&actions)
            .default(0)
            .interact()?;
        let action = actions[selection];

        self.dispatch(action)?;
        Ok(action)
    }

    fn dispatch(&self, action: MenuAction) -> Result<()> {
        match action {
            MenuAction::Install | MenuAction::Reinstall => {
                self.orchestrator.install()?.print();
            }
            MenuAction::Uninstall => match self.orchestrator.uninstall()? {
                UninstallOutcome::Removed(report) => report.print(),
                UninstallOutcome::NothingToRemove => {}
            },
            MenuAction::Exit => println!("👋 Goodbye!"),
        }
        Ok(())
    }

    fn render_header(&self) {
        // NO_CLEAR_SCREEN keeps earlier output on screen
        if std::env::var_os("NO_CLEAR_SCREEN").is_none() {
            let _ = Term::stdout().clear_screen();
        }

        println!("{}", TOOL_TITLE.green());
        println!("{}", "═".repeat(TOOL_TITLE.len()).green());

        let state = self.orchestrator.state();
        let label = match state {
            InstallationState::Installed => state.to_string().green(),
            InstallationState::NotInstalled => state.to_string().yellow(),
        };
        println!(
            "Service '{}' is {label} ({})",
            self.orchestrator.config().service_name,
            self.orchestrator.variant()
        );
        println!();
    }
}
