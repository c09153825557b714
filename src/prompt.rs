//! Operator confirmations

use dialoguer::Confirm;
use dialoguer::theme::ColorfulTheme;

use crate::error::Result;

/// Asks the operator yes/no questions
pub trait Prompter {
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool>;
}

/// Interactive terminal confirmation
#[derive(Default)]
pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Prompter for TerminalPrompter {
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        let answer = Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(default)
            .interact()?;
        Ok(answer)
    }
}

/// Answers every question the same way (non-interactive runs)
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl Prompter for FixedAnswer {
    fn confirm(&self, prompt: &str, _default: bool) -> Result<bool> {
        println!("{prompt} {}", if self.0 { "yes" } else { "no" });
        Ok(self.0)
    }
}
