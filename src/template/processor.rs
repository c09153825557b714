//! `{{PLACEHOLDER}}` substitution for embedded templates

use std::collections::HashMap;

/// Replaces `{{KEY}}` placeholders with values
#[derive(Debug, Default)]
pub struct TemplateProcessor {
    placeholders: HashMap<&'static str, String>,
}

impl TemplateProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.placeholders.insert(key, value.into());
        self
    }

    pub fn process(&self, template: &str) -> String {
        let mut result = template.to_string();

        for (key, value) in &self.placeholders {
            let placeholder = format!("{{{{{}}}}}", key);
            result = result.replace(&placeholder, value);
        }

        result
    }

    /// Placeholders still present after processing
    pub fn unresolved(rendered: &str) -> Vec<String> {
        let mut found = Vec::new();
        let mut rest = rendered;
        while let Some(start) = rest.find("{{") {
            let after = &rest[start + 2..];
            match after.find("}}") {
                Some(end) => {
                    found.push(after[..end].to_string());
                    rest = &after[end + 2..];
                }
                None => break,
            }
        }
        found
    }
}
