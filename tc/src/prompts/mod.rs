//! Prompt templates
//!
//! Prompts ship embedded in the binary and can be overridden per project by
//! dropping a file named `<name>.pmt` into `.tripcast/prompts/`.
//! Templates use Handlebars syntax for variable substitution.

mod embedded;

pub use embedded::get_embedded;

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

/// Loads and renders prompt templates
pub struct PromptLoader {
    hbs: Handlebars<'static>,
    /// Override directory (e.g. `.tripcast/prompts/`)
    override_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader that checks `<root>/.tripcast/prompts/` before the embedded prompts
    pub fn new(root: impl AsRef<Path>) -> Self {
        let dir = root.as_ref().join(".tripcast").join("prompts");
        let exists = dir.exists();
        debug!(?dir, %exists, "PromptLoader::new: called");

        Self {
            hbs: Handlebars::new(),
            override_dir: exists.then_some(dir),
        }
    }

    /// Create a loader that only uses embedded prompts
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self {
            hbs: Handlebars::new(),
            override_dir: None,
        }
    }

    /// Load a template by name, override first then embedded
    pub fn load(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load: called");
        if let Some(dir) = &self.override_dir {
            let path = dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load: found override");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read prompt {}: {}", path.display(), e));
            }
        }

        get_embedded(name)
            .map(str::to_string)
            .ok_or_else(|| eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    pub fn render<T: Serialize>(&self, name: &str, context: &T) -> Result<String> {
        debug!(%name, "PromptLoader::render: called");
        let template = self.load(name)?;
        self.hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", name, e))
    }
}

impl Default for PromptLoader {
    fn default() -> Self {
        Self::embedded_only()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_embedded_reply_keeps_text_unescaped() {
        let loader = PromptLoader::embedded_only();
        let rendered = loader
            .render(
                "reply",
                &serde_json::json!({"itinerary": "Trip from A & B to \"C\":\n  1. X: Clear"}),
            )
            .unwrap();

        assert!(rendered.contains("Trip from A & B to \"C\":"));
        assert!(rendered.contains("1. X: Clear"));
    }

    #[test]
    fn test_override_directory_wins() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join(".tripcast").join("prompts");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("reply.pmt"), "Custom: {{{itinerary}}}").unwrap();

        let loader = PromptLoader::new(temp.path());
        let rendered = loader.render("reply", &serde_json::json!({"itinerary": "abc"})).unwrap();
        assert_eq!(rendered, "Custom: abc");

        // Not overridden, falls back to embedded
        assert!(loader.load("gather").unwrap().contains("extract_places"));
    }

    #[test]
    fn test_unknown_template() {
        let loader = PromptLoader::embedded_only();
        assert!(loader.load("nope").is_err());
    }
}
