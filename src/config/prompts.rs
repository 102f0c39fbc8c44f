//! Prompt templates for Omslag.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub summarization: SummarizationPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for the summarization stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizationPrompts {
    /// Steering preamble prepended to the transcript. Counts toward the input budget.
    pub preamble: String,
    /// System message. `{{min_tokens}}` and `{{max_tokens}}` are filled in.
    pub system: String,
}

impl Default for SummarizationPrompts {
    fn default() -> Self {
        Self {
            preamble: "Create a concise and engaging summary that captures the essential features and visual \
                elements of the topic. Describe its main attributes in a way that can be visually \
                interpreted for image creation. This summary should be adaptable for YouTube video covers."
                .to_string(),

            system: r#"You are an abstractive summarizer. Summarize the text you are given.

Rules:
- Write between {{min_tokens}} and {{max_tokens}} tokens of plain prose
- Follow the instruction at the start of the text
- Do not add headings, lists, quotes or commentary
- Never invent content that is not in the text"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let summarization_path = custom_path.join("summarization.toml");
            if summarization_path.exists() {
                let content = std::fs::read_to_string(&summarization_path)?;
                prompts.summarization = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.summarization.preamble.starts_with("Create a concise"));
        assert!(prompts.summarization.system.contains("{{max_tokens}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Between {{min_tokens}} and {{max_tokens}} tokens.";
        let mut vars = HashMap::new();
        vars.insert("min_tokens".to_string(), "50".to_string());
        vars.insert("max_tokens".to_string(), "120".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Between 50 and 120 tokens.");
    }

    #[test]
    fn test_custom_variables_lose_to_provided() {
        let mut custom = HashMap::new();
        custom.insert("audience".to_string(), "gamers".to_string());
        custom.insert("max_tokens".to_string(), "999".to_string());
        let prompts = Prompts::load(None, Some(&custom)).unwrap();

        let mut vars = HashMap::new();
        vars.insert("max_tokens".to_string(), "120".to_string());

        let rendered = prompts.render_with_custom("{{audience}}: {{max_tokens}}", &vars);
        assert_eq!(rendered, "gamers: 120");
    }

    #[test]
    fn test_load_custom_preamble() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("summarization.toml"),
            "preamble = \"Describe it like a movie poster.\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.summarization.preamble, "Describe it like a movie poster.");
        // Missing keys fall back to defaults
        assert!(prompts.summarization.system.contains("{{min_tokens}}"));
    }
}
