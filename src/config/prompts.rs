//! Prompt templates for Consulta.
//!
//! Prompts can be customized by placing a `rag.toml` file in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    pub rag: RagPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            rag: RagPrompts::default(),
            variables: default_variables(),
        }
    }
}

/// Variables every prompt can rely on.
fn default_variables() -> HashMap<String, String> {
    let mut variables = HashMap::new();
    variables.insert("language".to_string(), "Spanish".to_string());
    variables
}

/// Prompts for grounded question answering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    pub system: String,
    /// Must contain the `{{context}}` and `{{question}}` slots.
    pub user: String,
    /// Returned as-is when retrieval finds nothing to answer from.
    pub no_context_answer: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a helpful AI assistant who answers questions based on the provided PDF documents about the political parties' work plans.

Guidelines:
- Use only the context provided to answer the question
- If you don't know the answer or can't find it in the context, say so clearly instead of guessing
- Mention which document the information comes from when it helps the reader
- Be concise but thorough
- Respond in {{language}}"#
                .to_string(),

            user: r#"Context:
{{context}}

Question: {{question}}

Answer based only on the context above."#
                .to_string(),

            no_context_answer:
                "No encontré información relevante en los documentos para responder esta pregunta."
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

        // Config variables extend the defaults rather than replacing them
        if let Some(vars) = custom_variables {
            prompts
                .variables
                .extend(vars.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let rag_path = custom_path.join("rag.toml");
            if rag_path.exists() {
                let content = std::fs::read_to_string(&rag_path)?;
                prompts.rag = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Substitution is a single pass over the template, so placeholders that
    /// appear inside substituted values are left untouched. Unknown
    /// placeholders are kept verbatim.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find("}}") {
                Some(end) => {
                    let key = &after[..end];
                    match vars.get(key) {
                        Some(value) => result.push_str(value),
                        None => {
                            result.push_str("{{");
                            result.push_str(key);
                            result.push_str("}}");
                        }
                    }
                    rest = &after[end + 2..];
                }
                None => {
                    result.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        result.push_str(rest);
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
