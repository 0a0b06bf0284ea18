//! System prompt rendering.
//!
//! The prompt is a minijinja template fed one entry per backend
//! (`backends[].name`, `backends[].tools` as serialized JSON). The rendered
//! text must fit in `max_bytes`.

use minijinja::Environment;
use serde::Serialize;
use thiserror::Error;

use crate::mcp::tools::BackendCatalog;

pub const DEFAULT_PROMPT_LIMIT: usize = 64 * 1024;

pub const DEFAULT_TEMPLATE: &str = r#"You are an assistant that can use tools to answer questions.
When a tool is needed, you must respond with a JSON object containing the tool name and its inputs.
Use the tag "tool" to indicate the tool name and "inputs" for the arguments.
Do not add any other text to the response.

{% for backend in backends %}
Available tools from the {{ backend.name }} MCP server: {{ backend.tools }}
{% endfor %}

Make sure the tool's request is valid and that it follows the above description for each MCP server."#;

const TEMPLATE_NAME: &str = "system_prompt";

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Prompt template error: {0}")]
    Template(String),
    #[error("Rendered system prompt is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },
}

#[derive(Serialize)]
struct BackendEntry {
    name: String,
    tools: String,
}

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    source: String,
    max_bytes: usize,
}

impl PromptTemplate {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            max_bytes: DEFAULT_PROMPT_LIMIT,
        }
    }

    pub fn with_limit(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn render(&self, catalogs: &[BackendCatalog]) -> Result<String, PromptError> {
        let backends = catalogs
            .iter()
            .map(|catalog| {
                serde_json::to_string(&catalog.tools)
                    .map(|tools| BackendEntry {
                        name: catalog.backend.clone(),
                        tools,
                    })
                    .map_err(|e| PromptError::Template(format!("Serialize tools: {}", e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.add_template(TEMPLATE_NAME, &self.source)
            .map_err(|e| PromptError::Template(format!("Template parse error: {}", e)))?;
        let tmpl = env
            .get_template(TEMPLATE_NAME)
            .map_err(|e| PromptError::Template(format!("Template not found: {}", e)))?;
        let rendered = tmpl
            .render(minijinja::context! { backends => backends })
            .map_err(|e| PromptError::Template(format!("Template render error: {}", e)))?;

        if rendered.len() > self.max_bytes {
            return Err(PromptError::TooLarge {
                size: rendered.len(),
                limit: self.max_bytes,
            });
        }
        Ok(rendered)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::client::OperationSchema;

    fn catalogs() -> Vec<BackendCatalog> {
        vec![
            BackendCatalog {
                backend: "users".into(),
                tools: vec![OperationSchema {
                    name: "get_user".into(),
                    description: "Read a user by id".into(),
                    input_schema: serde_json::json!({"type":"object","properties":{"user_id":{"type":"string"}}}),
                }],
            },
            BackendCatalog {
                backend: "calc".into(),
                tools: vec![OperationSchema {
                    name: "add_numbers".into(),
                    description: "Add two numbers".into(),
                    input_schema: serde_json::json!({"type":"object"}),
                }],
            },
        ]
    }

    #[test]
    fn test_default_template_lists_every_backend_in_order() {
        let prompt = PromptTemplate::default().render(&catalogs()).unwrap();
        assert!(prompt.starts_with("You are an assistant that can use tools"));
        let users = prompt.find("from the users MCP server").unwrap();
        let calc = prompt.find("from the calc MCP server").unwrap();
        assert!(users < calc);
        assert!(prompt.contains(r#""name":"get_user""#));
        assert!(prompt.contains(r#""inputSchema""#));
        assert!(!prompt.contains("{%"));
    }

    #[test]
    fn test_render_is_reproducible() {
        let template = PromptTemplate::default();
        assert_eq!(
            template.render(&catalogs()).unwrap(),
            template.render(&catalogs()).unwrap()
        );
    }

    #[test]
    fn test_limit_enforced() {
        let err = PromptTemplate::default()
            .with_limit(64)
            .render(&catalogs())
            .unwrap_err();
        assert!(matches!(err, PromptError::TooLarge { limit: 64, .. }));
    }

    #[test]
    fn test_custom_template() {
        let prompt = PromptTemplate::new("{% for b in backends %}[{{ b.name }}]{% endfor %}")
            .render(&catalogs())
            .unwrap();
        assert_eq!(prompt, "[users][calc]");
    }

    #[test]
    fn test_bad_template_reported() {
        let err = PromptTemplate::new("{% for b in %}").render(&[]).unwrap_err();
        assert!(matches!(err, PromptError::Template(_)));
    }
}
