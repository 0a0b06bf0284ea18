use thiserror::Error;

use crate::llm::error::LlmError;
use crate::mcp::error::McpError;
use crate::planner::prompt::PromptError;

/// Fatal conditions raised while building the host.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Missing credential: {0} is not set")]
    MissingCredential(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Failed to connect to backend '{backend}': {source}")]
    Connect {
        backend: String,
        #[source]
        source: McpError,
    },
    #[error("Failed to list tools from backend '{backend}': {source}")]
    Catalog {
        backend: String,
        #[source]
        source: McpError,
    },
    #[error("Failed to build completion client: {0}")]
    Provider(#[from] LlmError),
    #[error("System prompt error: {0}")]
    Prompt(#[from] PromptError),
    #[error("Startup cancelled")]
    Cancelled,
}
