use serde::Serialize;

use super::client::{McpClient, OperationSchema};
use super::error::McpError;

/// The operations one backend advertised at startup.
#[derive(Debug, Clone, Serialize)]
pub struct BackendCatalog {
    pub backend: String,
    pub tools: Vec<OperationSchema>,
}

pub async fn discover_tools(
    backend: &str,
    client: &dyn McpClient,
) -> Result<BackendCatalog, McpError> {
    let tools = client.list_tools().await?;
    tracing::debug!(backend, tool_count = tools.len(), "discovered tools");

    Ok(BackendCatalog {
        backend: backend.to_string(),
        tools,
    })
}
