use thiserror::Error;

#[derive(Debug, Error)]
pub enum McpError {
    #[error("MCP invalid config: {0}")]
    InvalidConfig(String),
    #[error("MCP connection error: {0}")]
    ConnectionError(String),
    #[error("MCP protocol error: {0}")]
    ProtocolError(String),
    #[error("MCP tool not found: {0}")]
    ToolNotFound(String),
    /// The server answered the call with a JSON-RPC error other than an
    /// unknown method or bad parameters.
    #[error("MCP call rejected: {0}")]
    CallRejected(String),
    #[error("MCP transport error: {0}")]
    TransportError(String),
}
