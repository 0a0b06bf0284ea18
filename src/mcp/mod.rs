//! Backend tool-server adapters.
//!
//! Every backend is reached through [`McpClient`]. The production adapter
//! is [`RmcpClient`], which holds one long-lived streamable-HTTP MCP session
//! per backend; tests substitute their own implementations.

pub mod client;
pub mod error;
pub mod registry;
pub mod tools;

pub use client::{CallOutcome, ContentItem, JsonObject, McpClient, OperationSchema, RmcpClient};
pub use error::McpError;
pub use registry::{connect_with_retry, BackendDescriptor, BackendSet};
pub use tools::{discover_tools, BackendCatalog};
