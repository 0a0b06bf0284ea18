use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::McpError;

pub type JsonObject = serde_json::Map<String, Value>;

/// One operation advertised by a backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationSchema {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// A single content element of a tool result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentItem {
    Text(String),
    /// Non-textual content, kept only as a short description.
    Other(String),
}

/// Result of one invoke against one backend.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CallOutcome {
    pub is_error: bool,
    pub content: Vec<ContentItem>,
}

impl CallOutcome {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            is_error: false,
            content: vec![ContentItem::Text(text.into())],
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            is_error: true,
            content: vec![ContentItem::Text(text.into())],
        }
    }

    /// Text of the first content element, if that element is textual.
    pub fn first_text(&self) -> Option<&str> {
        match self.content.first() {
            Some(ContentItem::Text(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    /// All textual content joined by newlines, for error reporting.
    pub fn error_text(&self) -> String {
        let joined = self
            .content
            .iter()
            .filter_map(|item| match item {
                ContentItem::Text(text) => Some(text.as_str()),
                ContentItem::Other(_) => None,
            })
            .collect::<Vec<_>>()
            .join("\n");
        if joined.is_empty() {
            "tool reported an error without text content".to_string()
        } else {
            joined
        }
    }
}

/// Uniform interface to one backend tool-server.
///
/// `Err` from [`McpClient::call_tool`] means the call never reached a tool
/// that could answer it (unreachable backend, unknown operation). A tool
/// that ran and failed is reported as `Ok` with `is_error` set.
#[async_trait]
pub trait McpClient: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<OperationSchema>, McpError>;
    async fn call_tool(&self, name: &str, arguments: &JsonObject) -> Result<CallOutcome, McpError>;
    async fn close(&self) -> Result<(), McpError>;

    /// `name version` reported by the server during the handshake.
    fn server_label(&self) -> Option<String> {
        None
    }
}

pub struct RmcpClient {
    peer: rmcp::service::Peer<rmcp::RoleClient>,
    service: tokio::sync::Mutex<Option<rmcp::service::RunningService<rmcp::RoleClient, ()>>>,
}

impl RmcpClient {
    /// Opens a streamable-HTTP session and performs the initialize handshake.
    pub async fn connect_http(url: &str) -> Result<Self, McpError> {
        use rmcp::transport::StreamableHttpClientTransport;
        use rmcp::ServiceExt;

        let transport = StreamableHttpClientTransport::from_uri(url);
        let service =
            ().serve(transport)
                .await
                .map_err(|e| McpError::ConnectionError(format!("initialize {url}: {e}")))?;
        Ok(Self {
            peer: service.peer().clone(),
            service: tokio::sync::Mutex::new(Some(service)),
        })
    }
}

fn classify_call_error(name: &str, err: rmcp::ServiceError) -> McpError {
    use rmcp::model::ErrorCode;

    match err {
        rmcp::ServiceError::McpError(data)
            if data.code == ErrorCode::METHOD_NOT_FOUND || data.code == ErrorCode::INVALID_PARAMS =>
        {
            McpError::ToolNotFound(format!("{name}: {}", data.message))
        }
        rmcp::ServiceError::McpError(data) => {
            McpError::CallRejected(format!("{name}: {} ({})", data.message, data.code.0))
        }
        other => McpError::TransportError(other.to_string()),
    }
}

#[async_trait]
impl McpClient for RmcpClient {
    async fn list_tools(&self) -> Result<Vec<OperationSchema>, McpError> {
        let response = self
            .peer
            .list_all_tools()
            .await
            .map_err(|e| McpError::ProtocolError(e.to_string()))?;

        Ok(response
            .into_iter()
            .map(|tool| OperationSchema {
                name: tool.name.to_string(),
                description: tool
                    .description
                    .as_deref()
                    .map(str::to_string)
                    .unwrap_or_default(),
                input_schema: Value::Object(tool.input_schema.as_ref().clone()),
            })
            .collect())
    }

    async fn call_tool(&self, name: &str, arguments: &JsonObject) -> Result<CallOutcome, McpError> {
        use rmcp::model::CallToolRequestParam;

        let response = self
            .peer
            .call_tool(CallToolRequestParam {
                name: name.to_string().into(),
                arguments: Some(arguments.clone()),
            })
            .await
            .map_err(|e| classify_call_error(name, e))?;

        let content = response
            .content
            .iter()
            .map(|content| {
                if let Some(text) = content.raw.as_text() {
                    return ContentItem::Text(text.text.clone());
                }
                match content.raw.as_resource() {
                    Some(resource) => ContentItem::Other(
                        serde_json::to_string(&resource.resource).unwrap_or_default(),
                    ),
                    None => ContentItem::Other("non-text content".to_string()),
                }
            })
            .collect();

        Ok(CallOutcome {
            is_error: response.is_error.unwrap_or(false),
            content,
        })
    }

    async fn close(&self) -> Result<(), McpError> {
        if let Some(service) = self.service.lock().await.take() {
            service
                .cancel()
                .await
                .map_err(|e| McpError::ConnectionError(e.to_string()))?;
        }
        Ok(())
    }

    fn server_label(&self) -> Option<String> {
        self.peer
            .peer_info()
            .map(|info| format!("{} {}", info.server_info.name, info.server_info.version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_text_requires_leading_text_item() {
        let outcome = CallOutcome {
            is_error: false,
            content: vec![
                ContentItem::Other("image".into()),
                ContentItem::Text("late".into()),
            ],
        };
        assert_eq!(outcome.first_text(), None);
        assert_eq!(CallOutcome::text("15").first_text(), Some("15"));
        assert_eq!(CallOutcome::default().first_text(), None);
    }

    #[test]
    fn test_error_text_joins_text_items() {
        let outcome = CallOutcome {
            is_error: true,
            content: vec![
                ContentItem::Text("user not found".into()),
                ContentItem::Other("blob".into()),
                ContentItem::Text("id=9".into()),
            ],
        };
        assert_eq!(outcome.error_text(), "user not found\nid=9");

        let empty = CallOutcome {
            is_error: true,
            content: vec![],
        };
        assert!(empty.error_text().contains("without text"));
    }

    #[test]
    fn test_unknown_tool_errors_map_to_tool_not_found() {
        use rmcp::model::{ErrorCode, ErrorData};

        let err = classify_call_error(
            "get_user",
            rmcp::ServiceError::McpError(ErrorData::invalid_params("tool not found", None)),
        );
        assert!(matches!(err, McpError::ToolNotFound(ref msg) if msg == "get_user: tool not found"));

        let err = classify_call_error(
            "get_user",
            rmcp::ServiceError::McpError(ErrorData::new(
                ErrorCode::METHOD_NOT_FOUND,
                "no such method",
                None,
            )),
        );
        assert!(matches!(err, McpError::ToolNotFound(_)));
    }

    #[test]
    fn test_other_rpc_errors_are_rejections() {
        use rmcp::model::ErrorData;

        let err = classify_call_error(
            "get_user",
            rmcp::ServiceError::McpError(ErrorData::internal_error("user not found: 9", None)),
        );
        match err {
            McpError::CallRejected(msg) => {
                assert!(msg.starts_with("get_user: user not found: 9"));
                assert!(msg.contains("-32603"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_closed_session_is_a_transport_error() {
        let err = classify_call_error("add_numbers", rmcp::ServiceError::TransportClosed);
        assert!(matches!(err, McpError::TransportError(_)));
    }

    #[test]
    fn test_operation_schema_uses_wire_field_names() {
        let schema: OperationSchema = serde_json::from_value(serde_json::json!({
            "name": "get_user",
            "inputSchema": {"type": "object", "properties": {"user_id": {"type": "string"}}}
        }))
        .unwrap();
        assert_eq!(schema.name, "get_user");
        assert_eq!(schema.description, "");

        let back = serde_json::to_value(&schema).unwrap();
        assert!(back.get("inputSchema").is_some());
    }
}
