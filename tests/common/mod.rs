#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Notify;

use mcp_host::llm::types::{
    ChatCompletionRequest, ChatCompletionResponse, ProviderInfo, TokenUsage,
};
use mcp_host::llm::{LlmError, LlmProvider};
use mcp_host::mcp::client::JsonObject;
use mcp_host::{
    BackendDescriptor, BackendSet, CallOutcome, Dispatcher, FallbackPolicy, McpClient, McpError,
    OperationSchema, Planner,
};

pub enum Reply {
    Text(String),
    Status(u16),
    Hang,
}

/// Completion service that answers every request the same way.
pub struct ScriptedProvider {
    reply: Reply,
    pub requests: Mutex<Vec<ChatCompletionRequest>>,
}

impl ScriptedProvider {
    pub fn answering(content: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            reply: Reply::Text(content.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(status: u16) -> Arc<Self> {
        Arc::new(Self {
            reply: Reply::Status(status),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn hanging() -> Arc<Self> {
        Arc::new(Self {
            reply: Reply::Hang,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn id(&self) -> &str {
        "scripted"
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            id: "scripted".to_string(),
            name: "Scripted".to_string(),
            default_model: "mock-model".to_string(),
        }
    }

    async fn chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, LlmError> {
        self.requests.lock().unwrap().push(request);
        match &self.reply {
            Reply::Text(content) => Ok(ChatCompletionResponse {
                content: content.clone(),
                usage: TokenUsage::default(),
                model: "mock-model".to_string(),
                finish_reason: Some("stop".to_string()),
            }),
            Reply::Status(status) => Err(LlmError::ApiError {
                status: *status,
                message: "scripted failure".to_string(),
            }),
            Reply::Hang => std::future::pending().await,
        }
    }
}

type Handler = Box<dyn Fn(&str, &JsonObject) -> Result<CallOutcome, McpError> + Send + Sync>;

/// Backend whose answers come from a closure; counts every call.
pub struct MockBackend {
    tools: Vec<OperationSchema>,
    handler: Handler,
    gate: Option<Arc<Notify>>,
    hang: bool,
    calls: AtomicUsize,
    closed: AtomicUsize,
    last_arguments: Mutex<Option<JsonObject>>,
}

impl MockBackend {
    pub fn new<F>(tools: Vec<OperationSchema>, handler: F) -> Self
    where
        F: Fn(&str, &JsonObject) -> Result<CallOutcome, McpError> + Send + Sync + 'static,
    {
        Self {
            tools,
            handler: Box::new(handler),
            gate: None,
            hang: false,
            calls: AtomicUsize::new(0),
            closed: AtomicUsize::new(0),
            last_arguments: Mutex::new(None),
        }
    }

    pub fn unreachable() -> Self {
        Self::new(vec![], |_, _| {
            Err(McpError::TransportError("connection refused".to_string()))
        })
    }

    pub fn replying(outcome: CallOutcome) -> Self {
        Self::new(vec![], move |_, _| Ok(outcome.clone()))
    }

    pub fn hanging() -> Self {
        let mut backend = Self::replying(CallOutcome::text("never"));
        backend.hang = true;
        backend
    }

    /// Waits for `gate` to be notified before answering.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn last_arguments(&self) -> Option<JsonObject> {
        self.last_arguments.lock().unwrap().clone()
    }
}

#[async_trait]
impl McpClient for MockBackend {
    async fn list_tools(&self) -> Result<Vec<OperationSchema>, McpError> {
        Ok(self.tools.clone())
    }

    async fn call_tool(&self, name: &str, arguments: &JsonObject) -> Result<CallOutcome, McpError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_arguments.lock().unwrap() = Some(arguments.clone());
        if self.hang {
            return std::future::pending().await;
        }
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        (self.handler)(name, arguments)
    }

    async fn close(&self) -> Result<(), McpError> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn schema(name: &str, description: &str, properties: serde_json::Value) -> OperationSchema {
    OperationSchema {
        name: name.to_string(),
        description: description.to_string(),
        input_schema: json!({"type": "object", "properties": properties}),
    }
}

/// The users server: `get_user(user_id)` over a two-record store.
pub fn users_backend() -> MockBackend {
    MockBackend::new(
        vec![schema(
            "get_user",
            "Read a user by id",
            json!({"user_id": {"type": "string"}}),
        )],
        |name, args| {
            if name != "get_user" {
                return Err(McpError::ToolNotFound(name.to_string()));
            }
            let id = args.get("user_id").and_then(|v| v.as_str()).unwrap_or("");
            match id {
                "1" => Ok(CallOutcome::text(
                    json!({"id": "1", "name": "Ada", "email": "ada@example.com", "age": 36}).to_string(),
                )),
                "2" => Ok(CallOutcome::text(
                    json!({"id": "2", "name": "Linus", "email": "linus@example.com", "age": 54}).to_string(),
                )),
                other => Ok(CallOutcome::error(format!("user {other} not found"))),
            }
        },
    )
}

/// The calculator server: `add_numbers(a, b)`.
pub fn calc_backend() -> MockBackend {
    MockBackend::new(
        vec![schema(
            "add_numbers",
            "Add two numbers",
            json!({"a": {"type": "number"}, "b": {"type": "number"}}),
        )],
        |name, args| {
            if name != "add_numbers" {
                return Err(McpError::ToolNotFound(name.to_string()));
            }
            let a = args.get("a").and_then(|v| v.as_f64());
            let b = args.get("b").and_then(|v| v.as_f64());
            match (a, b) {
                (Some(a), Some(b)) => Ok(CallOutcome::text(format!("{}", a + b))),
                _ => Ok(CallOutcome::error("a and b must be numbers")),
            }
        },
    )
}

pub fn dispatcher(
    provider: Arc<ScriptedProvider>,
    backends: &[(&str, Arc<MockBackend>)],
    policy: FallbackPolicy,
) -> Dispatcher {
    let descriptors = backends
        .iter()
        .enumerate()
        .map(|(priority, (name, backend))| {
            let client: Arc<dyn McpClient> = backend.clone();
            BackendDescriptor::new(*name, priority as i32, client)
        })
        .collect();
    let planner = Planner::new(provider, "mock-model", "test system prompt");
    Dispatcher::new(planner, BackendSet::new(descriptors).unwrap()).with_policy(policy)
}
