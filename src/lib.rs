//! # mcp-host — natural language to one MCP tool call
//!
//! `mcp_host` turns a free-form request into exactly one invocation of a
//! tool exposed by one of several MCP backends:
//!
//! - **Planning**: the user query and the tool catalogs of every backend go
//!   to an OpenAI-compatible completion service, which answers with
//!   `{"tool": ..., "inputs": {...}}`.
//! - **Validation**: markdown fences are stripped and the plan is decoded;
//!   a plan without a tool name is rejected before any backend is contacted.
//! - **Routing**: backends are tried in priority order. Unreachable backends
//!   and unknown tools fall through to the next one; an error reported by
//!   the tool itself is final (see [`FallbackPolicy`]).
//! - **Cancellation**: every query runs under a [`QueryContext`] whose token
//!   and deadline abort the in-flight request.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use mcp_host::{HostArgs, McpHost, QueryContext};
//! use clap::Parser;
//! use tokio_util::sync::CancellationToken;
//!
//! #[derive(Parser)]
//! struct Cli {
//!     #[command(flatten)]
//!     host: HostArgs,
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Cli::parse().host.into_config().unwrap();
//!     let shutdown = CancellationToken::new();
//!     let host = McpHost::connect(&config, &shutdown).await.unwrap();
//!     let ctx = QueryContext::child_of(&shutdown);
//!     let answer = host.dispatcher().run("Add two numbers 5 and 10", &ctx).await;
//!     println!("{:?}", answer);
//! }
//! ```

pub mod config;
pub mod console;
pub mod core;
pub mod error;
pub mod host;
pub mod llm;
pub mod mcp;
pub mod planner;

pub use crate::config::{parse_backends, BackendEndpoint, HostArgs, HostConfig};
pub use crate::core::{Dispatcher, FallbackPolicy, QueryContext};
pub use crate::error::{
    BackendFailure, CancelReason, ErrorKind, OrchestrationError, OrchestrationResult,
    StartupError, StartupResult,
};
pub use crate::host::McpHost;
pub use crate::llm::{LlmError, LlmProvider, OpenAiConfig, OpenAiProvider};
pub use crate::mcp::{
    BackendCatalog, BackendDescriptor, BackendSet, CallOutcome, ContentItem, McpClient, McpError,
    OperationSchema,
};
pub use crate::planner::{normalize, ExecutionPlan, Planner, PromptTemplate};
