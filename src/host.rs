//! Startup wiring: backends, catalogs, system prompt, planner, dispatcher.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::HostConfig;
use crate::core::{Dispatcher, FallbackPolicy};
use crate::error::{StartupError, StartupResult};
use crate::llm::{LlmProvider, OpenAiProvider};
use crate::mcp::client::{McpClient, RmcpClient};
use crate::mcp::registry::{connect_with_retry, BackendDescriptor, BackendSet};
use crate::mcp::tools::{discover_tools, BackendCatalog};
use crate::planner::{Planner, PromptTemplate};

/// A ready-to-serve host. Immutable once built; share it behind an `Arc`.
pub struct McpHost {
    dispatcher: Arc<Dispatcher>,
    catalogs: Vec<BackendCatalog>,
}

impl McpHost {
    /// Connects every configured backend, lists its tools and renders the
    /// system prompt. Any failure here is fatal.
    pub async fn connect(config: &HostConfig, shutdown: &CancellationToken) -> StartupResult<Self> {
        tracing::info!(
            backends = config.backends.len(),
            model = %config.llm.default_model,
            llm_url = %config.llm.base_url,
            api_key_configured = !config.llm.api_key.is_empty(),
            fallback = %config.fallback,
            "starting mcp-host"
        );

        let mut adapters: Vec<(String, Arc<dyn McpClient>)> = Vec::new();
        for endpoint in &config.backends {
            let client = connect_with_retry(
                &endpoint.name,
                config.connect_attempts,
                config.connect_delay,
                shutdown,
                || RmcpClient::connect_http(&endpoint.url),
            )
            .await
            .map_err(|source| {
                if shutdown.is_cancelled() {
                    StartupError::Cancelled
                } else {
                    StartupError::Connect {
                        backend: endpoint.name.clone(),
                        source,
                    }
                }
            })?;

            let server = client
                .server_label()
                .unwrap_or_else(|| "unknown".to_string());
            tracing::info!(
                backend = %endpoint.name,
                url = %endpoint.url,
                server = %server,
                "backend initialized"
            );
            let client: Arc<dyn McpClient> = Arc::new(client);
            adapters.push((endpoint.name.clone(), client));
        }

        let provider: Arc<dyn LlmProvider> = Arc::new(OpenAiProvider::new(config.llm.clone())?);
        let template = PromptTemplate::default().with_limit(config.prompt_limit);

        Self::assemble(
            adapters,
            provider,
            config.llm.default_model.clone(),
            &template,
            config.fallback,
        )
        .await
    }

    /// Builds a host from already connected adapters, listed in priority
    /// order.
    pub async fn assemble(
        adapters: Vec<(String, Arc<dyn McpClient>)>,
        provider: Arc<dyn LlmProvider>,
        model: impl Into<String>,
        template: &PromptTemplate,
        policy: FallbackPolicy,
    ) -> StartupResult<Self> {
        let mut catalogs = Vec::with_capacity(adapters.len());
        let mut descriptors = Vec::with_capacity(adapters.len());

        for (priority, (name, client)) in adapters.into_iter().enumerate() {
            let catalog = discover_tools(&name, client.as_ref())
                .await
                .map_err(|source| StartupError::Catalog {
                    backend: name.clone(),
                    source,
                })?;
            tracing::info!(
                backend = %name,
                tools = ?catalog.tools.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
                "backend catalog loaded"
            );
            catalogs.push(catalog);
            descriptors.push(BackendDescriptor::new(name, priority as i32, client));
        }

        let backends = BackendSet::new(descriptors)
            .map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
        if backends.is_empty() {
            tracing::warn!("no backends configured, every query will exhaust");
        }
        let system_prompt = template.render(&catalogs)?;
        tracing::debug!(prompt_bytes = system_prompt.len(), "system prompt rendered");

        let info = provider.info();
        tracing::info!(
            provider = %info.id,
            endpoint = %info.name,
            default_model = %info.default_model,
            backends = backends.len(),
            fallback = %policy,
            "dispatcher ready"
        );

        let planner = Planner::new(provider, model, system_prompt);
        let dispatcher = Dispatcher::new(planner, backends).with_policy(policy);

        Ok(Self {
            dispatcher: Arc::new(dispatcher),
            catalogs,
        })
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    pub fn catalogs(&self) -> &[BackendCatalog] {
        &self.catalogs
    }

    pub fn system_prompt(&self) -> &str {
        self.dispatcher.planner().system_prompt()
    }

    pub async fn shutdown(&self) {
        self.dispatcher.backends().close_all().await;
        tracing::info!("backends closed");
    }
}
