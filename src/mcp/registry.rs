use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::client::McpClient;
use super::error::McpError;

/// A configured backend and the adapter that reaches it.
#[derive(Clone)]
pub struct BackendDescriptor {
    pub identifier: String,
    /// Lower values are tried first.
    pub priority: i32,
    pub client: Arc<dyn McpClient>,
}

impl BackendDescriptor {
    pub fn new(identifier: impl Into<String>, priority: i32, client: Arc<dyn McpClient>) -> Self {
        Self {
            identifier: identifier.into(),
            priority,
            client,
        }
    }
}

impl std::fmt::Debug for BackendDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendDescriptor")
            .field("identifier", &self.identifier)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// Backends in ascending priority order, fixed once built.
///
/// Equal priorities keep their configuration order.
#[derive(Debug, Clone, Default)]
pub struct BackendSet {
    backends: Vec<BackendDescriptor>,
}

impl BackendSet {
    pub fn new(mut backends: Vec<BackendDescriptor>) -> Result<Self, McpError> {
        let mut seen = HashSet::new();
        for backend in &backends {
            if !seen.insert(backend.identifier.as_str()) {
                return Err(McpError::InvalidConfig(format!(
                    "duplicate backend identifier '{}'",
                    backend.identifier
                )));
            }
        }
        backends.sort_by_key(|b| b.priority);
        Ok(Self { backends })
    }

    pub fn iter(&self) -> impl Iterator<Item = &BackendDescriptor> {
        self.backends.iter()
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    pub async fn close_all(&self) {
        for backend in &self.backends {
            if let Err(e) = backend.client.close().await {
                tracing::warn!(backend = %backend.identifier, error = %e, "failed to close backend");
            }
        }
    }
}

/// Runs `connect` until it succeeds, up to `attempts` times, sleeping
/// `delay` between tries. Cancelling `cancel` aborts the wait.
pub async fn connect_with_retry<C, F, Fut>(
    backend: &str,
    attempts: u32,
    delay: Duration,
    cancel: &CancellationToken,
    mut connect: F,
) -> Result<C, McpError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<C, McpError>>,
{
    let attempts = attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=attempts {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(McpError::ConnectionError(format!("connect to '{backend}' cancelled")));
            }
            result = connect() => result,
        };

        match result {
            Ok(client) => {
                tracing::info!(backend, attempt, "connected to backend");
                return Ok(client);
            }
            Err(e) => {
                tracing::warn!(backend, attempt, attempts, error = %e, "backend connect failed");
                last_error = Some(e);
            }
        }

        if attempt < attempts {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(McpError::ConnectionError(format!("connect to '{backend}' cancelled")));
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        McpError::ConnectionError(format!("no connection attempts made to '{backend}'"))
    }))
}
