//! Plan-to-execution orchestration.
//!
//! One [`Dispatcher::run`] goes through
//! `Planning -> Validating -> Routing{backend[0]..backend[n-1]}` and ends in
//! exactly one of: a result, an LLM failure, an invalid plan, an application
//! error, exhausted backends, a malformed result or a cancellation.
//! Backends are tried strictly one after another in priority order.

use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::{BackendFailure, CancelReason, OrchestrationError, OrchestrationResult};
use crate::mcp::registry::BackendSet;
use crate::planner::{normalize, ExecutionPlan, Planner};

use super::query_context::QueryContext;

/// When to move on to the next backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Only unreachable backends and unknown operations fall through.
    /// An error reported by a tool is final.
    #[default]
    TransportOnly,
    /// Tool-reported errors fall through as well.
    AnyFailure,
}

impl FromStr for FallbackPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "transport" | "transport_only" => Ok(FallbackPolicy::TransportOnly),
            "any" | "any_failure" => Ok(FallbackPolicy::AnyFailure),
            other => Err(format!(
                "unknown fallback policy '{other}' (expected 'transport' or 'any')"
            )),
        }
    }
}

impl fmt::Display for FallbackPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackPolicy::TransportOnly => f.write_str("transport"),
            FallbackPolicy::AnyFailure => f.write_str("any"),
        }
    }
}

pub struct Dispatcher {
    planner: Planner,
    backends: BackendSet,
    policy: FallbackPolicy,
}

impl Dispatcher {
    pub fn new(planner: Planner, backends: BackendSet) -> Self {
        Self {
            planner,
            backends,
            policy: FallbackPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FallbackPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn backends(&self) -> &BackendSet {
        &self.backends
    }

    pub fn planner(&self) -> &Planner {
        &self.planner
    }

    pub async fn run(&self, query: &str, ctx: &QueryContext) -> OrchestrationResult<String> {
        let started = Instant::now();
        let result = self.run_inner(query, ctx).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(text) => tracing::info!(elapsed_ms, result_len = text.len(), "query succeeded"),
            Err(e) => tracing::warn!(elapsed_ms, kind = e.kind().as_str(), error = %e, "query failed"),
        }
        result
    }

    async fn run_inner(&self, query: &str, ctx: &QueryContext) -> OrchestrationResult<String> {
        tracing::debug!(query_len = query.len(), "planning");
        let raw = ctx
            .guard(self.planner.plan(query))
            .await
            .map_err(cancelled)??;

        tracing::debug!(raw_len = raw.len(), "validating plan");
        let plan = ExecutionPlan::parse(&normalize(&raw))?;

        self.execute(&plan, ctx).await
    }

    /// Routes an already validated plan across the backends.
    pub async fn execute(
        &self,
        plan: &ExecutionPlan,
        ctx: &QueryContext,
    ) -> OrchestrationResult<String> {
        let operation = plan.operation.as_str();
        let mut failures = Vec::new();

        for (index, backend) in self.backends.iter().enumerate() {
            let attempt = index + 1;
            let backend_id = backend.identifier.as_str();
            tracing::debug!(backend = backend_id, operation, attempt, "invoking tool");

            let outcome = ctx
                .guard(backend.client.call_tool(operation, &plan.arguments))
                .await
                .map_err(cancelled)?;

            let outcome = match outcome {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::info!(
                        backend = backend_id,
                        operation,
                        attempt,
                        error = %e,
                        "tool not reachable here, trying next backend"
                    );
                    failures.push(BackendFailure {
                        backend: backend_id.to_string(),
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            if outcome.is_error {
                let message = outcome.error_text();
                if self.policy == FallbackPolicy::AnyFailure {
                    tracing::info!(
                        backend = backend_id,
                        operation,
                        attempt,
                        error = %message,
                        "tool reported an error, trying next backend"
                    );
                    failures.push(BackendFailure {
                        backend: backend_id.to_string(),
                        reason: message,
                    });
                    continue;
                }
                return Err(OrchestrationError::Application {
                    backend: backend_id.to_string(),
                    operation: operation.to_string(),
                    message,
                });
            }

            tracing::debug!(backend = backend_id, operation, attempt, "tool succeeded");
            return outcome
                .first_text()
                .map(str::to_string)
                .ok_or_else(|| OrchestrationError::MalformedResult {
                    backend: backend_id.to_string(),
                    operation: operation.to_string(),
                });
        }

        Err(OrchestrationError::AllBackendsExhausted {
            operation: operation.to_string(),
            failures,
        })
    }
}

fn cancelled(reason: CancelReason) -> OrchestrationError {
    OrchestrationError::Cancelled { reason }
}
