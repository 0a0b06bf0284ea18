//! Per-query error taxonomy.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::llm::error::LlmError;

/// Why an in-flight query stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// The caller's cancellation token fired.
    Requested,
    /// The query deadline elapsed.
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Requested => f.write_str("cancelled by caller"),
            CancelReason::DeadlineExceeded => f.write_str("deadline exceeded"),
        }
    }
}

/// A backend attempt that did not produce an authoritative answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendFailure {
    pub backend: String,
    pub reason: String,
}

impl fmt::Display for BackendFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.backend, self.reason)
    }
}

/// Error classification label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    LlmCall,
    InvalidPlan,
    Application,
    AllBackendsExhausted,
    MalformedResult,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::LlmCall => "llm_call",
            ErrorKind::InvalidPlan => "invalid_plan",
            ErrorKind::Application => "application",
            ErrorKind::AllBackendsExhausted => "all_backends_exhausted",
            ErrorKind::MalformedResult => "malformed_result",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}

/// Failure of one `run(query)` call.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    #[error("LLM call failed: {0}")]
    LlmCall(#[from] LlmError),
    #[error("Invalid plan ({reason}): {payload}")]
    InvalidPlan { reason: String, payload: String },
    #[error("Tool call error from '{backend}' for '{operation}': {message}")]
    Application {
        backend: String,
        operation: String,
        message: String,
    },
    #[error("Tool call '{operation}' failed on all backends: {}", join_failures(.failures))]
    AllBackendsExhausted {
        operation: String,
        failures: Vec<BackendFailure>,
    },
    #[error("Tool call '{operation}' on '{backend}' did not return text content")]
    MalformedResult { backend: String, operation: String },
    #[error("Query cancelled: {reason}")]
    Cancelled { reason: CancelReason },
}

impl OrchestrationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrchestrationError::LlmCall(_) => ErrorKind::LlmCall,
            OrchestrationError::InvalidPlan { .. } => ErrorKind::InvalidPlan,
            OrchestrationError::Application { .. } => ErrorKind::Application,
            OrchestrationError::AllBackendsExhausted { .. } => ErrorKind::AllBackendsExhausted,
            OrchestrationError::MalformedResult { .. } => ErrorKind::MalformedResult,
            OrchestrationError::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    pub(crate) fn invalid_plan(reason: impl Into<String>, payload: impl Into<String>) -> Self {
        OrchestrationError::InvalidPlan {
            reason: reason.into(),
            payload: payload.into(),
        }
    }
}

fn join_failures(failures: &[BackendFailure]) -> String {
    if failures.is_empty() {
        return "no backends configured".to_string();
    }
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
