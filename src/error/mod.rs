//! Error types for the host.
//!
//! - [`OrchestrationError`] — Failures of a single `run(query)` call.
//! - [`StartupError`] — Fatal conditions while wiring the host together.
//! - [`ErrorKind`] — Stable classification label for logs and front ends.

pub mod orchestration_error;
pub mod startup_error;

pub use orchestration_error::{BackendFailure, CancelReason, ErrorKind, OrchestrationError};
pub use startup_error::StartupError;

/// Convenience alias for dispatcher results.
pub type OrchestrationResult<T> = Result<T, OrchestrationError>;
/// Convenience alias for startup results.
pub type StartupResult<T> = Result<T, StartupError>;
