//! Shared error taxonomy for the adapter engine.

use std::time::Duration;

use thiserror::Error;

/// Errors raised by the engine components.
///
/// Provider-supplied codes and messages are carried verbatim so upstream
/// diagnostics stay accurate. Resource absence is never an error: read paths
/// surface it as a typed result instead (see
/// [`FetchOutcome`](crate::transport::FetchOutcome) and
/// [`MutateOutcome`](crate::document::MutateOutcome)).
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum EngineError {
    /// Raised when input is malformed before any network call is made.
    #[error("validation error: {0}")]
    Validation(String),
    /// Raised when a version mismatch or a provider-reported collision
    /// survives the caller's retry bound.
    #[error("conflict on {resource_path} after {attempts} attempt(s)")]
    Conflict {
        /// Path of the resource whose write conflicted.
        resource_path: String,
        /// Number of write attempts made before giving up.
        attempts: u32,
    },
    /// Raised when a remote operation reaches a terminal failure state.
    #[error("operation {operation_id} failed: {code}: {message}")]
    OperationFailed {
        /// Provider identifier of the failed operation.
        operation_id: String,
        /// Provider error code, unmodified.
        code: String,
        /// Provider error message, unmodified.
        message: String,
    },
    /// Raised when polling exceeds the caller-supplied deadline. Distinct
    /// from [`EngineError::OperationFailed`]: the remote side may still
    /// complete later.
    #[error("operation {operation_id} still pending after {waited:?}")]
    Timeout {
        /// Provider identifier of the operation being waited on.
        operation_id: String,
        /// Time spent waiting before giving up.
        waited: Duration,
    },
    /// Raised when the caller cancels a wait before its deadline.
    #[error("wait for operation {operation_id} cancelled")]
    Cancelled {
        /// Provider identifier of the operation being waited on.
        operation_id: String,
    },
    /// Wrapper for connectivity or protocol failures from the transport
    /// collaborator. Never retried by this engine.
    #[error("transport error: {message}")]
    Transport {
        /// Message reported by the transport layer.
        message: String,
    },
}

impl EngineError {
    /// Builds a transport error from any displayable cause.
    #[must_use]
    pub fn transport(cause: impl std::fmt::Display) -> Self {
        Self::Transport {
            message: cause.to_string(),
        }
    }
}
