//! Transport collaborator consumed by the engine.
//!
//! The engine never opens connections itself: all wire traffic goes through
//! an implementation of [`Transport`] supplied by the embedding application.
//! Connection handling, TLS, and authentication headers live behind that
//! seam, as does the mapping from raw HTTP responses into the DTOs below.

use std::future::Future;
use std::pin::Pin;

use crate::error::EngineError;

/// HTTP method of a mutating call.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Method {
    /// Retrieve a representation.
    Get,
    /// Create a subordinate resource.
    Post,
    /// Replace a representation in full.
    Put,
    /// Remove a resource.
    Delete,
}

/// Server-issued reference to a not-yet-complete mutating request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OperationHandle(pub String);

impl OperationHandle {
    /// Returns the raw handle string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Opaque version token returned by writes to versioned resources.
///
/// A token is only meaningful within the fetch-mutate-write transaction that
/// produced it; reusing one across logically separate call chains is not
/// supported.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VersionToken(pub String);

impl VersionToken {
    /// Returns the raw token string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Terminal and non-terminal states reported for an asynchronous operation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OperationStatus {
    /// Accepted but not yet started.
    Pending,
    /// Started and still running.
    InProgress,
    /// Completed successfully.
    Succeeded,
    /// Reached a terminal failure state.
    Failed,
}

impl OperationStatus {
    /// Returns `true` for `Succeeded` and `Failed`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// Response to a mutating call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubmitOutcome {
    /// HTTP status code of the submission response.
    pub http_status: u16,
    /// Handle to poll when the call is answered asynchronously. `None`
    /// means the response itself is terminal.
    pub operation: Option<OperationHandle>,
    /// Version token issued by writes to versioned resources.
    pub version: Option<VersionToken>,
    /// Raw response body, owned by the translator collaborator.
    pub body: Vec<u8>,
}

impl SubmitOutcome {
    /// Returns `true` when the status code is in the 2xx range.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.http_status >= 200 && self.http_status < 300
    }
}

/// Status payload returned when polling an operation handle.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StatusSnapshot {
    /// Current state of the operation.
    pub status: OperationStatus,
    /// HTTP status code of the poll response.
    pub http_status: u16,
    /// Provider error code, present once the operation has failed.
    pub error_code: Option<String>,
    /// Provider error message, present once the operation has failed.
    pub error_message: Option<String>,
}

/// Result of fetching a resource representation.
///
/// A 404 from the control plane maps to [`FetchOutcome::Absent`], never to
/// an error, so idempotent existence checks need no error handling.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FetchOutcome {
    /// The resource exists.
    Found {
        /// Raw representation bytes.
        body: Vec<u8>,
        /// Version token, present for versioned resources.
        version: Option<VersionToken>,
    },
    /// The resource does not exist.
    Absent,
}

/// Future returned by transport operations.
pub type TransportFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, EngineError>> + Send + 'a>>;

/// Minimal wire interface implemented by the embedding application.
///
/// Implementations report connectivity and protocol failures as
/// [`EngineError::Transport`]; the engine never retries those.
pub trait Transport: Send + Sync {
    /// Issues a mutating call and returns the raw submission outcome.
    ///
    /// `precondition` carries the version token for writes to versioned
    /// resources (an If-Match style header on the wire); the control plane
    /// answers a stale token with a conflict status.
    fn submit<'a>(
        &'a self,
        method: Method,
        path: &'a str,
        body: &'a [u8],
        precondition: Option<&'a VersionToken>,
    ) -> TransportFuture<'a, SubmitOutcome>;

    /// Requests the current status of an asynchronous operation.
    fn poll<'a>(&'a self, handle: &'a OperationHandle) -> TransportFuture<'a, StatusSnapshot>;

    /// Retrieves a resource representation.
    fn fetch<'a>(&'a self, path: &'a str) -> TransportFuture<'a, FetchOutcome>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn submit<'a>(
        &'a self,
        method: Method,
        path: &'a str,
        body: &'a [u8],
        precondition: Option<&'a VersionToken>,
    ) -> TransportFuture<'a, SubmitOutcome> {
        (**self).submit(method, path, body, precondition)
    }

    fn poll<'a>(&'a self, handle: &'a OperationHandle) -> TransportFuture<'a, StatusSnapshot> {
        (**self).poll(handle)
    }

    fn fetch<'a>(&'a self, path: &'a str) -> TransportFuture<'a, FetchOutcome> {
        (**self).fetch(path)
    }
}
