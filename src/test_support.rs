//! Test support utilities shared across unit and integration tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::EngineError;
use crate::transport::{
    FetchOutcome, Method, OperationHandle, OperationStatus, StatusSnapshot, SubmitOutcome,
    Transport, TransportFuture, VersionToken,
};

/// Scripted transport double that returns pre-seeded responses in FIFO
/// order and records every call made through it.
///
/// Used to drive deterministic engine outcomes without any real network
/// I/O. An exhausted script surfaces as [`EngineError::Transport`] so a
/// test that issues more calls than it seeded fails loudly.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    submits: Mutex<VecDeque<Result<SubmitOutcome, EngineError>>>,
    polls: Mutex<VecDeque<Result<StatusSnapshot, EngineError>>>,
    fetches: Mutex<VecDeque<Result<FetchOutcome, EngineError>>>,
    invocations: Mutex<Vec<Invocation>>,
}

/// Records a single call made through [`ScriptedTransport`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Invocation {
    /// A mutating call.
    Submit {
        /// Method as passed to the transport.
        method: Method,
        /// Request path.
        path: String,
        /// Request body.
        body: Vec<u8>,
        /// Version token attached to the write, when any.
        precondition: Option<String>,
    },
    /// A status request for an operation handle.
    Poll {
        /// Handle being polled.
        handle: String,
    },
    /// A representation fetch.
    Fetch {
        /// Request path.
        path: String,
    },
}

impl ScriptedTransport {
    /// Creates a transport with no queued responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the next submit response.
    pub fn push_submit(&self, response: Result<SubmitOutcome, EngineError>) {
        lock(&self.submits).push_back(response);
    }

    /// Queues the next poll response.
    pub fn push_poll(&self, response: Result<StatusSnapshot, EngineError>) {
        lock(&self.polls).push_back(response);
    }

    /// Queues the next fetch response.
    pub fn push_fetch(&self, response: Result<FetchOutcome, EngineError>) {
        lock(&self.fetches).push_back(response);
    }

    /// Returns a snapshot of all calls recorded so far.
    #[must_use]
    pub fn invocations(&self) -> Vec<Invocation> {
        lock(&self.invocations).clone()
    }

    /// Returns how many status requests have been issued.
    #[must_use]
    pub fn poll_count(&self) -> usize {
        lock(&self.invocations)
            .iter()
            .filter(|call| matches!(call, Invocation::Poll { .. }))
            .count()
    }

    /// Returns the bodies of all mutating calls, in order.
    #[must_use]
    pub fn submitted_bodies(&self) -> Vec<Vec<u8>> {
        lock(&self.invocations)
            .iter()
            .filter_map(|call| match call {
                Invocation::Submit { body, .. } => Some(body.clone()),
                Invocation::Poll { .. } | Invocation::Fetch { .. } => None,
            })
            .collect()
    }

    /// Returns the precondition tokens of all mutating calls, in order.
    #[must_use]
    pub fn submitted_preconditions(&self) -> Vec<Option<String>> {
        lock(&self.invocations)
            .iter()
            .filter_map(|call| match call {
                Invocation::Submit { precondition, .. } => Some(precondition.clone()),
                Invocation::Poll { .. } | Invocation::Fetch { .. } => None,
            })
            .collect()
    }
}

impl Transport for ScriptedTransport {
    fn submit<'a>(
        &'a self,
        method: Method,
        path: &'a str,
        body: &'a [u8],
        precondition: Option<&'a VersionToken>,
    ) -> TransportFuture<'a, SubmitOutcome> {
        lock(&self.invocations).push(Invocation::Submit {
            method,
            path: path.to_owned(),
            body: body.to_vec(),
            precondition: precondition.map(|token| token.as_str().to_owned()),
        });
        let response = next(&self.submits, "submit");
        Box::pin(async move { response })
    }

    fn poll<'a>(&'a self, handle: &'a OperationHandle) -> TransportFuture<'a, StatusSnapshot> {
        lock(&self.invocations).push(Invocation::Poll {
            handle: handle.as_str().to_owned(),
        });
        let response = next(&self.polls, "poll");
        Box::pin(async move { response })
    }

    fn fetch<'a>(&'a self, path: &'a str) -> TransportFuture<'a, FetchOutcome> {
        lock(&self.invocations).push(Invocation::Fetch {
            path: path.to_owned(),
        });
        let response = next(&self.fetches, "fetch");
        Box::pin(async move { response })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

fn next<T>(queue: &Mutex<VecDeque<Result<T, EngineError>>>, kind: &str) -> Result<T, EngineError> {
    lock(queue).pop_front().unwrap_or_else(|| {
        Err(EngineError::transport(format!(
            "scripted transport has no queued {kind} response"
        )))
    })
}

/// Builds a status snapshot with no provider error text.
#[must_use]
pub fn snapshot(status: OperationStatus, http_status: u16) -> StatusSnapshot {
    StatusSnapshot {
        status,
        http_status,
        error_code: None,
        error_message: None,
    }
}

/// Builds a failed status snapshot carrying provider error text.
#[must_use]
pub fn failed_snapshot(code: &str, message: &str) -> StatusSnapshot {
    StatusSnapshot {
        status: OperationStatus::Failed,
        http_status: 200,
        error_code: Some(code.to_owned()),
        error_message: Some(message.to_owned()),
    }
}

/// Builds a synchronous submit outcome with the given status and body.
#[must_use]
pub fn sync_submit(http_status: u16, body: &[u8]) -> SubmitOutcome {
    SubmitOutcome {
        http_status,
        operation: None,
        version: None,
        body: body.to_vec(),
    }
}

/// Builds an asynchronous submit outcome carrying an operation handle.
#[must_use]
pub fn async_submit(http_status: u16, handle: &str) -> SubmitOutcome {
    SubmitOutcome {
        http_status,
        operation: Some(OperationHandle(handle.to_owned())),
        version: None,
        body: Vec::new(),
    }
}

/// Builds a synchronous submit outcome that issues a fresh version token.
#[must_use]
pub fn versioned_submit(http_status: u16, token: &str) -> SubmitOutcome {
    SubmitOutcome {
        http_status,
        operation: None,
        version: Some(VersionToken(token.to_owned())),
        body: Vec::new(),
    }
}

/// Builds a found fetch outcome with the given body and optional token.
#[must_use]
pub fn found(body: &[u8], version: Option<&str>) -> FetchOutcome {
    FetchOutcome::Found {
        body: body.to_vec(),
        version: version.map(|token| VersionToken(token.to_owned())),
    }
}
