//! Submission and polling of long-running asynchronous operations.
//!
//! Mutating calls against the control plane either answer synchronously or
//! hand back an operation handle that must be polled until it reaches a
//! terminal state. [`Poller::submit`] folds both shapes into one awaitable
//! call with a caller-supplied [`PollPolicy`]; there are no implicit
//! defaults because different operation kinds (VLAN propagation versus image
//! capture) have order-of-magnitude different expected durations.

use std::time::{Duration, Instant};

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::error::EngineError;
use crate::transport::{
    Method, OperationHandle, OperationStatus, StatusSnapshot, SubmitOutcome, Transport,
    VersionToken,
};

/// Caller-supplied tolerance for one asynchronous operation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PollPolicy {
    /// Fixed delay between status requests. Deliberately not exponential so
    /// behaviour stays predictable and testable.
    pub interval: Duration,
    /// Maximum total time to wait for a terminal state.
    pub max_wait: Duration,
}

impl PollPolicy {
    /// Creates a policy from an interval and a maximum wait.
    #[must_use]
    pub const fn new(interval: Duration, max_wait: Duration) -> Self {
        Self { interval, max_wait }
    }
}

/// Record of one asynchronous operation, created when a submission returns a
/// handle and mutated only by poll responses. Once terminal it is returned
/// by value to the caller and never shared.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AsyncOperation {
    /// Provider identifier of the operation.
    pub operation_id: String,
    /// Interval used between polls.
    pub poll_interval: Duration,
    /// Absolute time after which polling gives up.
    pub deadline: Instant,
    /// Last observed state.
    pub status: OperationStatus,
    /// HTTP status code of the most recent response.
    pub http_status: u16,
    /// Provider error code, present once the operation has failed.
    pub error_code: Option<String>,
    /// Provider error message, present once the operation has failed.
    pub error_message: Option<String>,
}

impl AsyncOperation {
    fn from_handle(handle: &OperationHandle, policy: PollPolicy, http_status: u16) -> Self {
        Self {
            operation_id: handle.as_str().to_owned(),
            poll_interval: policy.interval,
            deadline: Instant::now() + policy.max_wait,
            status: OperationStatus::Pending,
            http_status,
            error_code: None,
            error_message: None,
        }
    }

    fn record(&mut self, snapshot: &StatusSnapshot) {
        self.status = snapshot.status;
        self.http_status = snapshot.http_status;
        self.error_code = snapshot.error_code.clone();
        self.error_message = snapshot.error_message.clone();
    }
}

/// Result of a mutating call once it has reached a terminal state.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OperationOutcome {
    /// HTTP status code of the submission response.
    pub http_status: u16,
    /// Raw body of the submission response.
    pub body: Vec<u8>,
    /// Version token issued by writes to versioned resources.
    pub version: Option<VersionToken>,
    /// Completed operation record when the call was answered
    /// asynchronously; `None` when the submission itself was terminal.
    pub operation: Option<AsyncOperation>,
}

/// Converts fire-then-poll mutating calls into bounded awaitable calls.
///
/// The poller holds no state across calls; its only side effects are the
/// transport calls it issues.
#[derive(Clone, Debug)]
pub struct Poller<T> {
    transport: T,
}

impl<T: Transport> Poller<T> {
    /// Creates a poller over the given transport.
    #[must_use]
    pub const fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Issues a mutating call and waits for a terminal state.
    ///
    /// A submission response without an operation handle is terminal on its
    /// own: success returns immediately and a failure status surfaces as
    /// [`EngineError::OperationFailed`] without any polling. Otherwise the
    /// poller sleeps `policy.interval` between status requests until the
    /// operation succeeds, fails, the deadline passes, or `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::OperationFailed`] on a terminal failure,
    /// [`EngineError::Timeout`] once `policy.max_wait` elapses,
    /// [`EngineError::Cancelled`] when `cancel` fires first, and
    /// [`EngineError::Transport`] when the transport collaborator fails.
    pub async fn submit(
        &self,
        method: Method,
        path: &str,
        body: &[u8],
        policy: PollPolicy,
        cancel: &CancellationToken,
    ) -> Result<OperationOutcome, EngineError> {
        let submitted = self.transport.submit(method, path, body, None).await?;
        self.complete(path, submitted, policy, cancel).await
    }

    /// Completes an already-issued submission, polling when it carried an
    /// operation handle.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Poller::submit`].
    pub async fn complete(
        &self,
        path: &str,
        submitted: SubmitOutcome,
        policy: PollPolicy,
        cancel: &CancellationToken,
    ) -> Result<OperationOutcome, EngineError> {
        match submitted.operation.clone() {
            None => immediate_outcome(path, submitted),
            Some(handle) => {
                let operation = AsyncOperation::from_handle(&handle, policy, submitted.http_status);
                let completed = self.wait(operation, &handle, cancel).await?;
                Ok(OperationOutcome {
                    http_status: submitted.http_status,
                    body: submitted.body,
                    version: submitted.version,
                    operation: Some(completed),
                })
            }
        }
    }

    /// Polls an already-submitted operation until it is terminal.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Poller::submit`], minus the immediate path.
    pub async fn wait(
        &self,
        mut operation: AsyncOperation,
        handle: &OperationHandle,
        cancel: &CancellationToken,
    ) -> Result<AsyncOperation, EngineError> {
        let started = Instant::now();
        while Instant::now() <= operation.deadline {
            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled {
                    operation_id: operation.operation_id,
                });
            }
            let snapshot = self.transport.poll(handle).await?;
            operation.record(&snapshot);
            match snapshot.status {
                OperationStatus::Succeeded => return Ok(operation),
                OperationStatus::Failed => return Err(failed(&operation, &snapshot)),
                OperationStatus::Pending | OperationStatus::InProgress => {
                    tracing::debug!(
                        operation_id = %operation.operation_id,
                        status = ?snapshot.status,
                        "operation still running"
                    );
                }
            }
            tokio::select! {
                () = cancel.cancelled() => {
                    return Err(EngineError::Cancelled {
                        operation_id: operation.operation_id,
                    });
                }
                () = sleep(operation.poll_interval) => {}
            }
        }
        Err(EngineError::Timeout {
            operation_id: operation.operation_id,
            waited: started.elapsed(),
        })
    }
}

fn immediate_outcome(path: &str, submitted: SubmitOutcome) -> Result<OperationOutcome, EngineError> {
    if submitted.is_success() {
        return Ok(OperationOutcome {
            http_status: submitted.http_status,
            body: submitted.body,
            version: submitted.version,
            operation: None,
        });
    }
    Err(EngineError::OperationFailed {
        operation_id: path.to_owned(),
        code: format!("http-{}", submitted.http_status),
        message: String::from_utf8_lossy(&submitted.body).into_owned(),
    })
}

fn failed(operation: &AsyncOperation, snapshot: &StatusSnapshot) -> EngineError {
    EngineError::OperationFailed {
        operation_id: operation.operation_id.clone(),
        code: snapshot
            .error_code
            .clone()
            .unwrap_or_else(|| format!("http-{}", snapshot.http_status)),
        message: snapshot.error_message.clone().unwrap_or_default(),
    }
}
